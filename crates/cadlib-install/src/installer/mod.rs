//! The install sequence.
//!
//! Every step is guarded by a path-existence check, so an interrupted run
//! can be resumed by running the installer again. The only steps that always
//! run are the plugin `make`/`make install` and writing `setup.sh`.

use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::PathBuf;

use crate::archive::{ArchiveSet, Component};
use crate::config::{FailurePolicy, InstallConfig};
use crate::env_script::EnvironmentScript;
use crate::error::{InstallError, IoContext, Result};
use crate::layout::WorkspaceLayout;
use crate::sh::{Invocation, Runner, Status};


#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Bootstrap,
    Fetch(Component),
    AssembleSources,
    BuildLlvm,
    ConfigurePlugin,
    BuildPlugin,
    InstallPlugin,
    WriteEnvScript,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Ran,
    /// The step's output was already on disk.
    Skipped,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Bootstrap => f.write_str("bootstrap build tree"),
            Step::Fetch(component) => write!(f, "fetch {}", component.archive_name()),
            Step::AssembleSources => f.write_str("assemble LLVM sources"),
            Step::BuildLlvm => f.write_str("build LLVM"),
            Step::ConfigurePlugin => f.write_str("configure plugin"),
            Step::BuildPlugin => f.write_str("build plugin"),
            Step::InstallPlugin => f.write_str("install plugin"),
            Step::WriteEnvScript => f.write_str("write setup.sh"),
        }
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepOutcome::Ran => f.write_str("ran"),
            StepOutcome::Skipped => f.write_str("skipped"),
        }
    }
}

impl From<bool> for StepOutcome {
    fn from(ran: bool) -> Self {
        if ran {
            StepOutcome::Ran
        } else {
            StepOutcome::Skipped
        }
    }
}

/// What a completed run did.
#[derive(Clone, Debug, Default)]
pub struct Report {
    steps: Vec<(Step, StepOutcome)>,
    pub script: Option<PathBuf>,
}

impl Report {
    fn record(&mut self, step: Step, outcome: StepOutcome) {
        log::debug!("[step] {step}: {outcome}");
        self.steps.push((step, outcome));
    }

    pub fn steps(&self) -> &[(Step, StepOutcome)] {
        &self.steps
    }

    pub fn outcome(&self, step: Step) -> Option<StepOutcome> {
        self.steps
            .iter()
            .find(|(s, _)| *s == step)
            .map(|&(_, outcome)| outcome)
    }
}

pub struct Installer<R> {
    config: InstallConfig,
    layout: WorkspaceLayout,
    archives: ArchiveSet,
    runner: R,
}

impl<R: Runner> Installer<R> {
    pub fn new(config: InstallConfig, runner: R) -> Self {
        let layout = WorkspaceLayout::with_root(config.build_dir.clone());
        let archives = ArchiveSet::new(&config.llvm_mirror, &layout.sources);
        Self {
            config,
            layout,
            archives,
            runner,
        }
    }

    pub fn layout(&self) -> &WorkspaceLayout {
        &self.layout
    }

    pub fn config(&self) -> &InstallConfig {
        &self.config
    }

    /// Run the whole sequence, stopping at the first fatal error.
    pub fn run(&mut self) -> Result<Report> {
        let mut report = Report::default();

        println!();
        println!(".:: Current configuration ::.");
        println!(
            " - Installation directory = {}",
            self.config.prefix.display()
        );
        println!("-----------------------------");

        let created = self.layout.bootstrap()?;
        report.record(Step::Bootstrap, created.into());

        if self.config.compile_llvm {
            println!("\n.:: Configuring LLVM ... ::.");
            self.fetch_archives(&mut report)?;
            self.assemble_sources(&mut report)?;
            self.build_llvm(&mut report)?;
        }

        println!("\n.:: Configuring LLVM plugin ... ::.");
        self.configure_plugin(&mut report)?;
        self.build_plugin(&mut report)?;

        println!("\n.:: Creating configuration script ... ::.");
        let script = EnvironmentScript::new(&self.config.prefix).write()?;
        report.record(Step::WriteEnvScript, StepOutcome::Ran);
        report.script = Some(script);

        println!();
        println!("Installation completed with SUCCESS!");
        println!();
        Ok(report)
    }

    fn fetch_archives(&mut self, report: &mut Report) -> Result<()> {
        let pending: Vec<_> = self.archives.iter().cloned().collect();
        for archive in pending {
            let step = Step::Fetch(archive.component);
            if archive.dest.exists() {
                report.record(step, StepOutcome::Skipped);
                continue;
            }

            let wget = Invocation::new("wget")
                .arg(&archive.url)
                .arg("-O")
                .arg(&archive.dest);
            self.exec(&wget)?;
            report.record(step, StepOutcome::Ran);
        }
        Ok(())
    }

    /// Unpack every archive and move the subprojects into the LLVM tree.
    /// Skipped as a whole once the LLVM source directory exists.
    fn assemble_sources(&mut self, report: &mut Report) -> Result<()> {
        if self.layout.llvm_src.is_dir() {
            report.record(Step::AssembleSources, StepOutcome::Skipped);
            return Ok(());
        }

        let sources = self.layout.sources.clone();
        let order: Vec<_> = self.archives.extraction_order().cloned().collect();
        for archive in order {
            let tar = Invocation::new("tar")
                .arg("xvf")
                .arg(&archive.dest)
                .arg("-C")
                .arg(&sources);
            self.exec(&tar)?;

            if let Some(relocation) = archive.component.relocation() {
                let mv = Invocation::new("mv")
                    .arg(sources.join(archive.component.extracted_name()))
                    .arg(self.layout.llvm_src.join(relocation));
                self.exec(&mv)?;
            }
        }

        report.record(Step::AssembleSources, StepOutcome::Ran);
        Ok(())
    }

    fn build_llvm(&mut self, report: &mut Report) -> Result<()> {
        let build = self.layout.llvm_build.clone();
        if build.is_dir() {
            report.record(Step::BuildLlvm, StepOutcome::Skipped);
            return Ok(());
        }

        fs::create_dir_all(&build).context_io(|| format!("creating {}", build.display()))?;

        let cmake = Invocation::new("cmake")
            .arg(install_prefix_define(&self.config))
            .arg(&self.layout.llvm_src)
            .current_dir(&build);
        self.exec(&cmake)?;
        self.exec(&Invocation::new("make").current_dir(&build))?;
        self.exec(&Invocation::new("make").arg("install").current_dir(&build))?;

        report.record(Step::BuildLlvm, StepOutcome::Ran);
        Ok(())
    }

    /// The LLVM root handed to the plugin is always `build-llvm`, whether or
    /// not this run built LLVM there.
    fn configure_plugin(&mut self, report: &mut Report) -> Result<()> {
        if !self.config.plugin_source.is_dir() {
            return Err(InstallError::PluginNotFound {
                path: self.config.plugin_source.clone(),
            });
        }

        let build = self.layout.plugin_build.clone();
        if build.is_dir() {
            report.record(Step::ConfigurePlugin, StepOutcome::Skipped);
            return Ok(());
        }

        fs::create_dir_all(&build).context_io(|| format!("creating {}", build.display()))?;

        let mut llvm_root = OsString::from("-DLLVM_INSTALL_ROOT=");
        llvm_root.push(&self.layout.llvm_build);
        let cmake = Invocation::new("cmake")
            .arg(&self.config.plugin_source)
            .arg(install_prefix_define(&self.config))
            .arg(llvm_root)
            .current_dir(&build);
        self.exec(&cmake)?;

        report.record(Step::ConfigurePlugin, StepOutcome::Ran);
        Ok(())
    }

    fn build_plugin(&mut self, report: &mut Report) -> Result<()> {
        let build = self.layout.plugin_build.clone();

        let make = Invocation::new("make").current_dir(&build);
        let status = match self.runner.run(&make) {
            Ok(status) => status,
            Err(err @ InstallError::Spawn { .. }) => {
                log::warn!("{err}");
                Status::NOT_FOUND
            }
            Err(err) => return Err(err),
        };
        if !status.success() {
            return Err(InstallError::PluginBuild { status });
        }
        report.record(Step::BuildPlugin, StepOutcome::Ran);

        self.exec(&Invocation::new("make").arg("install").current_dir(&build))?;
        report.record(Step::InstallPlugin, StepOutcome::Ran);
        Ok(())
    }

    /// Run a command under the configured failure policy. A program that
    /// cannot be launched counts as a failed command.
    fn exec(&mut self, inv: &Invocation) -> Result<Status> {
        let status = match self.runner.run(inv) {
            Ok(status) => status,
            Err(err @ InstallError::Spawn { .. }) if self.config.policy == FailurePolicy::Lenient => {
                log::warn!("ignoring launch failure: {err}");
                return Ok(Status::NOT_FOUND);
            }
            Err(err) => return Err(err),
        };
        if status.success() {
            return Ok(status);
        }

        match self.config.policy {
            FailurePolicy::Strict => Err(InstallError::CommandFailed {
                command: inv.to_string(),
                status,
            }),
            FailurePolicy::Lenient => {
                log::warn!("ignoring failure ({status}): {inv}");
                Ok(status)
            }
        }
    }
}

fn install_prefix_define(config: &InstallConfig) -> OsString {
    let mut define = OsString::from("-DCMAKE_INSTALL_PREFIX=");
    define.push(&config.prefix);
    define
}
