// External command execution

use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::error::{InstallError, Result};

/// A single external command: program, arguments and the directory it runs in.
///
/// The working directory is carried by the invocation itself so the
/// installer never has to change the process-wide current directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<OsString>,
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    pub fn new<P: Into<String>>(program: P) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg<S: Into<OsString>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Arguments as lossy strings, mostly useful for assertions and logs.
    pub fn arg_strings(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        if let Some(ref dir) = self.cwd {
            write!(f, " (in {})", dir.display())?;
        }
        Ok(())
    }
}

/// Exit status of an external command. `code` is `None` when the process
/// was terminated by a signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Status {
    pub code: Option<i32>,
}

impl Status {
    pub const SUCCESS: Status = Status { code: Some(0) };

    /// What a shell reports for a program it cannot find or launch.
    pub const NOT_FOUND: Status = Status { code: Some(127) };

    pub fn from_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {code}"),
            None => f.write_str("terminated by signal"),
        }
    }
}

/// Something that can execute an [`Invocation`] and report its status.
///
/// A non-zero status is not an error at this level; callers decide what a
/// failure means for them.
pub trait Runner {
    fn run(&mut self, inv: &Invocation) -> Result<Status>;
}

impl<R: Runner + ?Sized> Runner for &mut R {
    fn run(&mut self, inv: &Invocation) -> Result<Status> {
        (**self).run(inv)
    }
}

#[derive(Clone, Debug)]
pub enum StreamMode {
    Inherit,
    Null,
}

impl StreamMode {
    fn stdio(&self) -> Stdio {
        match self {
            StreamMode::Inherit => Stdio::inherit(),
            StreamMode::Null => Stdio::null(),
        }
    }
}

/// Runs invocations as real child processes, blocking until each exits.
#[derive(Clone, Debug)]
pub struct ShellRunner {
    pub stdout: StreamMode,
    pub stderr: StreamMode,
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self {
            stdout: StreamMode::Inherit,
            stderr: StreamMode::Inherit,
        }
    }
}

impl Runner for ShellRunner {
    fn run(&mut self, inv: &Invocation) -> Result<Status> {
        log::debug!("[sh] {}", inv);

        let mut command = Command::new(&inv.program);
        command
            .args(&inv.args)
            .stdin(Stdio::null())
            .stdout(self.stdout.stdio())
            .stderr(self.stderr.stdio());
        if let Some(ref dir) = inv.cwd {
            command.current_dir(dir);
        }

        let status = command.status().map_err(|source| InstallError::Spawn {
            command: inv.to_string(),
            source,
        })?;

        Ok(Status {
            code: status.code(),
        })
    }
}
