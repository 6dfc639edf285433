use std::ffi::OsString;
use std::path::{Path, PathBuf};

use clap::builder::BoolishValueParser;
use clap::{Args, Parser};

use crate::config::{
    FailurePolicy, InstallConfig, InstallConfigBuilderError, DEFAULT_BUILD_DIR,
    DEFAULT_LLVM_MIRROR, DEFAULT_PREFIX,
};

/// Long options that were historically spelled with a single dash.
const LEGACY_LONG_FLAGS: &[&str] = &["prefix", "compile-llvm"];

/// cadlib-install command-line interface
#[derive(Parser, Debug)]
#[command(
    name = "cadlib-install",
    version,
    about = "Build and install LLVM 3.2 and the cadlib compiler plugin"
)]
pub struct Cli {
    #[command(flatten)]
    pub install: InstallArgs,

    /// Enable verbose output (log every external command)
    #[arg(short, long)]
    pub verbose: bool,
}

/// Available options
#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Installation directory
    #[arg(long, env = "CADLIB_PREFIX", default_value = DEFAULT_PREFIX)]
    pub prefix: PathBuf,

    /// Enable the compilation of LLVM sources
    #[arg(
        long = "compile-llvm",
        env = "CADLIB_COMPILE_LLVM",
        value_parser = BoolishValueParser::new()
    )]
    pub compile_llvm: bool,

    /// Plugin sources (defaults to `lib` under the current directory)
    #[arg(long = "plugin-source")]
    pub plugin_source: Option<PathBuf>,

    /// Build tree holding archives, sources and build directories
    #[arg(long = "build-dir", default_value = DEFAULT_BUILD_DIR)]
    pub build_dir: PathBuf,

    /// Base URL of the LLVM release archives
    #[arg(long = "llvm-mirror", env = "CADLIB_LLVM_MIRROR", default_value = DEFAULT_LLVM_MIRROR)]
    pub llvm_mirror: String,

    /// Abort on any failing external command, not only the plugin build
    #[arg(long)]
    pub strict: bool,
}

impl InstallArgs {
    /// Resolve relative paths against `cwd` and produce the final config.
    pub fn into_config(self, cwd: &Path) -> Result<InstallConfig, InstallConfigBuilderError> {
        let plugin_source = self
            .plugin_source
            .map(|p| cwd.join(p))
            .unwrap_or_else(|| cwd.join("lib"));
        let policy = if self.strict {
            FailurePolicy::Strict
        } else {
            FailurePolicy::Lenient
        };

        InstallConfig::builder()
            .prefix(cwd.join(self.prefix))
            .compile_llvm(self.compile_llvm)
            .plugin_source(plugin_source)
            .build_dir(cwd.join(self.build_dir))
            .llvm_mirror(self.llvm_mirror)
            .policy(policy)
            .build()
    }
}

/// Rewrite `-prefix` / `-compile-llvm` (and `-prefix=<path>`) into their
/// double-dash forms so clap accepts them. Arguments after `--` are left alone.
pub fn normalize_legacy_flags<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut out = Vec::new();
    let mut passthrough = false;

    for arg in args {
        let arg: OsString = arg.into();
        if passthrough {
            out.push(arg);
            continue;
        }

        let rewritten = arg.to_str().and_then(|s| {
            if s == "--" {
                return None;
            }
            let rest = s.strip_prefix('-').filter(|r| !r.starts_with('-'))?;
            let name = rest.split('=').next().unwrap_or(rest);
            LEGACY_LONG_FLAGS
                .contains(&name)
                .then(|| OsString::from(format!("--{rest}")))
        });

        if arg == "--" {
            passthrough = true;
        }
        out.push(rewritten.unwrap_or(arg));
    }

    out
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, MutexGuard};

    use super::*;

    // Parsing reads the process environment; tests that set variables hold
    // this for as long as the variables exist.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn env_lock() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn try_parse(args: &[&str]) -> Result<Cli, clap::Error> {
        let mut argv = vec!["cadlib-install"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(normalize_legacy_flags(argv))
    }

    fn parse(args: &[&str]) -> Cli {
        let _env = env_lock();
        try_parse(args).unwrap()
    }

    /// Sets environment variables and removes them again on drop.
    struct EnvVars(Vec<&'static str>);

    impl EnvVars {
        fn set(&mut self, key: &'static str, value: &str) {
            std::env::set_var(key, value);
            self.0.push(key);
        }
    }

    impl Drop for EnvVars {
        fn drop(&mut self) {
            for key in &self.0 {
                std::env::remove_var(key);
            }
        }
    }

    #[test]
    fn legacy_single_dash_flags() {
        let cli = parse(&["-prefix", "/usr/local/cad", "-compile-llvm"]);
        assert_eq!(cli.install.prefix, PathBuf::from("/usr/local/cad"));
        assert!(cli.install.compile_llvm);
    }

    #[test]
    fn legacy_flag_with_equals() {
        let cli = parse(&["-prefix=/srv/tools"]);
        assert_eq!(cli.install.prefix, PathBuf::from("/srv/tools"));
        assert!(!cli.install.compile_llvm);
    }

    #[test]
    fn double_dash_flags_still_work() {
        let cli = parse(&["--prefix", "/a", "--compile-llvm", "--strict", "-v"]);
        assert_eq!(cli.install.prefix, PathBuf::from("/a"));
        assert!(cli.install.compile_llvm);
        assert!(cli.install.strict);
        assert!(cli.verbose);
    }

    #[test]
    fn normalize_leaves_other_arguments_alone() {
        let out = normalize_legacy_flags(["bin", "-v", "-prefix", "-x", "--", "-prefix"]);
        assert_eq!(out, ["bin", "-v", "--prefix", "-x", "--", "-prefix"]);
    }

    #[test]
    fn into_config_resolves_relative_paths() {
        let cli = parse(&["-prefix", "inst", "--build-dir", "scratch"]);
        let cfg = cli.install.into_config(Path::new("/work")).unwrap();

        assert_eq!(cfg.prefix, PathBuf::from("/work/inst"));
        assert_eq!(cfg.plugin_source, PathBuf::from("/work/lib"));
        assert_eq!(cfg.build_dir, PathBuf::from("/work/scratch"));
        assert_eq!(cfg.policy, FailurePolicy::Lenient);
    }

    #[test]
    fn into_config_keeps_absolute_paths() {
        let cli = parse(&["--plugin-source", "/src/cadlib/lib", "--strict"]);
        let cfg = cli.install.into_config(Path::new("/work")).unwrap();

        assert_eq!(cfg.prefix, PathBuf::from("/opt/compiler"));
        assert_eq!(cfg.plugin_source, PathBuf::from("/src/cadlib/lib"));
        assert_eq!(cfg.policy, FailurePolicy::Strict);
    }

    #[test]
    fn environment_fallbacks() {
        let _env = env_lock();
        let mut vars = EnvVars(Vec::new());
        vars.set("CADLIB_PREFIX", "/env/prefix");
        vars.set("CADLIB_COMPILE_LLVM", "yes");

        let cli = try_parse(&[]).unwrap();
        assert_eq!(cli.install.prefix, PathBuf::from("/env/prefix"));
        assert!(cli.install.compile_llvm);

        vars.set("CADLIB_COMPILE_LLVM", "0");
        let cli = try_parse(&["-prefix", "/from/cli"]).unwrap();
        assert_eq!(cli.install.prefix, PathBuf::from("/from/cli"));
        assert!(!cli.install.compile_llvm);
    }
}
