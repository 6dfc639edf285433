use anyhow::Context;
use clap::Parser;
use log::LevelFilter;

use cadlib_install::cli::{normalize_legacy_flags, Cli};
use cadlib_install::installer::Installer;
use cadlib_install::sh::ShellRunner;

fn main() {
    let cli = Cli::parse_from(normalize_legacy_flags(std::env::args_os()));

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();

    if let Err(e) = run(cli) {
        eprintln!();
        eprintln!("[ERROR]: {e:#}");
        eprintln!();
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("reading the current directory")?;
    let config = cli
        .install
        .into_config(&cwd)
        .context("resolving configuration")?;
    log::debug!("{config:?}");

    Installer::new(config, ShellRunner::default()).run()?;
    Ok(())
}
