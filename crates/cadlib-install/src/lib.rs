//! Installer for the LLVM 3.2 toolchain and the cadlib compiler plugin.
//!
//! The sequence lives in [`installer::Installer`]; external tools (`wget`,
//! `tar`, `mv`, `cmake`, `make`) are reached only through [`sh::Runner`].

pub mod archive;
pub mod cli;
pub mod config;
pub mod env_script;
pub mod error;
pub mod installer;
pub mod layout;
pub mod sh;

pub use config::{FailurePolicy, InstallConfig};
pub use error::{InstallError, Result};
pub use installer::{Installer, Report, Step, StepOutcome};
