use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::sh::Status;

pub type Result<T> = std::result::Result<T, InstallError>;

#[derive(Debug, Error)]
pub enum InstallError {
    /// The plugin source directory is missing; nothing can be built.
    #[error("LLVM plugin NOT found ({})", .path.display())]
    PluginNotFound { path: PathBuf },

    /// `make` in the plugin build directory reported failure.
    #[error("Problems during LLVM plugin compilation ({status})")]
    PluginBuild { status: Status },

    /// Any other external command failed while running with `--strict`.
    #[error("command failed with {status}: {command}")]
    CommandFailed { command: String, status: Status },

    #[error("failed to launch `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl InstallError {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        InstallError::Io {
            context: context.into(),
            source,
        }
    }
}

/// Attach a human readable context to a raw `io::Result`.
pub(crate) trait IoContext<T> {
    fn context_io<C, F>(self, f: F) -> Result<T>
    where
        C: Into<String>,
        F: FnOnce() -> C;
}

impl<T> IoContext<T> for io::Result<T> {
    fn context_io<C, F>(self, f: F) -> Result<T>
    where
        C: Into<String>,
        F: FnOnce() -> C,
    {
        self.map_err(|e| InstallError::io(f(), e))
    }
}
