use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{IoContext, Result};

pub const SCRIPT_NAME: &str = "setup.sh";
pub const SCRIPT_MODE: u32 = 0o775;

/// Shell snippet that puts an install prefix on `PATH` and `LD_LIBRARY_PATH`.
#[derive(Clone, Debug)]
pub struct EnvironmentScript {
    prefix: PathBuf,
}

impl EnvironmentScript {
    pub fn new(prefix: &Path) -> Self {
        Self {
            prefix: prefix.to_path_buf(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.prefix.join(SCRIPT_NAME)
    }

    pub fn render(&self) -> String {
        let prefix = self.prefix.display();
        format!(
            "#!/bin/sh\n\
             export PATH={prefix}/bin:$PATH\n\
             export LD_LIBRARY_PATH={prefix}/lib:$LD_LIBRARY_PATH\n"
        )
    }

    /// Write `<prefix>/setup.sh`, replacing any previous copy, and mark it
    /// executable.
    pub fn write(&self) -> Result<PathBuf> {
        let path = self.path();
        fs::write(&path, self.render()).context_io(|| format!("writing {}", path.display()))?;
        set_mode(&path)?;
        Ok(path)
    }
}

#[cfg(unix)]
fn set_mode(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(SCRIPT_MODE))
        .context_io(|| format!("setting permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_has_two_exports() {
        let script = EnvironmentScript::new(Path::new("/opt/compiler"));
        let text = script.render();
        let exports: Vec<_> = text.lines().filter(|l| l.starts_with("export ")).collect();

        assert_eq!(
            exports,
            [
                "export PATH=/opt/compiler/bin:$PATH",
                "export LD_LIBRARY_PATH=/opt/compiler/lib:$LD_LIBRARY_PATH",
            ]
        );
        assert!(text.starts_with("#!/bin/sh\n"));
    }

    #[cfg(unix)]
    #[test]
    fn write_overwrites_and_sets_mode() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let script = EnvironmentScript::new(tmp.path());
        fs::write(script.path(), "stale").unwrap();

        let path = script.write().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), script.render());

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o775);
    }
}
