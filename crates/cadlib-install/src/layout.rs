//! Directory layout of the build tree.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::DEFAULT_BUILD_DIR;
use crate::error::{IoContext, Result};

pub const LLVM_SOURCE_DIR: &str = "llvm-3.2.src";

/// Paths used during the install, all below a single build root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkspaceLayout {
    /// Build root (`_build_`)
    pub root: PathBuf,
    /// Downloaded archives and extracted sources
    pub sources: PathBuf,
    /// Assembled LLVM tree with clang, compiler-rt and polly merged in
    pub llvm_src: PathBuf,
    /// LLVM configure/build directory; also passed to the plugin as its LLVM root
    pub llvm_build: PathBuf,
    pub plugin_build: PathBuf,
}

impl WorkspaceLayout {
    /// Layout rooted at `<base>/_build_`.
    pub fn new(base: &Path) -> Self {
        Self::with_root(base.join(DEFAULT_BUILD_DIR))
    }

    pub fn with_root(root: PathBuf) -> Self {
        let sources = root.join("sources");
        Self {
            llvm_src: sources.join(LLVM_SOURCE_DIR),
            llvm_build: root.join("build-llvm"),
            plugin_build: root.join("build-plugin"),
            sources,
            root,
        }
    }

    /// Create the build root and its `sources` directory.
    ///
    /// Returns `true` if anything had to be created. `sources` is checked on
    /// its own so a tree whose `sources` was removed by hand is repaired.
    pub fn bootstrap(&self) -> Result<bool> {
        let mut created = false;
        if !self.root.is_dir() {
            fs::create_dir_all(&self.root)
                .context_io(|| format!("creating {}", self.root.display()))?;
            created = true;
        }
        if !self.sources.is_dir() {
            fs::create_dir_all(&self.sources)
                .context_io(|| format!("creating {}", self.sources.display()))?;
            created = true;
        }
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_derive_from_base() {
        let layout = WorkspaceLayout::new(Path::new("/work"));
        assert_eq!(layout.root, PathBuf::from("/work/_build_"));
        assert_eq!(layout.sources, PathBuf::from("/work/_build_/sources"));
        assert_eq!(
            layout.llvm_src,
            PathBuf::from("/work/_build_/sources/llvm-3.2.src")
        );
        assert_eq!(layout.llvm_build, PathBuf::from("/work/_build_/build-llvm"));
        assert_eq!(
            layout.plugin_build,
            PathBuf::from("/work/_build_/build-plugin")
        );
    }

    #[test]
    fn bootstrap_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = WorkspaceLayout::new(tmp.path());

        assert!(layout.bootstrap().unwrap());
        assert!(layout.sources.is_dir());
        assert!(!layout.bootstrap().unwrap());
    }

    #[test]
    fn bootstrap_restores_missing_sources() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = WorkspaceLayout::new(tmp.path());
        fs::create_dir(&layout.root).unwrap();

        assert!(layout.bootstrap().unwrap());
        assert!(layout.sources.is_dir());
    }
}
