use std::path::PathBuf;

use derive_builder::Builder;

pub const DEFAULT_PREFIX: &str = "/opt/compiler";
pub const DEFAULT_BUILD_DIR: &str = "_build_";
pub const DEFAULT_LLVM_MIRROR: &str = "http://llvm.org/releases";

/// What to do when an external command other than the plugin build fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log a warning and keep going. Only the plugin build status aborts.
    #[default]
    Lenient,
    /// Abort on the first non-zero status.
    Strict,
}

/// Resolved installer configuration. Built once at startup and never
/// mutated afterwards.
#[derive(Clone, Debug, Builder)]
#[builder(setter(into))]
pub struct InstallConfig {
    /// Installation target directory.
    #[builder(default = "PathBuf::from(DEFAULT_PREFIX)")]
    pub prefix: PathBuf,

    /// Fetch and build LLVM from source before the plugin.
    #[builder(default)]
    pub compile_llvm: bool,

    /// Directory holding the plugin's CMake project.
    pub plugin_source: PathBuf,

    /// Root of the build tree (archives, sources, build directories).
    #[builder(default = "PathBuf::from(DEFAULT_BUILD_DIR)")]
    pub build_dir: PathBuf,

    /// Base URL the LLVM release archives are fetched from.
    #[builder(default = "DEFAULT_LLVM_MIRROR.to_string()")]
    pub llvm_mirror: String,

    #[builder(default)]
    pub policy: FailurePolicy,
}

impl InstallConfig {
    pub fn builder() -> InstallConfigBuilder {
        InstallConfigBuilder::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_classic_installer() {
        let cfg = InstallConfig::builder()
            .plugin_source("/src/lib")
            .build()
            .unwrap();

        assert_eq!(cfg.prefix, PathBuf::from("/opt/compiler"));
        assert!(!cfg.compile_llvm);
        assert_eq!(cfg.build_dir, PathBuf::from("_build_"));
        assert_eq!(cfg.llvm_mirror, "http://llvm.org/releases");
        assert_eq!(cfg.policy, FailurePolicy::Lenient);
    }

    #[test]
    fn plugin_source_is_required() {
        assert!(InstallConfig::builder().build().is_err());
    }
}
