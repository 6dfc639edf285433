//! The LLVM 3.2 release archives and where each one ends up.

use std::path::{Path, PathBuf};

pub const LLVM_VERSION: &str = "3.2";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Component {
    Llvm,
    Clang,
    CompilerRt,
    Polly,
}

impl Component {
    /// Order in which archives are fetched.
    pub const FETCH_ORDER: [Component; 4] = [
        Component::Clang,
        Component::Llvm,
        Component::CompilerRt,
        Component::Polly,
    ];

    /// Order in which archives are unpacked; LLVM must come first so the
    /// subprojects have a tree to be moved into.
    pub const EXTRACT_ORDER: [Component; 4] = [
        Component::Llvm,
        Component::Clang,
        Component::CompilerRt,
        Component::Polly,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Component::Llvm => "llvm",
            Component::Clang => "clang",
            Component::CompilerRt => "compiler-rt",
            Component::Polly => "polly",
        }
    }

    pub fn extracted_name(self) -> String {
        format!("{}-{}.src", self.name(), LLVM_VERSION)
    }

    pub fn archive_name(self) -> String {
        format!("{}.tar.gz", self.extracted_name())
    }

    /// Where the extracted tree lives inside the LLVM source tree, if it
    /// has to be moved there at all.
    pub fn relocation(self) -> Option<&'static str> {
        match self {
            Component::Llvm => None,
            Component::Clang => Some("tools/clang"),
            Component::CompilerRt => Some("projects/compiler-rt"),
            Component::Polly => Some("tools/polly"),
        }
    }
}

/// One remote archive and its local destination.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Archive {
    pub component: Component,
    pub url: String,
    pub dest: PathBuf,
}

#[derive(Clone, Debug)]
pub struct ArchiveSet {
    archives: Vec<Archive>,
}

impl ArchiveSet {
    pub fn new(mirror: &str, sources: &Path) -> Self {
        let base = mirror.trim_end_matches('/');
        let archives = Component::FETCH_ORDER
            .iter()
            .map(|&component| Archive {
                component,
                url: format!("{base}/{LLVM_VERSION}/{}", component.archive_name()),
                dest: sources.join(component.archive_name()),
            })
            .collect();
        Self { archives }
    }

    /// Archives in fetch order.
    pub fn iter(&self) -> impl Iterator<Item = &Archive> {
        self.archives.iter()
    }

    pub fn get(&self, component: Component) -> Option<&Archive> {
        self.archives.iter().find(|a| a.component == component)
    }

    /// Archives in extraction order.
    pub fn extraction_order(&self) -> impl Iterator<Item = &Archive> {
        Component::EXTRACT_ORDER
            .into_iter()
            .filter_map(move |c| self.get(c))
    }
}
