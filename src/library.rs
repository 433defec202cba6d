//! The in-memory library tree and the operations that keep it in step with
//! the library directory on disk.
//!
//! `Library` carries the configured directory and builder so nothing below
//! depends on a global path.

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::info;

use crate::config::LibrarySettings;
use crate::error::{LibraryError, Result};

mod build;
mod classify;
mod ingest;
mod mutate;
mod node;

pub use build::{Scan, TreeBuilder};
pub use classify::{classify, probe};
pub use ingest::{IngestReport, Outcome, Rejection, ingest};
pub use mutate::{add, add_to, remove};
pub use node::{FileNode, FolderNode, Node, NodeKind};

#[derive(Debug, Clone)]
pub struct Library {
    dir: PathBuf,
    create_missing: bool,
    builder: TreeBuilder,
}

impl Library {
    pub fn new(dir: impl Into<PathBuf>, settings: &LibrarySettings) -> Self {
        Self {
            dir: dir.into(),
            create_missing: settings.create_missing,
            builder: TreeBuilder::new(settings),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Build a fresh snapshot of the library directory.
    pub fn scan(&self) -> Result<Scan> {
        if self.create_missing && probe(&self.dir).is_none() {
            fs::create_dir_all(&self.dir).map_err(|e| LibraryError::from_io(&self.dir, e))?;
            info!(dir = %self.dir.display(), "created library directory");
        }
        self.builder.build(&self.dir)
    }

    /// Copy `sources` into `destination`, a folder inside the library.
    pub fn ingest<P: AsRef<Path>>(&self, sources: &[P], destination: &Path) -> Result<IngestReport> {
        if !normalize(destination).starts_with(normalize(&self.dir)) {
            return Err(LibraryError::invalid(
                destination,
                "upload destination is outside the library",
            ));
        }
        ingest(sources, destination, &self.builder)
    }
}

/// Resolve `.` and `..` lexically so path comparisons see through them.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out
}
