//! Copy-ingest: bring external files and directories into the library.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::{LibraryError, Result};

use super::build::TreeBuilder;
use super::classify::classify;
use super::node::{FileNode, Node, NodeKind};

/// A source that could not be ingested, with the reason.
#[derive(Debug)]
pub struct Rejection {
    pub source: PathBuf,
    pub error: LibraryError,
}

/// Per-source result of a batch operation.
#[derive(Debug)]
pub enum Outcome {
    Resolved(Node),
    Rejected(Rejection),
}

/// Outcomes in the same order as the sources that produced them.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub outcomes: Vec<Outcome>,
}

impl IngestReport {
    pub fn resolved(&self) -> impl Iterator<Item = &Node> {
        self.outcomes.iter().filter_map(|o| match o {
            Outcome::Resolved(n) => Some(n),
            Outcome::Rejected(_) => None,
        })
    }

    pub fn rejected(&self) -> impl Iterator<Item = &Rejection> {
        self.outcomes.iter().filter_map(|o| match o {
            Outcome::Rejected(r) => Some(r),
            Outcome::Resolved(_) => None,
        })
    }

    pub fn into_parts(self) -> (Vec<Node>, Vec<Rejection>) {
        let mut resolved = Vec::new();
        let mut rejected = Vec::new();
        for o in self.outcomes {
            match o {
                Outcome::Resolved(n) => resolved.push(n),
                Outcome::Rejected(r) => rejected.push(r),
            }
        }
        (resolved, rejected)
    }
}

/// Copy every path in `sources` into `destination`.
///
/// `destination` is created if missing; failing to create it is the only
/// error that aborts the call. Each source is then handled on its own and a
/// failure is recorded as a rejection without stopping the batch. Existing
/// entries are never overwritten.
pub fn ingest<P: AsRef<Path>>(
    sources: &[P],
    destination: &Path,
    builder: &TreeBuilder,
) -> Result<IngestReport> {
    fs::create_dir_all(destination).map_err(|e| LibraryError::from_io(destination, e))?;

    let mut report = IngestReport::default();
    for source in sources {
        let source = source.as_ref();
        let outcome = match ingest_one(source, destination, builder) {
            Ok(node) => {
                info!(from = %source.display(), to = %node.path().display(), "ingested");
                Outcome::Resolved(node)
            }
            Err(error) => {
                warn!(from = %source.display(), %error, "ingest rejected");
                Outcome::Rejected(Rejection {
                    source: source.to_path_buf(),
                    error,
                })
            }
        };
        report.outcomes.push(outcome);
    }
    Ok(report)
}

fn ingest_one(source: &Path, destination: &Path, builder: &TreeBuilder) -> Result<Node> {
    let name = source
        .file_name()
        .ok_or_else(|| LibraryError::invalid(source, "path has no file name"))?;
    let target = destination.join(name);
    let kind = classify(source)?;
    if !builder.admits(&target) {
        return Err(LibraryError::invalid(
            source,
            "hidden entries are excluded from the library",
        ));
    }

    if fs::symlink_metadata(&target).is_ok() {
        return Err(LibraryError::CopyFailed {
            from: source.to_path_buf(),
            to: target,
            source: io::Error::from(io::ErrorKind::AlreadyExists),
        });
    }

    let copy_err = |e: io::Error| LibraryError::CopyFailed {
        from: source.to_path_buf(),
        to: target.clone(),
        source: e,
    };

    match kind {
        NodeKind::File => {
            fs::copy(source, &target).map_err(copy_err)?;
            Ok(FileNode::new(&target).into())
        }
        NodeKind::Folder => {
            if contains(source, destination) {
                return Err(LibraryError::invalid(
                    source,
                    "cannot copy a directory into itself",
                ));
            }
            copy_tree(source, &target).map_err(copy_err)?;
            let scan = builder.build(&target)?;
            Ok(scan.root.into())
        }
    }
}

/// Whether `dir` is `inner` or one of its ancestors, comparing real paths.
fn contains(dir: &Path, inner: &Path) -> bool {
    match (fs::canonicalize(dir), fs::canonicalize(inner)) {
        (Ok(dir), Ok(inner)) => inner.starts_with(dir),
        _ => false,
    }
}

fn copy_tree(from: &Path, to: &Path) -> io::Result<()> {
    for entry in WalkDir::new(from).follow_links(false) {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let dest = to.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest)?;
        } else {
            fs::copy(entry.path(), &dest)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LibrarySettings;
    use tempfile::tempdir;

    fn builder() -> TreeBuilder {
        TreeBuilder::new(&LibrarySettings::default())
    }

    #[test]
    fn ingest_partitions_good_and_missing_sources() {
        let ext = tempdir().unwrap();
        let lib = tempdir().unwrap();
        let music = lib.path().join("music");
        let good = ext.path().join("good.mp3");
        let missing = ext.path().join("missing.mp3");
        fs::write(&good, b"audio").unwrap();

        let report = ingest(&[&good, &missing], &music, &builder()).unwrap();
        assert_eq!(report.outcomes.len(), 2);

        let resolved: Vec<&Node> = report.resolved().collect();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].name(), "good.mp3");
        assert_eq!(resolved[0].kind(), NodeKind::File);
        assert_eq!(resolved[0].path(), music.join("good.mp3"));
        assert_eq!(fs::read(music.join("good.mp3")).unwrap(), b"audio");

        let rejected: Vec<&Rejection> = report.rejected().collect();
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].source, missing);
        assert!(matches!(rejected[0].error, LibraryError::NotFound { .. }));
    }

    #[test]
    fn ingest_rejects_hidden_names_when_hidden_entries_are_excluded() {
        let ext = tempdir().unwrap();
        let lib = tempdir().unwrap();
        let hidden = ext.path().join(".x.mp3");
        let shown = ext.path().join("x.mp3");
        fs::write(&hidden, b"x").unwrap();
        fs::write(&shown, b"x").unwrap();

        let settings = LibrarySettings {
            include_hidden: false,
            ..LibrarySettings::default()
        };
        let builder = TreeBuilder::new(&settings);
        let report = ingest(&[&hidden, &shown], lib.path(), &builder).unwrap();

        let rejected: Vec<&Rejection> = report.rejected().collect();
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].source, hidden);
        assert!(matches!(
            rejected[0].error,
            LibraryError::InvalidOperation { .. }
        ));
        assert!(!lib.path().join(".x.mp3").exists());

        // What was admitted is exactly what a rebuild sees.
        let resolved: Vec<&Node> = report.resolved().collect();
        let rebuilt = builder.build(lib.path()).unwrap().root;
        assert_eq!(resolved.len(), rebuilt.len());
        assert!(rebuilt.contains(resolved[0].path()));
    }

    #[test]
    fn ingest_creates_destination_idempotently() {
        let lib = tempdir().unwrap();
        let music = lib.path().join("music");

        let empty: [&Path; 0] = [];
        ingest(&empty, &music, &builder()).unwrap();
        assert!(music.is_dir());
        ingest(&empty, &music, &builder()).unwrap();
        assert!(music.is_dir());
    }

    #[test]
    fn ingest_copies_directories_recursively_and_builds_them() {
        let ext = tempdir().unwrap();
        let lib = tempdir().unwrap();
        let album = ext.path().join("album");
        fs::create_dir_all(album.join("disc2")).unwrap();
        fs::write(album.join("b.mp3"), b"b").unwrap();
        fs::write(album.join("a.mp3"), b"a").unwrap();
        fs::write(album.join("disc2/c.mp3"), b"c").unwrap();

        let report = ingest(&[&album], lib.path(), &builder()).unwrap();
        let (resolved, rejected) = report.into_parts();
        assert!(rejected.is_empty());

        let folder = resolved[0].as_folder().unwrap();
        assert_eq!(folder.path(), lib.path().join("album"));
        let names: Vec<&str> = folder.children().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["a.mp3", "b.mp3", "disc2"]);
        assert!(lib.path().join("album/disc2/c.mp3").is_file());
        // Source is left in place.
        assert!(album.join("a.mp3").exists());
    }

    #[test]
    fn ingest_rejects_name_collisions_without_overwriting() {
        let ext = tempdir().unwrap();
        let lib = tempdir().unwrap();
        let src = ext.path().join("song.mp3");
        fs::write(&src, b"new").unwrap();
        fs::write(lib.path().join("song.mp3"), b"old").unwrap();

        let report = ingest(&[&src], lib.path(), &builder()).unwrap();
        let rejected: Vec<&Rejection> = report.rejected().collect();
        assert_eq!(rejected.len(), 1);
        match &rejected[0].error {
            LibraryError::CopyFailed { source, .. } => {
                assert_eq!(source.kind(), io::ErrorKind::AlreadyExists)
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(fs::read(lib.path().join("song.mp3")).unwrap(), b"old");
    }

    #[test]
    fn ingest_one_failure_does_not_abort_the_batch() {
        let ext = tempdir().unwrap();
        let lib = tempdir().unwrap();
        let first = ext.path().join("1.mp3");
        let third = ext.path().join("3.mp3");
        fs::write(&first, b"x").unwrap();
        fs::write(&third, b"x").unwrap();
        let sources = vec![first.clone(), ext.path().join("2.mp3"), third.clone()];

        let report = ingest(&sources, lib.path(), &builder()).unwrap();
        assert_eq!(report.resolved().count() + report.rejected().count(), sources.len());

        let order: Vec<&Path> = report
            .outcomes
            .iter()
            .map(|o| match o {
                Outcome::Resolved(n) => n.path(),
                Outcome::Rejected(r) => r.source.as_path(),
            })
            .collect();
        assert_eq!(
            order,
            vec![
                lib.path().join("1.mp3").as_path(),
                ext.path().join("2.mp3").as_path(),
                lib.path().join("3.mp3").as_path(),
            ]
        );
    }

    #[test]
    fn ingest_refuses_to_copy_a_directory_into_itself() {
        let root = tempdir().unwrap();
        let outer = root.path().join("outer");
        let inner = outer.join("inner");
        fs::create_dir_all(&inner).unwrap();

        let report = ingest(&[&outer], &inner, &builder()).unwrap();
        let rejected: Vec<&Rejection> = report.rejected().collect();
        assert!(matches!(
            rejected[0].error,
            LibraryError::InvalidOperation { .. }
        ));
        assert!(!inner.join("outer").exists());
    }
}
