use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::LibrarySettings;
use crate::error::{LibraryError, Result};

use super::classify::classify;
use super::node::{FileNode, FolderNode, Node, NodeKind};

/// Materializes a `FolderNode` snapshot from what is on disk right now.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    include_hidden: bool,
}

/// A freshly built tree plus the entries that had to be skipped.
#[derive(Debug)]
pub struct Scan {
    pub root: FolderNode,
    pub warnings: Vec<LibraryError>,
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

impl TreeBuilder {
    pub fn new(settings: &LibrarySettings) -> Self {
        Self {
            include_hidden: settings.include_hidden,
        }
    }

    /// Whether `path` would appear in a tree this builder produces.
    pub(super) fn admits(&self, path: &Path) -> bool {
        self.include_hidden || !is_hidden(path)
    }

    /// Build the tree rooted at `root`.
    ///
    /// The root itself must be a readable directory. Below it, entries that
    /// cannot be classified or listed are skipped and reported in
    /// `Scan::warnings`.
    pub fn build(&self, root: &Path) -> Result<Scan> {
        if classify(root)? != NodeKind::Folder {
            return Err(LibraryError::invalid(root, "not a directory"));
        }

        let mut warnings = Vec::new();
        let root = self.load(root, &mut warnings)?;
        debug!(
            root = %root.path().display(),
            nodes = root.descendant_count(),
            skipped = warnings.len(),
            "built library tree"
        );
        Ok(Scan { root, warnings })
    }

    fn load(&self, dir: &Path, warnings: &mut Vec<LibraryError>) -> Result<FolderNode> {
        let mut folder = FolderNode::new(dir);

        // One level per call; recursion happens below so each folder is
        // complete before it is attached to its parent.
        let entries = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name();

        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().unwrap_or(dir).to_path_buf();
                    let io = std::io::Error::from(err);
                    if path == dir {
                        // The directory itself could not be listed.
                        return Err(LibraryError::from_io(&path, io));
                    }
                    skip(warnings, LibraryError::from_io(&path, io));
                    continue;
                }
            };

            let path = entry.path();
            if !self.admits(path) {
                continue;
            }

            let child: Arc<Node> = match classify(path) {
                Ok(NodeKind::File) => FileNode::new(path).into(),
                Ok(NodeKind::Folder) => match self.load(path, warnings) {
                    Ok(sub) => sub.into(),
                    Err(err) => {
                        skip(warnings, err);
                        continue;
                    }
                },
                Err(err) => {
                    skip(warnings, err);
                    continue;
                }
            };
            folder.push_unique(child);
        }

        Ok(folder)
    }
}

fn skip(warnings: &mut Vec<LibraryError>, err: LibraryError) {
    warn!(path = %err.path().display(), error = %err, "skipping library entry");
    warnings.push(err);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn builder() -> TreeBuilder {
        TreeBuilder::new(&LibrarySettings::default())
    }

    fn shape(folder: &FolderNode) -> Vec<(String, NodeKind)> {
        folder
            .children()
            .iter()
            .map(|c| (c.name().to_string(), c.kind()))
            .collect()
    }

    #[test]
    fn build_sorts_children_by_name_and_recurses() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("c.mp3"), b"x").unwrap();
        fs::write(dir.path().join("a.mp3"), b"x").unwrap();
        fs::create_dir_all(dir.path().join("b/inner")).unwrap();
        fs::write(dir.path().join("b/inner/deep.mp3"), b"x").unwrap();

        let scan = builder().build(dir.path()).unwrap();
        assert!(scan.warnings.is_empty());
        assert_eq!(
            shape(&scan.root),
            vec![
                ("a.mp3".to_string(), NodeKind::File),
                ("b".to_string(), NodeKind::Folder),
                ("c.mp3".to_string(), NodeKind::File),
            ]
        );

        let deep = scan.root.find(&dir.path().join("b/inner/deep.mp3")).unwrap();
        assert_eq!(deep.kind(), NodeKind::File);
        assert_eq!(deep.id(), dir.path().join("b/inner/deep.mp3"));
    }

    #[test]
    fn build_is_deterministic_for_unchanged_directory() {
        let dir = tempdir().unwrap();
        for name in ["z.mp3", "m.flac", "a.ogg"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("k")).unwrap();

        let first = builder().build(dir.path()).unwrap().root;
        let second = builder().build(dir.path()).unwrap().root;
        assert_eq!(shape(&first), shape(&second));
        assert_eq!(first, second);
    }

    #[test]
    fn build_rejects_file_root_and_missing_root() {
        let dir = tempdir().unwrap();
        let f = dir.path().join("song.mp3");
        fs::write(&f, b"x").unwrap();

        assert!(matches!(
            builder().build(&f),
            Err(LibraryError::InvalidOperation { .. })
        ));
        assert!(matches!(
            builder().build(&dir.path().join("nope")),
            Err(LibraryError::NotFound { .. })
        ));
    }

    #[test]
    fn build_respects_include_hidden_false() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".hidden.mp3"), b"x").unwrap();
        fs::create_dir(dir.path().join(".cache")).unwrap();
        fs::write(dir.path().join("visible.mp3"), b"x").unwrap();

        let settings = LibrarySettings {
            include_hidden: false,
            ..LibrarySettings::default()
        };
        let scan = TreeBuilder::new(&settings).build(dir.path()).unwrap();
        assert_eq!(shape(&scan.root), vec![("visible.mp3".to_string(), NodeKind::File)]);

        let all = builder().build(dir.path()).unwrap();
        assert_eq!(all.root.len(), 3);
    }

    #[test]
    fn build_keeps_empty_folders() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("empty")).unwrap();

        let scan = builder().build(dir.path()).unwrap();
        let empty = scan.root.children()[0].as_folder().unwrap();
        assert!(empty.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn build_skips_unreadable_folder_and_keeps_siblings() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("inside.mp3"), b"x").unwrap();
        fs::write(dir.path().join("a.mp3"), b"x").unwrap();
        fs::write(dir.path().join("z.mp3"), b"x").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_dir(&locked).is_ok() {
            // Running as a user that ignores permission bits.
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let scan = builder().build(dir.path());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        let scan = scan.unwrap();

        assert_eq!(
            shape(&scan.root),
            vec![
                ("a.mp3".to_string(), NodeKind::File),
                ("z.mp3".to_string(), NodeKind::File),
            ]
        );
        assert_eq!(scan.warnings.len(), 1);
        assert!(matches!(
            &scan.warnings[0],
            LibraryError::Unreadable { path, .. } if *path == locked
        ));
    }
}
