use std::fs;
use std::path::Path;

use crate::error::{LibraryError, Result};

use super::node::NodeKind;

/// Classify `path` as a file or a folder.
///
/// Uses `symlink_metadata`, so links are never followed and classify as
/// files. Nothing is cached: the library directory may change between calls.
pub fn classify(path: &Path) -> Result<NodeKind> {
    let meta = fs::symlink_metadata(path).map_err(|e| LibraryError::from_io(path, e))?;
    if meta.is_dir() {
        Ok(NodeKind::Folder)
    } else {
        Ok(NodeKind::File)
    }
}

/// Like [`classify`], but `None` when the path is missing or unreadable.
pub fn probe(path: &Path) -> Option<NodeKind> {
    classify(path).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn classify_reports_kind_from_disk() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.mp3");
        fs::write(&file, b"not real").unwrap();

        assert_eq!(classify(dir.path()).unwrap(), NodeKind::Folder);
        assert_eq!(classify(&file).unwrap(), NodeKind::File);
    }

    #[test]
    fn classify_missing_path_is_not_found() {
        let dir = tempdir().unwrap();
        let gone = dir.path().join("gone.mp3");

        assert!(matches!(classify(&gone), Err(LibraryError::NotFound { .. })));
        assert_eq!(probe(&gone), None);
    }

    #[test]
    fn classify_requeries_after_external_change() {
        let dir = tempdir().unwrap();
        let p = dir.path().join("x");
        fs::write(&p, b"file first").unwrap();
        assert_eq!(probe(&p), Some(NodeKind::File));

        fs::remove_file(&p).unwrap();
        fs::create_dir(&p).unwrap();
        assert_eq!(probe(&p), Some(NodeKind::Folder));
    }
}
