//! Copy-on-write mutation of folder snapshots.
//!
//! `add` and `remove` never touch the folder they are given. They return a
//! new folder that shares every untouched child `Arc` with the old one, so
//! holders of the previous snapshot keep a consistent view.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{LibraryError, Result};

use super::node::{FolderNode, Node, NodeKind};

/// Append every candidate whose id is not already a child of `folder`.
///
/// Adding a node that is already present is a no-op. Nothing happens on
/// disk; the entries are expected to exist already.
pub fn add<I>(folder: &FolderNode, new_children: I) -> FolderNode
where
    I: IntoIterator,
    I::Item: Into<Arc<Node>>,
{
    let mut next = folder.rebuilt(folder.children().to_vec());
    let mut added = 0usize;
    for child in new_children {
        if next.push_unique(child.into()) {
            added += 1;
        }
    }
    debug!(folder = %folder.path().display(), added, "add");
    next
}

/// [`add`] into the folder at `parent`, anywhere below (or at) `root`.
///
/// Only the folders on the path from `parent` up to `root` are reallocated.
pub fn add_to<I>(root: &FolderNode, parent: &Path, new_children: I) -> Result<FolderNode>
where
    I: IntoIterator,
    I::Item: Into<Arc<Node>>,
{
    if parent == root.path() {
        return Ok(add(root, new_children));
    }

    let (pos, sub) = root
        .children()
        .iter()
        .enumerate()
        .find_map(|(i, c)| match c.as_ref() {
            Node::Folder(sub) if parent.starts_with(sub.path()) => Some((i, sub)),
            _ => None,
        })
        .ok_or_else(|| LibraryError::invalid(parent, "no such folder in the library tree"))?;

    let replaced = add_to(sub, parent, new_children)?;
    let mut children = root.children().to_vec();
    children[pos] = replaced.into();
    Ok(root.rebuilt(children))
}

/// Outstanding targets plus everything the traversal decided to delete.
struct Removal {
    remaining: Vec<PathBuf>,
    doomed: Vec<(PathBuf, NodeKind)>,
    visited: usize,
}

impl Removal {
    fn new<I, P>(targets: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut remaining: Vec<PathBuf> = Vec::new();
        for t in targets {
            let t = t.into();
            if !remaining.contains(&t) {
                remaining.push(t);
            }
        }
        Self {
            remaining,
            doomed: Vec::new(),
            visited: 0,
        }
    }

    fn done(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Consume `path` if it is a target. Targets nested under it go too:
    /// deleting the folder deletes them.
    fn take(&mut self, path: &Path) -> bool {
        if !self.remaining.iter().any(|t| t == path) {
            return false;
        }
        self.remaining.retain(|t| !t.starts_with(path));
        true
    }

    fn any_within(&self, dir: &Path) -> bool {
        self.remaining.iter().any(|t| t.starts_with(dir))
    }
}

/// One depth-first pass over `folder`. `None` means nothing below changed
/// and the caller keeps the existing `Arc`.
fn prune(folder: &FolderNode, removal: &mut Removal) -> Option<FolderNode> {
    let children = folder.children();
    let mut kept: Option<Vec<Arc<Node>>> = None;
    let mut scanned = 0;

    while scanned < children.len() && !removal.done() {
        let child = &children[scanned];
        removal.visited += 1;

        if removal.take(child.path()) {
            removal
                .doomed
                .push((child.path().to_path_buf(), child.kind()));
            kept.get_or_insert_with(|| children[..scanned].to_vec());
        } else {
            let replaced = match child.as_ref() {
                Node::Folder(sub) if removal.any_within(sub.path()) => prune(sub, removal),
                _ => None,
            };
            match replaced {
                Some(sub) => kept
                    .get_or_insert_with(|| children[..scanned].to_vec())
                    .push(sub.into()),
                None => {
                    if let Some(k) = kept.as_mut() {
                        k.push(child.clone());
                    }
                }
            }
        }
        scanned += 1;
    }

    let mut kept = kept?;
    kept.extend(children[scanned..].iter().cloned());
    Some(folder.rebuilt(kept))
}

fn delete_entry(path: &Path, kind: NodeKind) -> io::Result<()> {
    let res = match kind {
        NodeKind::Folder => fs::remove_dir_all(path),
        NodeKind::File => fs::remove_file(path),
    };
    match res {
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "already gone from disk");
            Ok(())
        }
        other => other,
    }
}

/// Remove every node whose path is in `targets` from the tree below
/// `folder` and delete the matching entries from disk.
///
/// Targets are consumed by a single traversal that stops as soon as all of
/// them have been found. Targets that match nothing are ignored. Folders are
/// deleted recursively.
///
/// If a delete fails, the call returns `DeleteFailed` and no new snapshot;
/// the error lists what this call had already deleted.
pub fn remove<I, P>(folder: &FolderNode, targets: I) -> Result<FolderNode>
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    apply(folder, Removal::new(targets)).map(|(next, _)| next)
}

fn apply(folder: &FolderNode, mut removal: Removal) -> Result<(FolderNode, Removal)> {
    if removal.remaining.iter().any(|t| t == folder.path()) {
        return Err(LibraryError::invalid(
            folder.path(),
            "cannot remove the folder being mutated",
        ));
    }

    let next = prune(folder, &mut removal).unwrap_or_else(|| folder.clone());
    if !removal.remaining.is_empty() {
        debug!(unmatched = ?removal.remaining, "remove targets not in tree");
    }

    let mut deleted: Vec<PathBuf> = Vec::with_capacity(removal.doomed.len());
    for (path, kind) in &removal.doomed {
        if let Err(source) = delete_entry(path, *kind) {
            warn!(path = %path.display(), error = %source, "delete failed");
            return Err(LibraryError::DeleteFailed {
                path: path.clone(),
                source,
                deleted,
            });
        }
        info!(path = %path.display(), ?kind, "deleted");
        deleted.push(path.clone());
    }

    Ok((next, removal))
}
