//! Tree snapshot types: `Node`, `FileNode` and `FolderNode`.
//!
//! A snapshot is never mutated once handed out. Folders hold their children
//! behind `Arc`, so deriving a new snapshot copies handles, not subtrees.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Folder,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    File(FileNode),
    Folder(FolderNode),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    path: PathBuf,
    name: String,
}

/// A folder snapshot: ordered children plus an identity index over them.
///
/// `index` always holds exactly the members of `children`, keyed by path,
/// pointing at the same `Arc`.
#[derive(Debug, Clone)]
pub struct FolderNode {
    path: PathBuf,
    name: String,
    children: Vec<Arc<Node>>,
    index: HashMap<PathBuf, Arc<Node>>,
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl FileNode {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = display_name(&path);
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl FolderNode {
    /// An empty folder at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_children(path, Vec::<Arc<Node>>::new())
    }

    /// A folder holding `children` in the given order. Later duplicates of an
    /// id already present are dropped.
    pub fn with_children<I>(path: impl Into<PathBuf>, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Arc<Node>>,
    {
        let path = path.into();
        let name = display_name(&path);
        let mut folder = Self {
            path,
            name,
            children: Vec::new(),
            index: HashMap::new(),
        };
        for child in children {
            folder.push_unique(child.into());
        }
        folder
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn children(&self) -> &[Arc<Node>] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Direct child with identity `id`.
    pub fn get(&self, id: &Path) -> Option<&Arc<Node>> {
        self.index.get(id)
    }

    pub fn contains(&self, id: &Path) -> bool {
        self.index.contains_key(id)
    }

    /// Node at `path` anywhere below this folder, following the spine of
    /// ancestor folders instead of scanning every subtree.
    pub fn find(&self, path: &Path) -> Option<&Arc<Node>> {
        if let Some(hit) = self.index.get(path) {
            return Some(hit);
        }
        self.children.iter().find_map(|child| match child.as_ref() {
            Node::Folder(sub) if path.starts_with(&sub.path) => sub.find(path),
            _ => None,
        })
    }

    /// Total number of nodes below this folder.
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|c| match c.as_ref() {
                Node::Folder(sub) => 1 + sub.descendant_count(),
                Node::File(_) => 1,
            })
            .sum()
    }

    /// Append `child` unless its id is already indexed. Only used while a
    /// folder value is still private to its builder.
    pub(super) fn push_unique(&mut self, child: Arc<Node>) -> bool {
        if self.index.contains_key(child.path()) {
            return false;
        }
        self.index.insert(child.path().to_path_buf(), child.clone());
        self.children.push(child);
        true
    }

    /// Same folder identity with `children` as its new child list.
    pub(super) fn rebuilt(&self, children: Vec<Arc<Node>>) -> Self {
        let index = children
            .iter()
            .map(|c| (c.path().to_path_buf(), c.clone()))
            .collect();
        Self {
            path: self.path.clone(),
            name: self.name.clone(),
            children,
            index,
        }
    }
}

impl PartialEq for FolderNode {
    // The index is derived from `children`; comparing it again adds nothing.
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.children == other.children
    }
}

impl Node {
    /// Stable identity: the path the node was created with.
    pub fn id(&self) -> &Path {
        self.path()
    }

    pub fn path(&self) -> &Path {
        match self {
            Node::File(f) => f.path(),
            Node::Folder(f) => f.path(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Node::File(f) => f.name(),
            Node::Folder(f) => f.name(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::File(_) => NodeKind::File,
            Node::Folder(_) => NodeKind::Folder,
        }
    }

    pub fn as_folder(&self) -> Option<&FolderNode> {
        match self {
            Node::Folder(f) => Some(f),
            Node::File(_) => None,
        }
    }

    /// Children of a folder; files have none.
    pub fn children(&self) -> &[Arc<Node>] {
        match self {
            Node::Folder(f) => f.children(),
            Node::File(_) => &[],
        }
    }
}

impl From<FileNode> for Node {
    fn from(f: FileNode) -> Self {
        Node::File(f)
    }
}

impl From<FolderNode> for Node {
    fn from(f: FolderNode) -> Self {
        Node::Folder(f)
    }
}

impl From<FileNode> for Arc<Node> {
    fn from(f: FileNode) -> Self {
        Arc::new(Node::File(f))
    }
}

impl From<FolderNode> for Arc<Node> {
    fn from(f: FolderNode) -> Self {
        Arc::new(Node::Folder(f))
    }
}
