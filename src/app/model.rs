//! Application model types: `App`, `Row` and `Notice`.
//!
//! The `App` struct holds the current tree snapshot plus cursor, marks,
//! folding and the upload prompt. Every mutation goes through the library
//! operations and swaps in the snapshot they return.

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::audio::{PlaybackHandle, PlaybackInfo};
use crate::config::Settings;
use crate::error::LibraryError;
use crate::library::{FolderNode, Library, Node, NodeKind, Scan, add_to, remove};
use crate::picker::{PathPrompt, PickerRequest, Submit};

/// One visible line of the tree view.
#[derive(Debug, Clone)]
pub struct Row {
    pub depth: usize,
    pub node: Arc<Node>,
    /// Folder rows only: whether its children are shown below it.
    pub open: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

/// The main application model.
pub struct App {
    pub library: Library,
    pub root: FolderNode,
    pub selected: usize,
    pub marked: BTreeSet<PathBuf>,
    pub notices: VecDeque<Notice>,
    pub prompt: Option<PathPrompt>,
    pub confirm_delete: bool,
    pub playback_handle: Option<PlaybackHandle>,

    picker: PickerRequest,
    expand_folders: bool,
    // Folders whose open/closed state differs from `expand_folders`.
    toggled: HashSet<PathBuf>,
    notice_limit: usize,
}

impl App {
    /// Create a new `App` around an initial scan of `library`.
    pub fn new(library: Library, scan: Scan, settings: &Settings) -> Self {
        let mut app = Self {
            library,
            root: scan.root,
            selected: 0,
            marked: BTreeSet::new(),
            notices: VecDeque::new(),
            prompt: None,
            confirm_delete: false,
            playback_handle: None,
            picker: PickerRequest::from(&settings.picker),
            expand_folders: settings.ui.expand_folders,
            toggled: HashSet::new(),
            notice_limit: settings.ui.notice_lines.max(1),
        };
        app.report_skipped(&scan.warnings);
        app
    }

    /// Attach a `PlaybackHandle` used to observe playback progress.
    pub fn set_playback_handle(&mut self, h: PlaybackHandle) {
        self.playback_handle = Some(h);
    }

    pub fn playback(&self) -> Option<PlaybackInfo> {
        self.playback_handle
            .as_ref()
            .and_then(|h| h.lock().ok().map(|info| info.clone()))
    }

    pub fn notify(&mut self, level: NoticeLevel, text: impl Into<String>) {
        self.notices.push_back(Notice {
            level,
            text: text.into(),
        });
        while self.notices.len() > self.notice_limit {
            self.notices.pop_front();
        }
    }

    fn report_skipped(&mut self, warnings: &[LibraryError]) {
        for w in warnings {
            self.notify(NoticeLevel::Warn, format!("skipped: {w}"));
        }
    }

    // --- tree view -------------------------------------------------------

    fn is_open(&self, path: &Path) -> bool {
        self.expand_folders != self.toggled.contains(path)
    }

    /// The visible rows, depth first, honoring folded folders.
    pub fn rows(&self) -> Vec<Row> {
        let mut out = Vec::new();
        self.push_rows(&self.root, 0, &mut out);
        out
    }

    fn push_rows(&self, folder: &FolderNode, depth: usize, out: &mut Vec<Row>) {
        for child in folder.children() {
            let sub = child.as_folder();
            let open = sub.is_some() && self.is_open(child.path());
            out.push(Row {
                depth,
                node: child.clone(),
                open,
            });
            if let (true, Some(sub)) = (open, sub) {
                self.push_rows(sub, depth + 1, out);
            }
        }
    }

    pub fn selected_node(&self) -> Option<Arc<Node>> {
        self.rows().into_iter().nth(self.selected).map(|r| r.node)
    }

    pub fn next(&mut self) {
        let len = self.rows().len();
        if len > 0 {
            self.selected = (self.selected + 1).min(len - 1);
        }
    }

    pub fn prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.rows().len().saturating_sub(1);
    }

    /// Put the cursor on `path` if it is visible, else keep it in range.
    fn reselect(&mut self, path: Option<&Path>) {
        let rows = self.rows();
        if let Some(pos) = path.and_then(|p| rows.iter().position(|r| r.node.path() == p)) {
            self.selected = pos;
        } else {
            self.selected = self.selected.min(rows.len().saturating_sub(1));
        }
    }

    /// Fold or unfold the folder under the cursor.
    pub fn toggle_fold(&mut self) {
        let Some(node) = self.selected_node() else {
            return;
        };
        if node.kind() != NodeKind::Folder {
            return;
        }
        let path = node.path().to_path_buf();
        if !self.toggled.remove(&path) {
            self.toggled.insert(path);
        }
    }

    pub fn toggle_mark(&mut self) {
        let Some(node) = self.selected_node() else {
            return;
        };
        let path = node.path().to_path_buf();
        if !self.marked.remove(&path) {
            self.marked.insert(path);
        }
    }

    // --- playback --------------------------------------------------------

    /// Path to hand to the audio transport. Only files can be played.
    pub fn play_target(&self) -> Result<PathBuf, LibraryError> {
        match self.selected_node() {
            Some(node) if node.kind() == NodeKind::File => Ok(node.path().to_path_buf()),
            Some(node) => Err(LibraryError::invalid(node.path(), "cannot play a folder")),
            None => Err(LibraryError::invalid(self.library.dir(), "nothing selected")),
        }
    }

    // --- mutations -------------------------------------------------------

    /// Rebuild the snapshot from disk.
    pub fn refresh(&mut self) {
        let keep = self.selected_node().map(|n| n.path().to_path_buf());
        match self.library.scan() {
            Ok(scan) => {
                self.root = scan.root;
                self.report_skipped(&scan.warnings);
                self.prune_marks();
                self.reselect(keep.as_deref());
                info!(nodes = self.root.descendant_count(), "library rebuilt");
            }
            Err(e) => {
                warn!(error = %e, "library rebuild failed");
                self.notify(NoticeLevel::Error, format!("rebuild failed: {e}"));
            }
        }
    }

    fn prune_marks(&mut self) {
        let root = &self.root;
        self.marked.retain(|p| root.find(p).is_some());
    }

    /// Marked paths, or the node under the cursor when nothing is marked.
    pub fn delete_targets(&self) -> Vec<PathBuf> {
        if !self.marked.is_empty() {
            return self.marked.iter().cloned().collect();
        }
        self.selected_node()
            .map(|n| vec![n.path().to_path_buf()])
            .unwrap_or_default()
    }

    /// Delete the delete targets from the tree and from disk.
    pub fn delete(&mut self) {
        self.confirm_delete = false;
        let targets = self.delete_targets();
        if targets.is_empty() {
            return;
        }

        match remove(&self.root, &targets) {
            Ok(next) => {
                let removed = self
                    .root
                    .descendant_count()
                    .saturating_sub(next.descendant_count());
                self.root = next;
                self.marked.clear();
                self.reselect(None);
                self.notify(NoticeLevel::Info, format!("deleted {removed} item(s)"));
            }
            Err(e @ LibraryError::DeleteFailed { .. }) => {
                self.notify(NoticeLevel::Error, e.to_string());
                // Some entries may already be gone; the disk is the truth.
                self.refresh();
            }
            Err(e) => self.notify(NoticeLevel::Error, e.to_string()),
        }
    }

    /// Folder that uploads land in: the folder under the cursor, the folder
    /// holding the file under the cursor, or the library root.
    pub fn upload_destination(&self) -> PathBuf {
        match self.selected_node() {
            Some(node) if node.kind() == NodeKind::Folder => node.path().to_path_buf(),
            Some(node) => node
                .path()
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| self.root.path().to_path_buf()),
            None => self.root.path().to_path_buf(),
        }
    }

    /// Copy `sources` into the library and add what succeeded to the tree.
    /// Each rejected source becomes its own notice.
    pub fn upload(&mut self, sources: Vec<PathBuf>) {
        if sources.is_empty() {
            return;
        }
        let destination = self.upload_destination();
        let report = match self.library.ingest(&sources, &destination) {
            Ok(r) => r,
            Err(e) => {
                self.notify(NoticeLevel::Error, format!("upload failed: {e}"));
                return;
            }
        };

        let (resolved, rejected) = report.into_parts();
        let count = resolved.len();
        let mut stale = rejected.iter().any(|r| left_partial_copy(&r.error));
        match add_to(&self.root, &destination, resolved) {
            Ok(next) => self.root = next,
            Err(e) => {
                self.notify(NoticeLevel::Error, e.to_string());
                stale = true;
            }
        }
        if count > 0 {
            self.notify(NoticeLevel::Info, format!("uploaded {count} item(s)"));
        }
        for r in rejected {
            self.notify(
                NoticeLevel::Error,
                format!("not uploaded {}: {}", r.source.display(), r.error),
            );
        }
        if stale {
            self.refresh();
        }
    }

    // --- upload prompt ---------------------------------------------------

    pub fn open_prompt(&mut self) {
        self.prompt = Some(PathPrompt::new(self.picker.clone()));
    }

    pub fn cancel_prompt(&mut self) {
        self.prompt = None;
    }

    /// Submit the prompt's current line; uploads once the selection is done.
    pub fn submit_prompt_line(&mut self) {
        let Some(prompt) = self.prompt.as_mut() else {
            return;
        };
        if prompt.submit_line() == Submit::Done {
            if let Some(prompt) = self.prompt.take() {
                self.upload(prompt.finish());
            }
        }
    }
}

/// A copy that failed after creating its target leaves an entry on disk the
/// snapshot does not know about.
fn left_partial_copy(error: &LibraryError) -> bool {
    match error {
        LibraryError::CopyFailed { to, source, .. } => {
            source.kind() != io::ErrorKind::AlreadyExists && fs::symlink_metadata(to).is_ok()
        }
        _ => false,
    }
}
