//! Terminal stand-in for a native "choose files" dialog.
//!
//! The prompt collects one path per line. An empty line confirms and `Esc`
//! cancels; both a cancel and an empty confirmation yield no paths, and the
//! app treats them the same.

use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::PickerSettings;
use crate::library::{NodeKind, probe};

/// The dialog configuration: title, button label, allowed extensions and
/// whether several paths may be chosen.
#[derive(Debug, Clone)]
pub struct PickerRequest {
    pub title: String,
    pub button_label: String,
    pub extensions: Vec<String>,
    pub multi_select: bool,
}

impl From<&PickerSettings> for PickerRequest {
    fn from(s: &PickerSettings) -> Self {
        Self {
            title: s.title.clone(),
            button_label: s.button_label.clone(),
            extensions: s
                .extensions
                .iter()
                .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
            multi_select: s.multi_select,
        }
    }
}

impl PickerRequest {
    /// Directories are always allowed; files need an allowed extension.
    /// An empty extension list allows everything.
    pub fn accepts(&self, path: &Path) -> bool {
        if self.extensions.is_empty() || probe(path) == Some(NodeKind::Folder) {
            return true;
        }
        path.extension()
            .and_then(|s| s.to_str())
            .map(|ext| {
                let ext = ext.to_ascii_lowercase();
                self.extensions.iter().any(|e| e == &ext)
            })
            .unwrap_or(false)
    }
}

/// What a line submission did to the prompt.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Submit {
    /// The line was recorded; keep prompting.
    Continue,
    /// The selection is complete.
    Done,
}

/// In-progress path selection.
#[derive(Debug, Clone)]
pub struct PathPrompt {
    pub request: PickerRequest,
    pub input: String,
    pub entries: Vec<PathBuf>,
}

impl PathPrompt {
    pub fn new(request: PickerRequest) -> Self {
        Self {
            request,
            input: String::new(),
            entries: Vec::new(),
        }
    }

    pub fn push_char(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn pop_char(&mut self) {
        self.input.pop();
    }

    /// Record the current line. An empty line, or any line when only one
    /// path may be chosen, completes the selection.
    pub fn submit_line(&mut self) -> Submit {
        let line = std::mem::take(&mut self.input);
        let line = line.trim();
        if line.is_empty() {
            return Submit::Done;
        }
        self.entries.push(absolutize(&expand_home(line)));
        if self.request.multi_select {
            Submit::Continue
        } else {
            Submit::Done
        }
    }

    /// The chosen absolute paths in entry order, without duplicates or files
    /// the request does not allow.
    pub fn finish(self) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        let mut chosen = Vec::new();
        for p in self.entries {
            if !seen.insert(p.clone()) {
                continue;
            }
            if self.request.accepts(&p) {
                chosen.push(p);
            } else {
                info!(path = %p.display(), "picker: extension not allowed, ignoring");
            }
        }
        chosen
    }
}

fn expand_home(input: &str) -> PathBuf {
    if input == "~" {
        if let Some(home) = env::var_os("HOME") {
            return PathBuf::from(home);
        }
    } else if let Some(rest) = input.strip_prefix("~/") {
        if let Some(home) = env::var_os("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(input)
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}
