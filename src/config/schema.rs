use std::path::PathBuf;

use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/tunetree/config.toml` or `~/.config/tunetree/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `TUNETREE__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub library: LibrarySettings,
    pub picker: PickerSettings,
    pub ui: UiSettings,
    pub audio: AudioSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// The managed library directory. The first CLI argument overrides it.
    pub dir: PathBuf,
    /// Whether to include hidden files/directories (dotfiles) in the tree.
    pub include_hidden: bool,
    /// Create the library directory on startup when it does not exist.
    pub create_missing: bool,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("music"),
            include_hidden: true,
            create_missing: true,
        }
    }
}

/// What the upload prompt asks for.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PickerSettings {
    pub title: String,
    pub button_label: String,
    /// File extensions accepted for upload (case-insensitive, without dot).
    /// Directories are always accepted.
    pub extensions: Vec<String>,
    /// Accept more than one path per upload.
    pub multi_select: bool,
}

impl Default for PickerSettings {
    fn default() -> Self {
        Self {
            title: "Select Music".to_string(),
            button_label: "Save Songs".to_string(),
            extensions: vec!["mp3".into()],
            multi_select: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// The text rendered inside the top header box.
    pub header_text: String,
    /// Whether folders start expanded.
    pub expand_folders: bool,
    /// How many recent notices the notice pane keeps.
    pub notice_lines: usize,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " ~ your music, as it is on disk ~ ".to_string(),
            expand_folders: true,
            notice_lines: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Playback volume, `0.0` to `1.0`.
    pub volume: f32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self { volume: 1.0 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Directory for the rolling log file. Defaults to the XDG state dir.
    pub dir: Option<PathBuf>,
    /// Filter directive used when `TUNETREE_LOG` is unset, e.g. `info` or
    /// `tunetree=debug`.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            dir: None,
            level: "info".to_string(),
        }
    }
}
