use super::load::{default_config_path, default_log_dir, resolve_config_path};
use super::schema::*;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct EnvGuard {
    key: &'static str,
    old: Option<std::ffi::OsString>,
}

impl EnvGuard {
    fn set(key: &'static str, val: &str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::set_var(key, val);
        }
        Self { key, old }
    }

    fn remove(key: &'static str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.old.take() {
            Some(v) => unsafe {
                std::env::set_var(self.key, v);
            },
            None => unsafe {
                std::env::remove_var(self.key);
            },
        }
    }
}

#[test]
fn resolve_config_path_prefers_tunetree_config_path() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("TUNETREE_CONFIG_PATH", "/tmp/tunetree-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        PathBuf::from("/tmp/tunetree-test-config.toml")
    );
}

#[test]
fn default_config_path_prefers_xdg_config_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    assert_eq!(
        default_config_path().unwrap(),
        PathBuf::from("/tmp/xdg-config-home")
            .join("tunetree")
            .join("config.toml")
    );
}

#[test]
fn default_paths_fall_back_to_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_CONFIG_HOME");
    let _g2 = EnvGuard::remove("XDG_STATE_HOME");
    let _g3 = EnvGuard::set("HOME", "/tmp/home-dir");

    assert_eq!(
        default_config_path().unwrap(),
        PathBuf::from("/tmp/home-dir/.config/tunetree/config.toml")
    );
    assert_eq!(
        default_log_dir().unwrap(),
        PathBuf::from("/tmp/home-dir/.local/state/tunetree")
    );
}

#[test]
fn picker_defaults_select_mp3_songs() {
    let s = Settings::default();
    assert_eq!(s.library.dir, PathBuf::from("music"));
    assert_eq!(s.picker.title, "Select Music");
    assert_eq!(s.picker.button_label, "Save Songs");
    assert_eq!(s.picker.extensions, vec!["mp3".to_string()]);
    assert!(s.picker.multi_select);
    assert!(s.validate().is_ok());
}

#[test]
fn settings_load_from_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[library]
dir = "/srv/music"
include_hidden = false
create_missing = false

[picker]
title = "Pick"
button_label = "Copy"
extensions = ["mp3", "flac"]
multi_select = false

[ui]
header_text = "hello"
expand_folders = false
notice_lines = 9

[audio]
volume = 0.5

[logging]
dir = "/tmp/tunetree-logs"
level = "debug"
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("TUNETREE_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("TUNETREE__AUDIO__VOLUME");

    let s = Settings::load().unwrap();
    assert_eq!(s.library.dir, PathBuf::from("/srv/music"));
    assert!(!s.library.include_hidden);
    assert!(!s.library.create_missing);
    assert_eq!(s.picker.title, "Pick");
    assert_eq!(s.picker.button_label, "Copy");
    assert_eq!(s.picker.extensions, vec!["mp3".to_string(), "flac".to_string()]);
    assert!(!s.picker.multi_select);
    assert_eq!(s.ui.header_text, "hello");
    assert!(!s.ui.expand_folders);
    assert_eq!(s.ui.notice_lines, 9);
    assert_eq!(s.audio.volume, 0.5);
    assert_eq!(s.logging.dir, Some(PathBuf::from("/tmp/tunetree-logs")));
    assert_eq!(s.logging.level, "debug");
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[audio]
volume = 0.8
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("TUNETREE_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::set("TUNETREE__AUDIO__VOLUME", "0.25");

    let s = Settings::load().unwrap();
    assert_eq!(s.audio.volume, 0.25);
}

#[test]
fn validate_rejects_out_of_range_volume_and_empty_dir() {
    let mut s = Settings::default();
    s.audio.volume = 1.5;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.library.dir = PathBuf::new();
    assert!(s.validate().is_err());
}
