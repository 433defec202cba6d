use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::debug;

use crate::app::{App, NoticeLevel};
use crate::audio::{AudioCmd, AudioPlayer};
use crate::config;
use crate::library::NodeKind;
use crate::ui;

/// State tracked by the runtime event loop across iterations.
#[derive(Debug, Default)]
pub struct EventLoopState {
    /// Internal two-key prefix state used for `gg` handling.
    pub pending_gg: bool,
}

/// Main terminal event loop: handles input and UI drawing.
/// Returns `Ok(())` when shutdown is requested.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    audio_player: &AudioPlayer,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        let rows = app.rows();
        terminal.draw(|f| ui::draw(f, app, &rows, &settings.ui))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, app, audio_player, state) {
                    break;
                }
            }
        }
    }

    Ok(())
}

fn handle_prompt_key(key: KeyEvent, app: &mut App) {
    match key.code {
        KeyCode::Esc => app.cancel_prompt(),
        KeyCode::Enter => app.submit_prompt_line(),
        KeyCode::Backspace => {
            if let Some(p) = app.prompt.as_mut() {
                p.pop_char();
            }
        }
        KeyCode::Char(c) if !c.is_control() => {
            if let Some(p) = app.prompt.as_mut() {
                p.push_char(c);
            }
        }
        _ => {}
    }
}

fn play_selected(app: &mut App, audio_player: &AudioPlayer) {
    match app.play_target() {
        Ok(path) => {
            debug!(path = %path.display(), "play requested");
            let _ = audio_player.send(AudioCmd::Play(path));
        }
        Err(e) => app.notify(NoticeLevel::Error, e.to_string()),
    }
}

/// Returns `true` when the app should quit.
fn handle_key_event(
    key: KeyEvent,
    app: &mut App,
    audio_player: &AudioPlayer,
    state: &mut EventLoopState,
) -> bool {
    if app.prompt.is_some() {
        state.pending_gg = false;
        handle_prompt_key(key, app);
        return false;
    }

    if app.confirm_delete {
        state.pending_gg = false;
        if key.code == KeyCode::Char('y') {
            // Release the transport's handle before its file disappears.
            let playing = app.playback().and_then(|info| info.path);
            if let Some(playing) = playing {
                if app.delete_targets().iter().any(|t| playing.starts_with(t)) {
                    let _ = audio_player.send(AudioCmd::Stop);
                }
            }
            app.delete();
        } else {
            app.confirm_delete = false;
        }
        return false;
    }

    match key.code {
        KeyCode::Char('q') => {
            return true;
        }
        KeyCode::Char('g') => {
            if state.pending_gg {
                state.pending_gg = false;
                app.select_first();
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => {
            state.pending_gg = false;
            app.select_last();
        }
        KeyCode::Char('j') | KeyCode::Down => {
            state.pending_gg = false;
            app.next();
        }
        KeyCode::Char('k') | KeyCode::Up => {
            state.pending_gg = false;
            app.prev();
        }
        KeyCode::Enter => {
            state.pending_gg = false;
            match app.selected_node().map(|n| n.kind()) {
                Some(NodeKind::Folder) => app.toggle_fold(),
                Some(NodeKind::File) => play_selected(app, audio_player),
                None => {}
            }
        }
        KeyCode::Char(' ') => {
            state.pending_gg = false;
            app.toggle_mark();
            app.next();
        }
        KeyCode::Char('d') => {
            state.pending_gg = false;
            if !app.delete_targets().is_empty() {
                app.confirm_delete = true;
            }
        }
        KeyCode::Char('u') => {
            state.pending_gg = false;
            app.open_prompt();
        }
        KeyCode::Char('r') => {
            state.pending_gg = false;
            app.refresh();
        }
        KeyCode::Char('p') => {
            state.pending_gg = false;
            let _ = audio_player.send(AudioCmd::TogglePause);
        }
        KeyCode::Char('s') => {
            state.pending_gg = false;
            let _ = audio_player.send(AudioCmd::Stop);
        }
        KeyCode::Char(_) => {
            // g pending should clear on any other printable char
            state.pending_gg = false;
        }
        _ => {}
    }

    false
}
