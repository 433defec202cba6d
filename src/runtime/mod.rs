use std::env;
use std::path::PathBuf;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::app::App;
use crate::audio::AudioPlayer;
use crate::library::Library;
use crate::logging;

mod event_loop;
mod settings;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (mut settings, config_warning) = settings::load_settings();
    if let Some(dir) = env::args_os().nth(1) {
        settings.library.dir = PathBuf::from(dir);
    }

    let _log_guard = logging::init(&settings.logging)?;
    if let Some(msg) = config_warning {
        warn!("{msg}");
    }

    // Fail before touching the terminal if the library cannot be read at all.
    let library = Library::new(settings.library.dir.clone(), &settings.library);
    let scan = library.scan()?;
    info!(
        dir = %library.dir().display(),
        nodes = scan.root.descendant_count(),
        "library loaded"
    );

    let audio_player = AudioPlayer::new(settings.audio.clone());
    let mut app = App::new(library, scan, &settings);
    app.set_playback_handle(audio_player.playback_handle());

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result: Result<(), Box<dyn std::error::Error>> = (|| {
        let mut state = event_loop::EventLoopState::default();
        event_loop::run(&mut terminal, &settings, &mut app, &audio_player, &mut state)
    })();

    audio_player.shutdown();
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    run_result
}
