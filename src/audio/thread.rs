use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use rodio::{OutputStreamBuilder, Sink};
use tracing::{debug, error, warn};

use crate::config::AudioSettings;

use super::sink::create_sink;
use super::types::{AudioCmd, PlaybackHandle, PlaybackInfo, PlaybackStatus};

fn publish(playback_info: &PlaybackHandle, update: impl FnOnce(&mut PlaybackInfo)) {
    if let Ok(mut info) = playback_info.lock() {
        update(&mut info);
    }
}

pub(super) fn spawn_audio_thread(
    rx: Receiver<AudioCmd>,
    playback_info: PlaybackHandle,
    audio_settings: AudioSettings,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut stream = match OutputStreamBuilder::open_default_stream() {
            Ok(s) => s,
            Err(e) => {
                error!(error = %e, "no audio output device");
                let reason = format!("no audio output device: {e}");
                // Keep draining commands so senders never block on a dead
                // channel, and report every play request as failed.
                while let Ok(cmd) = rx.recv() {
                    match cmd {
                        AudioCmd::Play(path) => publish(&playback_info, |info| {
                            info.path = Some(path);
                            info.status = PlaybackStatus::Failed(reason.clone());
                        }),
                        AudioCmd::Quit => break,
                        AudioCmd::Stop | AudioCmd::TogglePause => {}
                    }
                }
                return;
            }
        };
        // rodio logs to stderr when OutputStream is dropped. That's useful in debugging,
        // but noisy for a TUI app.
        stream.log_on_drop(false);

        let mut sink: Option<Sink> = None;

        loop {
            match rx.recv_timeout(Duration::from_millis(200)) {
                Ok(AudioCmd::Play(path)) => {
                    // Release the previous handle before opening the next one.
                    if let Some(old) = sink.take() {
                        old.stop();
                    }
                    match create_sink(&stream, &path, audio_settings.volume) {
                        Ok(new_sink) => {
                            new_sink.play();
                            sink = Some(new_sink);
                            debug!(path = %path.display(), "playing");
                            publish(&playback_info, |info| {
                                info.path = Some(path);
                                info.status = PlaybackStatus::Playing;
                                info.elapsed = Duration::ZERO;
                            });
                        }
                        Err(reason) => {
                            warn!(path = %path.display(), %reason, "playback failed");
                            publish(&playback_info, |info| {
                                info.path = Some(path);
                                info.status = PlaybackStatus::Failed(reason);
                                info.elapsed = Duration::ZERO;
                            });
                        }
                    }
                }
                Ok(AudioCmd::Stop) => {
                    if let Some(old) = sink.take() {
                        old.stop();
                    }
                    publish(&playback_info, |info| *info = PlaybackInfo::default());
                }
                Ok(AudioCmd::TogglePause) => {
                    let Some(ref s) = sink else {
                        continue;
                    };
                    let status = if s.is_paused() {
                        s.play();
                        PlaybackStatus::Playing
                    } else {
                        s.pause();
                        PlaybackStatus::Paused
                    };
                    publish(&playback_info, |info| info.status = status);
                }
                Ok(AudioCmd::Quit) | Err(RecvTimeoutError::Disconnected) => {
                    if let Some(old) = sink.take() {
                        old.stop();
                    }
                    publish(&playback_info, |info| *info = PlaybackInfo::default());
                    break;
                }
                Err(RecvTimeoutError::Timeout) => {
                    let Some(ref s) = sink else {
                        continue;
                    };
                    if s.empty() {
                        // Reached the end of the file.
                        sink = None;
                        publish(&playback_info, |info| *info = PlaybackInfo::default());
                    } else {
                        let pos = s.get_pos();
                        publish(&playback_info, |info| info.elapsed = pos);
                    }
                }
            }
        }
    })
}
