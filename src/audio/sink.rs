//! Utilities for creating `rodio` sinks from library files.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rodio::{Decoder, OutputStream, Sink};

use super::mime::mime_for;

/// Create a paused `Sink` for `path` at `volume`.
///
/// Errors are returned as display text for the transport's failed state.
pub(super) fn create_sink(handle: &OutputStream, path: &Path, volume: f32) -> Result<Sink, String> {
    if mime_for(path).is_none() {
        return Err(format!("unsupported file type: {}", path.display()));
    }

    let file = File::open(path).map_err(|e| format!("failed to open {}: {e}", path.display()))?;
    let source = Decoder::new(BufReader::new(file))
        .map_err(|e| format!("failed to decode {}: {e}", path.display()))?;

    let sink = Sink::connect_new(handle.mixer());
    sink.set_volume(volume);
    sink.append(source);
    sink.pause();
    Ok(sink)
}
