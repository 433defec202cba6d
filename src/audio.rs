//! Audio transport: plays one library file at a time on a background thread.
//!
//! The app hands the player a path; the player resolves the MIME type from
//! the extension, decodes the file with `rodio` and publishes its state
//! through a shared [`PlaybackHandle`].

mod mime;
mod player;
mod sink;
mod thread;
mod types;

pub use mime::mime_for;
pub use player::AudioPlayer;
pub use types::{AudioCmd, PlaybackHandle, PlaybackInfo, PlaybackStatus};
