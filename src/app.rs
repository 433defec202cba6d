//! Application module: exposes the app model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model` and holds the current tree
//! snapshot, cursor, marks and notices.

mod model;

pub use model::*;
