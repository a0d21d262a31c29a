//! Hand-drawn digit pad: a raster with bounded undo/redo, a feathered radial
//! brush, and an edit session that re-classifies the drawing after each edit.
//!
//! The window binary (`src/main.rs`) is thin glue around [`session::EditSession`].

pub mod classifier;
pub mod config;
pub mod draw;
pub mod error;
pub mod history;
pub mod session;
pub mod stroke;
pub mod types;

pub use classifier::Classifier;
pub use error::{Error, Result};
pub use history::HistoryBuffer;
pub use session::EditSession;
pub use types::Raster;
