//! PaintLite — open an image, sketch on it, turn it gray, save it.
//!
//! The editing logic (`session`, `actions`, `ops`) is independent of the GUI;
//! `app` wires it to eframe and `cli` runs the same actions headless.

pub mod actions;
pub mod app;
pub mod canvas;
pub mod cli;
pub mod display;
pub mod error;
pub mod io;
pub mod logger;
pub mod ops;
pub mod session;
pub mod settings;

pub use error::EditorError;
pub use session::{EditSession, PointerSample, Redraw};
