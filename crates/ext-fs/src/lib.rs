//! Filesystem primitives for the extension manager.
//!
//! Provides normalized paths, atomic writes and format-agnostic config
//! loading used by the manifest scanner and the enabled-set store.

pub mod config;
pub mod error;
pub mod io;
pub mod path;

pub use config::{ConfigStore, Format};
pub use error::{Error, Result};
pub use path::NormalizedPath;
