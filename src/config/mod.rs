// src/config/mod.rs

//! Settings model, loading and validation.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_from_path, load_settings};
pub use model::{RawSettings, Settings};
