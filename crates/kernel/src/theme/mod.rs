//! Theme engine and template rendering.
//!
//! Provides Tera-based template rendering with layout suggestion resolution.

mod engine;

pub use engine::{SharedThemeEngine, ThemeEngine};
