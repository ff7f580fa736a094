//! Pure domain types with minimal dependencies
//!
//! This module contains core types used throughout the editor.
//! Types here know nothing about scenes, tools or export.

pub mod annotation;
pub mod geometry;
pub mod settings;
pub mod style;

pub use annotation::*;
pub use geometry::*;
pub use settings::*;
pub use style::*;
