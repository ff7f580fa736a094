//! Annotation editor core for screenshot markup
//!
//! This crate contains:
//! - The annotation data model and geometry helpers (`domain`)
//! - Drawing tools behind a shared press/move/release protocol (`tools`)
//! - Undo/redo history (`history`)
//! - The render surface abstraction and its diff-based sync (`scene`)
//! - Rasterisation and export effects (`render`, `export`)
//! - The editor session tying everything together (`editor`)

pub mod assets;
pub mod collab;
pub mod config;
pub mod domain;
pub mod editor;
pub mod error;
pub mod export;
pub mod history;
pub mod image_ops;
pub mod render;
pub mod scene;
pub mod session;
pub mod tools;

pub use domain::{Annotation, AnnotationId, AnnotationKind, AnnotationShape, Point};
pub use editor::Editor;
pub use error::EditorError;
