//! Rasterisation of renderables
//!
//! This module contains:
//! - Geometry shared by the tools that build primitives
//! - Image rendering using tiny-skia (flattening for export)
//! - Block pixelation used by blur regions
//! - Font lookup and text drawing

pub mod geometry;
pub mod image;
pub mod pixelate;
pub mod text;
