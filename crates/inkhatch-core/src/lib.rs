//! # InkHatch Core
//!
//! Core types and utilities shared by the InkHatch crates.
//! Provides the raster input model, plane geometry, pixel/millimeter
//! unit conversion, the colour channel model and the shared error type.

pub mod data;
pub mod error;
pub mod geometry;
pub mod types;
pub mod units;

pub use data::{Canvas, Channel, RasterImage};

pub use error::{Error, GeometryError, ImageError, Result};

pub use geometry::Point;

// Re-export type aliases for convenience
pub use types::{thread_safe, thread_safe_rw, ProgressCallback, ThreadSafe, ThreadSafeRw};

pub use units::{mm_to_px, px_to_mm, PX_PER_MM};
