//! Pixel extraction from N-dimensional arrays
//!
//! This module provides the array abstraction shared by in-memory data and
//! on-disk data units, the resolution of requests into clipped regions and
//! the engine that cuts a region and adjusts its coordinate frame.

pub mod array;
pub mod region;
mod engine;

// Public exports
pub use array::{ArraySource, NdArray};
pub use region::PixelRegion;
pub use engine::{CutoutResult, ExtractionEngine};
