//! World coordinate handling
//!
//! This module provides the linear WCS frame of an image HDU and the
//! distortion terms that may accompany it.

pub mod frame;
pub mod distortion;

// Re-export key types
pub use self::frame::CoordinateFrame;
pub use self::distortion::Distortion;
