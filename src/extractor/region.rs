//! Resolution of a cutout request against an array
//!
//! Requests are written in FITS axis order (NAXIS1 first) while data is
//! stored with NAXIS1 varying fastest, i.e. last. `PixelRegion::from_request`
//! is the one place where that reversal happens; everything downstream of it
//! works in storage order, except the per-axis origins that the coordinate
//! frame needs in FITS order.

use crate::cutout::request::AxisRange;
use crate::fits::errors::{FitsError, FitsResult};

/// A request resolved against a concrete array shape
///
/// Start, shape and flip flags are in storage order and already clipped to
/// the array bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelRegion {
    /// 0-based first element per storage axis
    pub start: Vec<usize>,
    /// Extent per storage axis
    pub shape: Vec<usize>,
    /// Storage axes whose range was written backwards
    pub flipped: Vec<bool>,
    /// For each axis the request named (FITS order), the 1-based source pixel
    /// that becomes pixel 1 of the cutout
    pub origins: Vec<i64>,
}

impl PixelRegion {
    /// Resolve per-axis ranges against a storage-order source shape
    ///
    /// Ranges are right-aligned against the storage axes: the request names
    /// NAXIS1..NAXISk, and the remaining higher axes (the leading storage
    /// axes) are taken whole from their first element. Ranges that run past
    /// the array are clipped to the overlap, never padded.
    ///
    /// # Arguments
    /// * `ranges` - Ranges in FITS order, 1-based inclusive
    /// * `source_shape` - Shape of the source array in storage order
    ///
    /// # Returns
    /// The clipped region, `InvalidShape` when the request names more axes
    /// than the array has, or `NoOverlap` when any axis misses the array
    pub fn from_request(ranges: &[AxisRange], source_shape: &[usize]) -> FitsResult<PixelRegion> {
        let rank = source_shape.len();
        if ranges.len() > rank {
            return Err(FitsError::InvalidShape(format!(
                "tried to extract {} axes from an array of shape {:?}",
                ranges.len(),
                source_shape
            )));
        }

        let mut start = vec![0usize; rank];
        let mut shape = source_shape.to_vec();
        let mut flipped = vec![false; rank];
        let mut origins = Vec::with_capacity(ranges.len());

        for (axis, range) in ranges.iter().enumerate() {
            let storage = storage_axis(rank, axis);
            let len = source_shape[storage] as i64;

            let (lo, hi) = match *range {
                AxisRange::All => (1, len),
                AxisRange::Span { start, end } => (start.min(end), start.max(end)),
            };

            let lo = lo.max(1);
            let hi = hi.min(len);
            if lo > hi {
                return Err(FitsError::NoOverlap);
            }

            start[storage] = (lo - 1) as usize;
            shape[storage] = (hi - lo + 1) as usize;
            flipped[storage] = range.is_inverted();
            origins.push(if range.is_inverted() { hi } else { lo });
        }

        Ok(PixelRegion {
            start,
            shape,
            flipped,
            origins,
        })
    }

    /// Whether any axis is flipped
    pub fn has_flips(&self) -> bool {
        self.flipped.iter().any(|&f| f)
    }
}

/// Storage axis holding a given FITS axis (0-based, NAXIS1 = 0)
pub fn storage_axis(rank: usize, fits_axis: usize) -> usize {
    rank - 1 - fits_axis
}
