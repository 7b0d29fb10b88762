//! Extraction of a pixel cutout from one array
//!
//! The engine resolves a request against the source shape, reads the
//! clipped box, applies any axis flips and moves the coordinate frame so
//! every kept pixel still maps to the same world position.

use log::{debug, warn};

use crate::coordinate::frame::CoordinateFrame;
use crate::cutout::request::PixelCutoutRequest;
use crate::extractor::array::{ArraySource, NdArray};
use crate::extractor::region::PixelRegion;
use crate::fits::errors::{FitsError, FitsResult};
use crate::utils::logger::Logger;

/// Data and adjusted frame of one cutout
#[derive(Debug, Clone, PartialEq)]
pub struct CutoutResult {
    /// Extracted array, storage order
    pub data: NdArray,
    /// Frame of the extracted array; `None` when the source had none
    pub frame: Option<CoordinateFrame>,
}

/// Cuts regions out of arrays
pub struct ExtractionEngine<'a> {
    /// Logger for recording operations
    logger: &'a Logger,
}

impl<'a> ExtractionEngine<'a> {
    /// Create a new engine
    ///
    /// # Arguments
    /// * `logger` - Logger for recording operations
    pub fn new(logger: &'a Logger) -> Self {
        ExtractionEngine { logger }
    }

    /// Extract the region a request names
    ///
    /// Ranges are right-aligned against the array: they name NAXIS1 onwards
    /// and higher axes are kept whole. For every axis the request names,
    /// CRPIX moves by `1 - origin`; an inverted range mirrors the axis
    /// instead. A frame with distortion terms cannot be mirrored.
    ///
    /// # Arguments
    /// * `source` - Array to read from
    /// * `request` - Ranges to cut; its extension selector is not consulted
    /// * `frame` - Coordinate frame of the source, if any
    ///
    /// # Returns
    /// The cutout, `NoOverlap` when the region misses the array, or
    /// `InvalidShape` when the request does not fit the array's rank
    pub fn extract(
        &self,
        source: &mut dyn ArraySource,
        request: &PixelCutoutRequest,
        frame: Option<&CoordinateFrame>,
    ) -> FitsResult<CutoutResult> {
        let source_shape = source.shape().to_vec();
        let region = PixelRegion::from_request(&request.ranges, &source_shape)?;

        if region.has_flips() && frame.map_or(false, CoordinateFrame::has_distortion) {
            warn!("Refusing to flip {} with distortion terms", request);
            return Err(FitsError::InvalidShape(
                "cannot flip an axis of a frame with distortion terms".to_string(),
            ));
        }

        self.logger.debug(&format!(
            "Cutting {} from {:?}: start {:?}, shape {:?}",
            request, source_shape, region.start, region.shape
        ));

        let mut data = source.read_region(&region.start, &region.shape)?;
        for axis in (0..region.flipped.len()).filter(|&k| region.flipped[k]) {
            data = data.flip_axis(axis);
        }

        let frame = frame.map(|f| {
            let mut adjusted = f.clone();
            for (axis, (range, &origin)) in request.ranges.iter().zip(&region.origins).enumerate() {
                if range.is_inverted() {
                    adjusted.flip_axis(axis, origin as f64);
                } else {
                    adjusted.shift_reference_pixel(axis, (1 - origin) as f64);
                }
            }
            adjusted.set_shape(data.fits_shape());
            adjusted
        });

        debug!("Cutout shape {:?} (FITS order)", data.fits_shape());
        Ok(CutoutResult { data, frame })
    }
}
