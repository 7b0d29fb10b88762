pub mod io;
pub mod fits;
pub mod utils;
pub mod extractor;
pub mod coordinate;
pub mod cutout;
pub mod commands;
pub mod api;

pub use crate::api::CutoutKit;

pub use fits::{FitsError, FitsReader, FitsResult, FitsWriter};
pub use extractor::{ExtractionEngine, NdArray};
pub use cutout::{CutoutOrchestrator, CutoutSummary, PixelCutoutRequest};
pub use coordinate::CoordinateFrame;
