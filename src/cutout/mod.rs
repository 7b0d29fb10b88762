//! Pixel cutouts across the HDUs of a file
//!
//! This module turns a textual cutout specification into requests, matches
//! them to HDUs, and drives extraction, header sanitising and output.

pub mod request;
pub mod parser;
pub mod selector;
pub mod sanitize;
pub mod source;
pub mod orchestrator;

pub use request::{AxisRange, ExtensionSpec, PixelCutoutRequest};
pub use parser::{is_pixel_spec, parse};
pub use selector::{matches, OccurrenceTally, SubUnitId};
pub use sanitize::HeaderSanitizer;
pub use source::{OutputSink, SubUnitSource};
pub use orchestrator::{CutoutOrchestrator, CutoutSummary};
