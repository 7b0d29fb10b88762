//! FITS file format handling
//!
//! This module provides header card parsing and serialisation, the layout
//! of header-data units, and a lazy reader and an append-only writer for
//! image HDUs.

pub mod errors;
pub mod constants;
pub mod types;
pub mod header;
pub mod keywords;
pub mod hdu;
pub mod reader;
pub mod writer;
#[cfg(test)]
pub(crate) mod tests;

pub use errors::{FitsError, FitsResult};
pub use header::{Card, Header, HeaderValue};
pub use hdu::HduInfo;
pub use keywords::KeywordRules;
pub use reader::{FitsReader, HduDataView};
pub use types::Bitpix;
pub use writer::FitsWriter;
