//! Seams between the cutout pipeline and the file codec
//!
//! The orchestrator sees a file only as a sequence of HDUs it can walk and
//! read boxes from, and writes only through an append-and-flush sink.

use crate::cutout::request::ExtensionSpec;
use crate::cutout::selector::{extension_matches, OccurrenceTally};
use crate::extractor::array::{ArraySource, NdArray};
use crate::fits::errors::FitsResult;
use crate::fits::hdu::HduInfo;
use crate::fits::header::Header;

/// A file whose HDUs can be walked in order
pub trait SubUnitSource {
    /// Go back to the first HDU
    fn rewind(&mut self) -> FitsResult<()>;

    /// Header and layout of the next HDU, or `None` past the last one
    fn next_unit(&mut self) -> FitsResult<Option<HduInfo>>;

    /// Lazy view over the data of an HDU returned by `next_unit`
    fn data_view<'s>(&'s mut self, unit: &HduInfo) -> FitsResult<Box<dyn ArraySource + 's>>;

    /// Find the HDU an extension selector names, reading headers only
    ///
    /// Scans from the first HDU and stops at the first match.
    fn locate(&mut self, extension: &ExtensionSpec) -> FitsResult<Option<HduInfo>> {
        self.rewind()?;
        let mut tally = OccurrenceTally::new();

        while let Some(unit) = self.next_unit()? {
            let name = unit.extname();
            let (next, id) = tally.visit(unit.index, name.as_deref());
            tally = next;
            if extension_matches(&id, extension) {
                return Ok(Some(unit));
            }
        }
        Ok(None)
    }
}

/// Destination for cutout HDUs
pub trait OutputSink {
    /// Append one HDU
    fn append(&mut self, header: &Header, data: &NdArray) -> FitsResult<()>;

    /// Push everything appended so far to the underlying stream
    fn flush(&mut self) -> FitsResult<()>;
}
