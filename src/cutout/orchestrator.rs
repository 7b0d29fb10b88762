//! Cutout pipeline over a whole file
//!
//! Parses the specification, walks the HDUs of a source, cuts every HDU a
//! request matches and appends the results to a sink in source order. Each
//! append is flushed at once, so HDUs already written survive a later
//! failure.

use log::{error, info, warn};

use crate::coordinate::frame::CoordinateFrame;
use crate::cutout::parser;
use crate::cutout::request::PixelCutoutRequest;
use crate::cutout::sanitize::HeaderSanitizer;
use crate::cutout::selector::{self, OccurrenceTally};
use crate::cutout::source::{OutputSink, SubUnitSource};
use crate::extractor::ExtractionEngine;
use crate::fits::errors::{FitsError, FitsResult};
use crate::fits::hdu::HduInfo;
use crate::fits::keywords::KeywordRules;
use crate::utils::logger::Logger;
use crate::utils::progress::ProgressTracker;

/// What a cutout invocation wrote
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CutoutSummary {
    /// Number of HDUs appended to the sink
    pub written: usize,
    /// Source index of each appended HDU, in output order
    pub indices: Vec<usize>,
}

/// Drives parsing, matching, extraction, sanitising and writing
pub struct CutoutOrchestrator<'a> {
    /// Logger for recording operations
    logger: &'a Logger,
    /// Header keyword rules
    rules: &'a KeywordRules,
    /// Show a spinner while scanning
    show_progress: bool,
}

impl<'a> CutoutOrchestrator<'a> {
    /// Create a new orchestrator
    ///
    /// # Arguments
    /// * `logger` - Logger for recording operations
    /// * `rules` - Header keyword rules applied to every cutout
    pub fn new(logger: &'a Logger, rules: &'a KeywordRules) -> Self {
        CutoutOrchestrator {
            logger,
            rules,
            show_progress: false,
        }
    }

    /// Show a progress spinner during the HDU scan
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Cut the regions a specification names out of a source
    ///
    /// With a single request the target HDU is located from headers alone;
    /// otherwise every HDU is visited in order and checked against every
    /// request. Both paths write the same HDUs. A request that matches
    /// nothing is not an error.
    ///
    /// # Arguments
    /// * `source` - HDUs to cut from
    /// * `spec` - Pixel cutout specification, e.g. `[SCI,2][10:20,30:40]`
    /// * `sink` - Destination for the cutouts
    ///
    /// # Returns
    /// What was written, `Unsupported` for sky-region specifications,
    /// `Parse` for malformed ones, or `NoContent` when a region misses the
    /// HDU it targets
    pub fn cutout<S, O>(&self, source: &mut S, spec: &str, sink: &mut O) -> FitsResult<CutoutSummary>
    where
        S: SubUnitSource + ?Sized,
        O: OutputSink + ?Sized,
    {
        if !parser::is_pixel_spec(spec) {
            return Err(FitsError::Unsupported(format!(
                "only pixel cutouts are supported, got '{}'",
                spec.trim()
            )));
        }

        let requests = parser::parse(spec)?;
        info!("Cutting {} request(s) from '{}'", requests.len(), spec.trim());
        self.logger.info(&format!("Cutout specification: {}", spec.trim()));

        let progress = if self.show_progress {
            Some(ProgressTracker::new("Scanning HDUs"))
        } else {
            None
        };

        let mut summary = CutoutSummary::default();

        if let [request] = requests.as_slice() {
            if let Some(unit) = source.locate(&request.extension)? {
                self.cut_unit(source, &unit, request, sink, &mut summary)?;
            }
            if let Some(p) = &progress {
                p.increment(1);
            }
        } else {
            source.rewind()?;
            let mut tally = OccurrenceTally::new();

            while let Some(unit) = source.next_unit()? {
                let name = unit.extname();
                let (next, id) = tally.visit(unit.index, name.as_deref());
                tally = next;

                for request in requests.iter().filter(|r| selector::matches(&id, r)) {
                    self.cut_unit(source, &unit, request, sink, &mut summary)?;
                }

                if let Some(p) = &progress {
                    p.increment(1);
                }
            }
        }

        if let Some(p) = &progress {
            p.finish();
        }

        if summary.written == 0 {
            warn!("No HDU matched '{}'", spec.trim());
        }
        self.logger.info(&format!("Wrote {} HDU(s) from {:?}", summary.written, summary.indices));
        Ok(summary)
    }

    /// Cut one matched HDU and append the result
    fn cut_unit<S, O>(
        &self,
        source: &mut S,
        unit: &HduInfo,
        request: &PixelCutoutRequest,
        sink: &mut O,
        summary: &mut CutoutSummary,
    ) -> FitsResult<()>
    where
        S: SubUnitSource + ?Sized,
        O: OutputSink + ?Sized,
    {
        if !unit.is_image() {
            self.logger.warn(&format!("HDU {} matched {} but holds no image", unit.index, request));
            return Ok(());
        }

        let frame = CoordinateFrame::from_header(&unit.header);
        let engine = ExtractionEngine::new(self.logger);

        let extracted = {
            let mut view = source.data_view(unit)?;
            engine.extract(&mut *view, request, frame.as_ref())
        };

        let result = match extracted {
            Ok(result) => result,
            Err(FitsError::NoOverlap) => {
                let message = format!(
                    "{} does not overlap HDU {} of shape {:?}",
                    request,
                    unit.index,
                    unit.fits_shape()
                );
                self.logger.error(&message);
                error!("{}", message);
                return Err(FitsError::NoContent(message));
            }
            Err(e) => return Err(e),
        };

        let mut header = unit.header.clone();
        HeaderSanitizer::new(self.rules, self.logger).sanitize(&mut header, &result);

        sink.append(&header, &result.data)?;
        sink.flush()?;

        self.logger.info(&format!(
            "Appended HDU {} cut by {} with shape {:?}",
            unit.index,
            request,
            result.data.fits_shape()
        ));
        summary.written += 1;
        summary.indices.push(unit.index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::NdArray;
    use crate::fits::header::Header;
    use crate::fits::reader::FitsReader;
    use crate::fits::tests::test_utils::{self, TestHdu};
    use crate::fits::writer::FitsWriter;

    /// Sink that records what it was given
    #[derive(Default)]
    struct RecordingSink {
        units: Vec<(Header, NdArray)>,
        flushes: usize,
    }

    impl OutputSink for RecordingSink {
        fn append(&mut self, header: &Header, data: &NdArray) -> FitsResult<()> {
            self.units.push((header.clone(), data.clone()));
            Ok(())
        }

        fn flush(&mut self) -> FitsResult<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    fn sci_sci_err() -> Vec<u8> {
        test_utils::build_fits(&[
            TestHdu::empty_primary(),
            TestHdu::image(Some("SCI"), &[10, 8], 1000),
            TestHdu::image(Some("SCI"), &[10, 8], 2000),
            TestHdu::image(Some("ERR"), &[10, 8], 3000),
        ])
    }

    fn run(bytes: Vec<u8>, spec: &str) -> FitsResult<(CutoutSummary, RecordingSink)> {
        let logger = Logger::silent();
        let rules = KeywordRules::default();
        let mut reader = FitsReader::new(std::io::Cursor::new(bytes), &logger)?;
        let mut sink = RecordingSink::default();
        let summary = CutoutOrchestrator::new(&logger, &rules).cutout(&mut reader, spec, &mut sink)?;
        Ok((summary, sink))
    }

    #[test]
    fn test_name_occurrence_selects_second_sci() {
        let (summary, sink) = run(sci_sci_err(), "[SCI,2][1:10,1:10]").unwrap();
        assert_eq!(summary.indices, vec![2]);
        assert_eq!(sink.units.len(), 1);
        assert_eq!(sink.flushes, 1);

        let (header, data) = &sink.units[0];
        assert_eq!(data.fits_shape(), vec![10, 8]);
        assert_eq!(data.get_f64(&[0, 0]), Some(2000.0));
        assert_eq!(header.extname().as_deref(), Some("SCI"));
    }

    #[test]
    fn test_missing_occurrence_writes_nothing() {
        let (summary, sink) = run(sci_sci_err(), "[SCI,3][1:10,1:10]").unwrap();
        assert_eq!(summary, CutoutSummary::default());
        assert!(sink.units.is_empty());

        let (summary, _) = run(sci_sci_err(), "[SCI,3][1:2][ERR,2]").unwrap();
        assert_eq!(summary.written, 0);
    }

    #[test]
    fn test_multiple_requests_follow_source_order() {
        let (summary, sink) = run(sci_sci_err(), "[ERR][2:3,2:3] [1][1:2,1:2] [SCI,2]").unwrap();
        assert_eq!(summary.indices, vec![1, 2, 3]);
        assert_eq!(sink.flushes, 3);
        assert_eq!(sink.units[0].1.fits_shape(), vec![2, 2]);
        assert_eq!(sink.units[1].1.fits_shape(), vec![10, 8]);
        // ERR starts at 3000; (NAXIS1 2, NAXIS2 2) is element 1 * 10 + 1
        assert_eq!(sink.units[2].1.get_f64(&[0, 0]), Some(3011.0));
    }

    #[test]
    fn test_reference_pixel_follows_cutout() {
        let (_, sink) = run(sci_sci_err(), "[SCI][3:7,2:5]").unwrap();
        let (header, _) = &sink.units[0];
        // TestHdu images carry CRPIX = (5, 4)
        assert_eq!(header.get_f64("CRPIX1"), Some(3.0));
        assert_eq!(header.get_f64("CRPIX2"), Some(3.0));
    }

    #[test]
    fn test_single_and_multi_paths_write_same_bytes() {
        let logger = Logger::silent();
        let rules = KeywordRules::default();
        let orchestrator = CutoutOrchestrator::new(&logger, &rules);

        let write = |spec: &str| -> Vec<u8> {
            let mut reader = FitsReader::new(std::io::Cursor::new(sci_sci_err()), &logger).unwrap();
            let mut writer = FitsWriter::new(Vec::new());
            orchestrator.cutout(&mut reader, spec, &mut writer).unwrap();
            writer.into_inner()
        };

        // The trailing selector names an HDU that does not exist, forcing the full scan
        let single = write("[SCI,2][2:9,3:6]");
        let multi = write("[SCI,2][2:9,3:6][ERR,5]");
        assert!(!single.is_empty());
        assert_eq!(single, multi);
    }

    #[test]
    fn test_no_overlap_becomes_no_content() {
        let result = run(sci_sci_err(), "[ERR][20:30,1:5]");
        assert!(matches!(result, Err(FitsError::NoContent(_))));
    }

    #[test]
    fn test_flushed_units_survive_later_no_content() {
        let logger = Logger::silent();
        let rules = KeywordRules::default();
        let mut reader = FitsReader::new(std::io::Cursor::new(sci_sci_err()), &logger).unwrap();
        let mut sink = RecordingSink::default();

        let result = CutoutOrchestrator::new(&logger, &rules).cutout(
            &mut reader,
            "[SCI,1][1:2,1:2][ERR][20:30,1:5]",
            &mut sink,
        );

        assert!(matches!(result, Err(FitsError::NoContent(_))));
        assert_eq!(sink.units.len(), 1);
        assert_eq!(sink.flushes, 1);
        assert_eq!(sink.units[0].1.get_f64(&[0, 0]), Some(1000.0));
    }

    #[test]
    fn test_non_image_hdus_are_counted_not_cut() {
        let bytes = test_utils::build_fits(&[
            TestHdu::empty_primary(),
            TestHdu::table(Some("SCI")),
            TestHdu::image(Some("SCI"), &[4, 4], 500),
        ]);

        let (summary, _) = run(bytes.clone(), "[SCI,2]").unwrap();
        assert_eq!(summary.indices, vec![2]);

        let (summary, _) = run(bytes.clone(), "[0]").unwrap();
        assert_eq!(summary.written, 0);

        let (summary, _) = run(bytes, "[SCI][1:2,1:2][SCI,2][1:2,1:2]").unwrap();
        assert_eq!(summary.indices, vec![2]);
    }

    #[test]
    fn test_sky_region_is_unsupported() {
        let result = run(sci_sci_err(), "CIRCLE 9.0 66.3 0.05");
        assert!(matches!(result, Err(FitsError::Unsupported(_))));
    }

    #[test]
    fn test_parse_error_is_reported() {
        let result = run(sci_sci_err(), "[SCI,0]");
        assert!(matches!(result, Err(FitsError::Parse { .. })));
    }
}
