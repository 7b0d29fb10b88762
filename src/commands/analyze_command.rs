//! FITS structure analysis command
//!
//! This module implements the command that lists the HDUs of a FITS file
//! together with the selector that names each of them.

use clap::ArgMatches;
use log::{debug, info};

use crate::commands::command_traits::Command;
use crate::coordinate::CoordinateFrame;
use crate::cutout::selector::OccurrenceTally;
use crate::fits::constants::keywords;
use crate::fits::errors::{FitsError, FitsResult};
use crate::fits::hdu::HduInfo;
use crate::fits::reader::FitsReader;
use crate::utils::logger::Logger;

/// Command for analyzing FITS file structure
pub struct AnalyzeCommand<'a> {
    /// Path to the input file
    input_file: String,
    /// Whether to list every header card
    verbose: bool,
    /// Logger for recording operations
    logger: &'a Logger,
}

impl<'a> AnalyzeCommand<'a> {
    /// Create a new analyze command
    ///
    /// # Arguments
    /// * `args` - CLI argument matches from clap
    /// * `logger` - Logger for recording operations
    ///
    /// # Returns
    /// A new AnalyzeCommand instance or an error
    pub fn new(args: &ArgMatches, logger: &'a Logger) -> FitsResult<Self> {
        let input_file = args.get_one::<String>("input")
            .ok_or_else(|| FitsError::GenericError("Missing input file".to_string()))?
            .clone();

        let verbose = args.get_flag("verbose");

        Ok(AnalyzeCommand {
            input_file,
            verbose,
            logger,
        })
    }
}

impl<'a> Command for AnalyzeCommand<'a> {
    fn execute(&self) -> FitsResult<()> {
        info!("Analyzing file: {}", self.input_file);

        let mut reader = FitsReader::open(&self.input_file, self.logger)?;
        let units = reader.hdus()?;

        print!("{}", format_report(&units));

        if self.verbose {
            for unit in &units {
                println!("\nHDU #{} header:", unit.index);
                print!("{}", unit.header);
            }
        }

        debug!("Analysis completed successfully");
        self.logger.log("Analysis completed successfully")?;
        Ok(())
    }
}

/// Render the HDU listing of a file
///
/// For every HDU: the selector that names it, its type, data type, shape,
/// whether it can be cut and its coordinate frame, if any.
pub fn format_report(units: &[HduInfo]) -> String {
    let mut report = String::from("FITS Analysis Results:\n");
    report.push_str(&format!("  Number of HDUs: {}\n", units.len()));

    let mut tally = OccurrenceTally::new();
    for unit in units {
        let name = unit.extname();
        let (next, id) = tally.visit(unit.index, name.as_deref());
        tally = next;

        let selector = match (&id.name, id.occurrence) {
            (Some(name), Some(n)) => format!("[{}] or [{},{}]", unit.index, name, n),
            _ => format!("[{}]", unit.index),
        };
        report.push_str(&describe_unit(unit, &selector));
    }

    report
}

fn describe_unit(unit: &HduInfo, selector: &str) -> String {
    let kind = if unit.index == 0 {
        "PRIMARY".to_string()
    } else {
        unit.header.get_str(keywords::XTENSION).unwrap_or("?").trim().to_string()
    };

    let mut text = format!("\nHDU #{} (data offset: {})\n", unit.index, unit.data_offset);
    text.push_str(&format!("  Selector: {}\n", selector));
    text.push_str(&format!("  Type: {}\n", kind));
    text.push_str(&format!("  BITPIX: {}\n", unit.bitpix));
    text.push_str(&format!("  Shape: {:?}\n", unit.fits_shape()));
    text.push_str(&format!("  Cutout target: {}\n", if unit.is_image() { "yes" } else { "no" }));

    match CoordinateFrame::from_header(&unit.header) {
        Some(frame) => {
            let ctype: Vec<&str> = frame.ctype().iter().map(String::as_str).collect();
            text.push_str(&format!("  WCS: {} axes {:?}, CRPIX {:?}\n", frame.naxis(), ctype, frame.crpix()));
            text.push_str(&format!("  CRVAL: {:?}\n", frame.crval()));
            if let Some(distortion) = frame.distortion() {
                let orders: Vec<String> = ["A", "B"]
                    .iter()
                    .filter_map(|p| distortion.order(p).map(|o| format!("{} order {}", p, o)))
                    .collect();
                text.push_str(&format!("  Distortion: SIP ({})\n", orders.join(", ")));
            }
        }
        None => text.push_str("  WCS: none\n"),
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fits::tests::test_utils::{fits_cursor, TestHdu};

    #[test]
    fn test_report_lists_selectors() {
        let logger = Logger::silent();
        let mut reader = FitsReader::new(
            fits_cursor(&[
                TestHdu::empty_primary(),
                TestHdu::image(Some("SCI"), &[10, 8], 0),
                TestHdu::image(Some("SCI"), &[10, 8], 0),
                TestHdu::table(None),
            ]),
            &logger,
        )
        .unwrap();

        let report = format_report(&reader.hdus().unwrap());
        assert!(report.contains("Number of HDUs: 4"));
        assert!(report.contains("Selector: [2] or [SCI,2]"));
        assert!(report.contains("Selector: [3]\n  Type: BINTABLE"));
        assert!(report.contains("Shape: [10, 8]"));
        assert!(report.contains("WCS: 2 axes [\"RA---TAN\", \"DEC--TAN\"]"));
        assert!(report.contains("CRVAL: [10.0, 20.0]"));
    }

    #[test]
    fn test_report_lists_sip_orders() {
        let logger = Logger::silent();
        let hdu = TestHdu::image(Some("SCI"), &[10, 8], 0)
            .with_card("A_ORDER", "2")
            .with_card("B_ORDER", "3")
            .with_card("A_0_2", "1.5E-6");
        let mut reader = FitsReader::new(fits_cursor(&[TestHdu::empty_primary(), hdu]), &logger).unwrap();

        let report = format_report(&reader.hdus().unwrap());
        assert!(report.contains("Distortion: SIP (A order 2, B order 3)"));
    }
}
