use std::fs::{self, File};
use std::io::{BufWriter, Write};
use log::{info, warn};

use crate::commands::analyze_command::format_report;
use crate::cutout::{CutoutOrchestrator, CutoutSummary};
use crate::fits::errors::FitsResult;
use crate::fits::keywords::KeywordRules;
use crate::fits::reader::FitsReader;
use crate::fits::writer::FitsWriter;
use crate::io::seekable::SeekableReader;
use crate::utils::logger::Logger;

/// Main interface to the cutoutkit library
pub struct CutoutKit {
    logger: Logger,
    rules: KeywordRules,
    show_progress: bool,
}

impl CutoutKit {
    /// Create a new CutoutKit instance
    ///
    /// # Arguments
    /// * `log_file` - Optional path to log file, defaults to "cutoutkit.log"
    ///
    /// # Returns
    /// A CutoutKit instance or an error if the log file cannot be created
    pub fn new(log_file: Option<&str>) -> FitsResult<Self> {
        let log_path = log_file.unwrap_or("cutoutkit.log");
        let logger = Logger::new(log_path)?;
        Ok(CutoutKit::with_logger(logger))
    }

    /// Create an instance around an existing logger
    pub fn with_logger(logger: Logger) -> Self {
        CutoutKit {
            logger,
            rules: KeywordRules::default(),
            show_progress: false,
        }
    }

    /// Replace the header keyword rules
    pub fn with_rules(mut self, rules: KeywordRules) -> Self {
        self.rules = rules;
        self
    }

    /// Load header keyword rules from a TOML file
    pub fn with_config(self, config_path: &str) -> FitsResult<Self> {
        info!("Loading keyword rules from {}", config_path);
        let rules = KeywordRules::from_file(config_path)?;
        Ok(self.with_rules(rules))
    }

    /// Show a spinner while HDUs are scanned
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Cut a FITS file into a new FITS file
    ///
    /// When nothing matches, no output file is left behind.
    ///
    /// # Arguments
    /// * `input_path` - Path to the source FITS file
    /// * `output_path` - Path of the FITS file to create
    /// * `spec` - Cutout specification, e.g. `[SCI,2][100:200,50:80]`
    ///
    /// # Returns
    /// What was written, or an error
    pub fn cutout(&self, input_path: &str, output_path: &str, spec: &str) -> FitsResult<CutoutSummary> {
        info!("Cutting {} from {} into {}", spec, input_path, output_path);

        let mut reader = FitsReader::open(input_path, &self.logger)?;
        let output = BufWriter::new(File::create(output_path)?);
        let mut writer = FitsWriter::with_rules(output, &self.rules);

        let summary = self.orchestrator().cutout(&mut reader, spec, &mut writer)?;
        writer.into_inner().flush()?;

        if summary.written == 0 {
            warn!("Nothing matched {}; removing {}", spec, output_path);
            fs::remove_file(output_path)?;
        }

        Ok(summary)
    }

    /// Cut from any seekable stream into any writable stream
    ///
    /// # Arguments
    /// * `input` - Source FITS stream
    /// * `output` - Destination stream; returned afterwards
    /// * `spec` - Cutout specification
    pub fn cutout_stream<R, W>(&self, input: R, output: W, spec: &str) -> FitsResult<(CutoutSummary, W)>
    where
        R: SeekableReader,
        W: Write,
    {
        let mut reader = FitsReader::new(input, &self.logger)?;
        let mut writer = FitsWriter::with_rules(output, &self.rules);
        let summary = self.orchestrator().cutout(&mut reader, spec, &mut writer)?;
        Ok((summary, writer.into_inner()))
    }

    /// Describe the HDUs of a FITS file
    ///
    /// Lists, for every HDU, the selector that names it, its type, data
    /// type, shape and whether it carries a coordinate frame.
    ///
    /// # Arguments
    /// * `input_path` - Path to the FITS file to analyze
    ///
    /// # Returns
    /// String containing analysis information or an error
    pub fn analyze(&self, input_path: &str) -> FitsResult<String> {
        let mut reader = FitsReader::open(input_path, &self.logger)?;
        let units = reader.hdus()?;

        let report = format_report(&units);
        self.logger.info(&format!("Analyzed {} ({} HDUs)", input_path, units.len()));
        Ok(report)
    }

    fn orchestrator(&self) -> CutoutOrchestrator<'_> {
        CutoutOrchestrator::new(&self.logger, &self.rules).with_progress(self.show_progress)
    }
}
