//! Pixel cutout command
//!
//! This module implements the command that cuts the HDUs selected by a
//! cutout specification out of a FITS file and writes them to a new file.

use clap::ArgMatches;
use log::{debug, info, warn};
use std::fs::{self, File};
use std::io::{BufWriter, Write};

use crate::commands::command_traits::Command;
use crate::cutout::CutoutOrchestrator;
use crate::fits::errors::{FitsError, FitsResult};
use crate::fits::keywords::KeywordRules;
use crate::fits::reader::FitsReader;
use crate::fits::writer::FitsWriter;
use crate::utils::logger::Logger;

/// Command for cutting pixel regions out of FITS files
pub struct CutoutCommand<'a> {
    /// Path to the input file
    input_file: String,
    /// Path to the output file
    output_file: String,
    /// Cutout specification, e.g. `[SCI,2][100:200,50:80]`
    region: String,
    /// Header keyword rules file (optional)
    config_file: Option<String>,
    /// Whether to show a spinner while scanning
    verbose: bool,
    /// Logger for recording operations
    logger: &'a Logger,
}

impl<'a> CutoutCommand<'a> {
    /// Create a new cutout command
    ///
    /// # Arguments
    /// * `args` - CLI argument matches from clap
    /// * `logger` - Logger for recording operations
    ///
    /// # Returns
    /// A new CutoutCommand instance or an error
    pub fn new(args: &ArgMatches, logger: &'a Logger) -> FitsResult<Self> {
        let input_file = args.get_one::<String>("input")
            .ok_or_else(|| FitsError::GenericError("Missing input file".to_string()))?
            .clone();
        info!("Input file: {}", input_file);

        let output_file = args.get_one::<String>("output")
            .ok_or_else(|| FitsError::GenericError("Missing output file path for cutout".to_string()))?
            .clone();
        info!("Output file: {}", output_file);

        let region = args.get_one::<String>("region")
            .ok_or_else(|| FitsError::GenericError("Missing cutout region (use --region)".to_string()))?
            .clone();
        info!("Region: {}", region);

        let config_file = args.get_one::<String>("config").cloned();
        let verbose = args.get_flag("verbose");

        Ok(CutoutCommand {
            input_file,
            output_file,
            region,
            config_file,
            verbose,
            logger,
        })
    }

    fn load_rules(&self) -> FitsResult<KeywordRules> {
        match &self.config_file {
            Some(path) => {
                info!("Loading keyword rules from {}", path);
                KeywordRules::from_file(path)
            }
            None => Ok(KeywordRules::default()),
        }
    }
}

impl<'a> Command for CutoutCommand<'a> {
    fn execute(&self) -> FitsResult<()> {
        info!("Cutting {} out of {}", self.region, self.input_file);
        let rules = self.load_rules()?;

        let mut reader = FitsReader::open(&self.input_file, self.logger)?;
        let output = BufWriter::new(File::create(&self.output_file)?);
        let mut writer = FitsWriter::with_rules(output, &rules);

        let orchestrator = CutoutOrchestrator::new(self.logger, &rules).with_progress(self.verbose);
        let summary = orchestrator.cutout(&mut reader, &self.region, &mut writer)?;
        writer.into_inner().flush()?;

        if summary.written == 0 {
            warn!("No HDU matched {}; nothing written", self.region);
            fs::remove_file(&self.output_file)?;
            return Ok(());
        }

        debug!("Source HDUs written: {:?}", summary.indices);
        println!("Wrote {} HDU(s) to {}", summary.written, self.output_file);
        self.logger.log(&format!(
            "Cutout {} of {} written to {} ({} HDUs)",
            self.region, self.input_file, self.output_file, summary.written
        ))?;
        Ok(())
    }
}
