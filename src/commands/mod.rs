//! CLI command implementations
//!
//! This module contains implementations of the commands
//! supported by the CLI application using the Command pattern.

pub mod command_traits;
pub mod analyze_command;
pub mod cutout_command;

pub use command_traits::{Command, CommandFactory};
pub use analyze_command::AnalyzeCommand;
pub use cutout_command::CutoutCommand;

use clap::ArgMatches;
use crate::utils::logger::Logger;
use crate::fits::errors::FitsResult;

/// Factory for creating command instances based on CLI arguments
pub struct CutoutkitCommandFactory;

impl CutoutkitCommandFactory {
    /// Create a new factory instance
    pub fn new() -> Self {
        CutoutkitCommandFactory
    }
}

impl Default for CutoutkitCommandFactory {
    fn default() -> Self {
        CutoutkitCommandFactory::new()
    }
}

impl<'a> CommandFactory<'a> for CutoutkitCommandFactory {
    fn create_command(&self, args: &ArgMatches, logger: &'a Logger) -> FitsResult<Box<dyn Command + 'a>> {
        if args.get_flag("analyze") {
            Ok(Box::new(AnalyzeCommand::new(args, logger)?))
        } else {
            Ok(Box::new(CutoutCommand::new(args, logger)?))
        }
    }
}
