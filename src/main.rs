use clap::{Arg, Command as ClapCommand, ArgAction};
use log::{error, LevelFilter};
use std::process;

use cutoutkit::utils::logger::Logger;
use cutoutkit::commands::{CommandFactory, CutoutkitCommandFactory};

fn main() {
    let matches = ClapCommand::new("CutoutKit")
        .version("0.1.0")
        .about("Cut pixel regions out of FITS images while keeping their WCS consistent")
        .arg(
            Arg::new("input")
                .help("Input FITS file")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("region")
                .short('r')
                .long("region")
                .help("Cutout specification, e.g. '[SCI,2][100:200,50:80]' or '[1:10,*]'")
                .value_name("SPEC")
                .required(false),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("Output FITS file")
                .value_name("FILE")
                .required(false),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("TOML file with header keyword rules")
                .value_name("FILE")
                .required(false),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .help("Path of the log file")
                .value_name("FILE")
                .default_value("cutoutkit.log"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("analyze")
                .short('a')
                .long("analyze")
                .help("List the HDUs of the input file instead of cutting")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let log_file = matches
        .get_one::<String>("log-file")
        .map(String::as_str)
        .unwrap_or("cutoutkit.log");
    let logger = match Logger::new(log_file) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Error initializing logger: {}", e);
            process::exit(1);
        }
    };

    let level = if matches.get_flag("verbose") { LevelFilter::Debug } else { LevelFilter::Info };
    if let Err(e) = Logger::init_global_logger("cutoutkit-global.log", level) {
        eprintln!("Error setting up global logger: {}", e);
        process::exit(1);
    }

    let factory = CutoutkitCommandFactory::new();

    let command_result = factory.create_command(&matches, &logger);
    match command_result {
        Ok(command) => {
            if let Err(e) = command.execute() {
                error!("Command execution error: {}", e);
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
        Err(e) => {
            error!("Failed to create command: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
}
