//! Logger utility for application-wide logging
//!
//! Components receive a `&Logger` when they are built and write their audit
//! lines through it; nothing in the library installs a process-wide logger.
//! The binary additionally registers one instance with the `log` crate so
//! the `log` macros end up in a file as well.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

use log::{Level, LevelFilter, Log, Metadata, Record};

/// File-backed logger with its own level filter
pub struct Logger {
    /// File handle for log output; `None` discards everything
    file: Mutex<Option<File>>,
    /// Most verbose level written
    level: LevelFilter,
    /// Also print records received through the `log` crate to stderr
    echo: bool,
}

impl Logger {
    /// Creates a new logger writing to a file
    ///
    /// # Arguments
    ///
    /// * `log_file` - Path to the log file
    ///
    /// # Returns
    ///
    /// A new Logger instance or an error if the file cannot be created
    pub fn new(log_file: &str) -> io::Result<Self> {
        let file = File::create(Path::new(log_file))?;
        Ok(Logger {
            file: Mutex::new(Some(file)),
            level: LevelFilter::Debug,
            echo: false,
        })
    }

    /// Creates a logger that discards everything
    pub fn silent() -> Self {
        Logger {
            file: Mutex::new(None),
            level: LevelFilter::Off,
            echo: false,
        }
    }

    /// Restrict the logger to a level
    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    /// Echo `log` crate records to stderr
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Logs a message to the log file
    ///
    /// # Arguments
    ///
    /// * `message` - The message to log
    pub fn log(&self, message: &str) -> io::Result<()> {
        let Ok(mut guard) = self.file.lock() else {
            return Ok(());
        };
        if let Some(file) = guard.as_mut() {
            writeln!(file, "{}", message)?;
            file.flush()?;
        }
        Ok(())
    }

    /// Write a debug line
    pub fn debug(&self, message: &str) {
        self.write(Level::Debug, message);
    }

    /// Write an info line
    pub fn info(&self, message: &str) {
        self.write(Level::Info, message);
    }

    /// Write a warning line
    pub fn warn(&self, message: &str) {
        self.write(Level::Warn, message);
    }

    /// Write an error line
    pub fn error(&self, message: &str) {
        self.write(Level::Error, message);
    }

    fn write(&self, level: Level, message: &str) {
        if level <= self.level {
            // A failed log write must not fail the cutout
            let _ = self.log(&format!("[{}] {}", level, message));
        }
    }

    /// Static method to initialize the global logger
    pub fn init_global_logger(log_file: &str, level: LevelFilter) -> io::Result<()> {
        let global_logger = Logger::new(log_file)?.with_level(level).with_echo(true);

        if log::set_boxed_logger(Box::new(global_logger)).is_err() {
            eprintln!("Warning: Global logger was already initialized");
        }

        log::set_max_level(level);
        Ok(())
    }
}

// Implement the Log trait to make our Logger work with the log crate
impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let message = format!("[{}] {}", record.level(), record.args());
            let _ = Logger::log(self, &message);

            if self.echo && record.level() <= Level::Warn {
                eprintln!("{}", message);
            }
        }
    }

    fn flush(&self) {
        // Already flushing in the log method
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_logger_accepts_everything() {
        let logger = Logger::silent();
        logger.debug("nothing");
        logger.error("still nothing");
        assert!(logger.log("direct").is_ok());
    }

    #[test]
    fn test_level_filter() {
        let path = std::env::temp_dir().join("cutoutkit_logger_test.log");
        let path_str = path.to_string_lossy().to_string();
        {
            let logger = Logger::new(&path_str).unwrap().with_level(LevelFilter::Info);
            logger.debug("hidden");
            logger.info("shown");
        }
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[INFO] shown"));
        assert!(!contents.contains("hidden"));
        let _ = std::fs::remove_file(path);
    }
}
