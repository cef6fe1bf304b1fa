//! Console logger

use super::traits::{LogLevel, Logger};

/// Writes lines to the terminal. Warnings and errors go to stderr,
/// everything else to stdout. Lines below `min_level` are dropped.
#[derive(Debug, Clone)]
pub struct ConsoleLogger {
    prefix: String,
    min_level: LogLevel,
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleLogger {
    pub fn new() -> Self {
        Self {
            prefix: "[CourseMate]".to_string(),
            min_level: LogLevel::Info,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }
}

impl Logger for ConsoleLogger {
    fn log(&self, level: LogLevel, message: &str) {
        if !self.enabled(level) {
            return;
        }
        match level {
            LogLevel::Warn | LogLevel::Error => eprintln!("{} {}: {}", self.prefix, level, message),
            LogLevel::Debug | LogLevel::Info => println!("{} {}: {}", self.prefix, level, message),
        }
    }
}
