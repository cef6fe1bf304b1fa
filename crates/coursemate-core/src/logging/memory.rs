//! In-memory logger that captures log lines

use parking_lot::Mutex;

use super::traits::{LogLevel, Logger};

/// A logger that keeps every line in memory
///
/// Used by tests to assert that recovered failures were reported.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    lines: Mutex<Vec<(LogLevel, String)>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured lines, oldest first
    pub fn lines(&self) -> Vec<(LogLevel, String)> {
        self.lines.lock().clone()
    }

    /// Captured messages at exactly `level`
    pub fn messages_at(&self, level: LogLevel) -> Vec<String> {
        self.lines
            .lock()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl Logger for MemoryLogger {
    fn log(&self, level: LogLevel, message: &str) {
        self.lines.lock().push((level, message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captures_by_level() {
        let logger = MemoryLogger::new();
        logger.info("round 0");
        logger.warn("tool failed");
        crate::log_warn!(logger, "tool {} failed", "search");

        assert_eq!(logger.lines().len(), 3);
        assert_eq!(
            logger.messages_at(LogLevel::Warn),
            vec!["tool failed".to_string(), "tool search failed".to_string()]
        );
        assert!(logger.messages_at(LogLevel::Error).is_empty());
    }
}
