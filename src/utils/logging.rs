//! Optional plain-text transcript logging, toggleable at runtime via the
//! `/log` command.

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

pub struct LoggingState {
    file_path: Option<String>,
    is_active: bool,
}

impl LoggingState {
    pub fn new(log_file: Option<String>) -> Self {
        let is_active = log_file.is_some();
        LoggingState {
            file_path: log_file,
            is_active,
        }
    }

    pub fn set_log_file(&mut self, path: String) -> Result<String, Box<dyn std::error::Error>> {
        self.test_file_access(&path)?;
        self.file_path = Some(path.clone());
        self.is_active = true;
        Ok(format!("Logging enabled to: {path}"))
    }

    pub fn toggle_logging(&mut self) -> Result<String, Box<dyn std::error::Error>> {
        match &self.file_path {
            Some(path) => {
                self.is_active = !self.is_active;
                if self.is_active {
                    Ok(format!("Logging resumed to: {path}"))
                } else {
                    Ok(format!("Logging paused (file: {path})"))
                }
            }
            None => Err("No log file set. Use /log <filename> to enable logging first.".into()),
        }
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Append one transcript entry, preserving its line structure and
    /// leaving a blank separator line.
    pub fn log_message(&self, content: &str) -> Result<(), Box<dyn std::error::Error>> {
        let Some(file_path) = self.file_path.as_ref().filter(|_| self.is_active) else {
            return Ok(());
        };

        let file = OpenOptions::new().create(true).append(true).open(file_path)?;
        let mut writer = BufWriter::new(file);
        for line in content.lines() {
            writeln!(writer, "{line}")?;
        }
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn status_string(&self) -> String {
        match (&self.file_path, self.is_active) {
            (None, _) => "disabled".to_string(),
            (Some(path), active) => {
                let file = Path::new(path)
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy();
                if active {
                    format!("active ({file})")
                } else {
                    format!("paused ({file})")
                }
            }
        }
    }

    fn test_file_access(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_logger_writes_nothing() {
        let logging = LoggingState::new(None);
        assert!(logging.log_message("hello").is_ok());
        assert_eq!(logging.status_string(), "disabled");
    }

    #[test]
    fn active_logger_appends_with_separator() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.log");
        let mut logging = LoggingState::new(None);
        logging
            .set_log_file(path.to_string_lossy().into_owned())
            .unwrap();

        logging.log_message("You: hi").unwrap();
        logging.log_message("hello there").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "You: hi\n\nhello there\n\n");
    }

    #[test]
    fn toggle_requires_a_file() {
        let mut logging = LoggingState::new(None);
        assert!(logging.toggle_logging().is_err());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.log");
        logging
            .set_log_file(path.to_string_lossy().into_owned())
            .unwrap();
        assert!(logging.toggle_logging().unwrap().contains("paused"));
        assert!(!logging.is_active());
        assert!(logging.toggle_logging().unwrap().contains("resumed"));
    }
}
