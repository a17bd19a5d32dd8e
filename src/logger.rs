use log::{Level, LevelFilter, Log, Metadata, Record};
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub enum LogOutput {
    Stdout,
    Stderr,
}

pub struct Logger {
    pub write_to_std: Option<LogOutput>,
    pub severity: Level,
    pub file: Option<Arc<Mutex<File>>>,
    pub enable_colors: bool,
}

impl Logger {
    /// Create a new logger; `file_path` enables plain-text file output
    pub fn new(
        file_path: Option<PathBuf>,
        severity: Option<Level>,
        write_to_std: Option<LogOutput>,
        enable_colors: bool,
    ) -> Self {
        let file = file_path.and_then(|path| {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            File::create(&path).ok().map(|f| Arc::new(Mutex::new(f)))
        });

        Logger {
            write_to_std,
            severity: severity.unwrap_or(Level::Info),
            file,
            enable_colors,
        }
    }

    /// Default log file location when `MDVIEW_LOG_FILE` is set but empty
    pub fn default_file_path() -> PathBuf {
        std::env::temp_dir().join("mdview").join("mdview.log")
    }

    fn timestamp() -> String {
        OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| "-".to_string())
    }

    /// Get color code for log level
    fn color(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1b[31m",
            Level::Warn => "\x1b[33m",
            Level::Info => "\x1b[36m",
            Level::Debug => "\x1b[35m",
            Level::Trace => "\x1b[37m",
        }
    }

    /// Initialize logger with environment variables
    pub fn init() -> Result<(), log::SetLoggerError> {
        let severity = std::env::var("MDVIEW_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| "info".to_string())
            .parse::<Level>()
            .unwrap_or(Level::Info);

        let file_path = std::env::var_os("MDVIEW_LOG_FILE").map(|value| {
            if value.is_empty() {
                Self::default_file_path()
            } else {
                PathBuf::from(value)
            }
        });
        let enable_colors = std::env::var_os("NO_COLOR").is_none();

        let logger = Logger::new(file_path, Some(severity), Some(LogOutput::Stderr), enable_colors);
        log::set_max_level(LevelFilter::Trace);
        log::set_logger(Box::leak(Box::new(logger)))?;
        Ok(())
    }
}

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.severity
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let timestamp = Self::timestamp();
        let level_str = record.level().as_str();
        let args = record.args();

        if let Some(write_to_std) = &self.write_to_std {
            let line = if self.enable_colors {
                let color = Self::color(record.level());
                format!("{color}[{timestamp}] {level_str}\x1b[0m {args}\n")
            } else {
                format!("[{timestamp}] {level_str} {args}\n")
            };
            let _ = match write_to_std {
                LogOutput::Stdout => std::io::stdout().write_all(line.as_bytes()),
                LogOutput::Stderr => std::io::stderr().write_all(line.as_bytes()),
            };
        }

        if let Some(file) = &self.file {
            if let Ok(mut file_guard) = file.lock() {
                let _ = writeln!(file_guard, "[{timestamp}] {level_str} {args}");
            }
        }
    }

    fn flush(&self) {
        let _ = std::io::stdout().flush();
        let _ = std::io::stderr().flush();
        if let Some(file) = &self.file {
            if let Ok(mut file_guard) = file.lock() {
                let _ = file_guard.flush();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn records_below_severity_are_dropped() {
        let logger = Logger::new(None, Some(Level::Warn), None, false);
        let warn = Metadata::builder().level(Level::Warn).build();
        let info = Metadata::builder().level(Level::Info).build();
        assert!(logger.enabled(&warn));
        assert!(!logger.enabled(&info));
    }

    #[test]
    fn file_output_is_plain_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("mdview.log");
        let logger = Logger::new(Some(path.clone()), Some(Level::Info), None, true);

        logger.log(
            &Record::builder()
                .level(Level::Warn)
                .args(format_args!("stylesheet missing"))
                .build(),
        );
        logger.flush();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("WARN stylesheet missing"));
        assert!(!written.contains('\x1b'));
    }
}
