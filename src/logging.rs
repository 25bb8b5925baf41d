//! Structured logging for the ping-pong benchmark
//!
//! Console logging with levels, per-component logger names, structured
//! fields, and a per-run correlation id. Participants label their output
//! with their rank so interleaved lines from the in-process group stay
//! attributable.

use crate::error::AppError;
use crate::models::RunConfig;
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Write};
use uuid::Uuid;

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum LogLevel {
    /// Debug level - detailed information for debugging
    Debug = 0,
    /// Info level - general application information
    Info = 1,
    /// Warning level - potentially harmful situations
    Warn = 2,
    /// Error level - error events
    Error = 3,
}

impl LogLevel {
    /// Get log level name as string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    /// Get ANSI color code for console output
    pub fn color_code(&self) -> &'static str {
        match self {
            LogLevel::Debug => "\x1b[36m", // Cyan
            LogLevel::Info => "\x1b[32m",  // Green
            LogLevel::Warn => "\x1b[33m",  // Yellow
            LogLevel::Error => "\x1b[31m", // Red
        }
    }

    /// Reset ANSI color code
    pub fn reset_code() -> &'static str {
        "\x1b[0m"
    }
}

impl std::str::FromStr for LogLevel {
    type Err = AppError;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        match s.to_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" | "WARNING" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            _ => Err(AppError::parse(format!("Invalid log level: {}", s))),
        }
    }
}

/// Console logger with a component name and optional run correlation id
#[derive(Debug, Clone)]
pub struct Logger {
    /// Minimum log level to output
    min_level: LogLevel,
    /// Whether to use colored output
    use_color: bool,
    /// Logger name, e.g. "RUNNER" or "RANK3"
    name: String,
    /// Correlation id shared by all loggers of one run
    run_id: Option<String>,
}

impl Logger {
    /// Create a new logger
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            min_level: LogLevel::Info,
            use_color: true,
            name: name.into(),
            run_id: None,
        }
    }

    /// Create a logger configured from the run configuration
    pub fn with_config(name: impl Into<String>, config: &RunConfig) -> Self {
        let min_level = if config.debug {
            LogLevel::Debug
        } else if config.verbose {
            LogLevel::Info
        } else {
            LogLevel::Warn
        };

        Self {
            min_level,
            use_color: config.enable_color,
            name: name.into(),
            run_id: None,
        }
    }

    /// Derive a logger for one participant rank, keeping the run id
    pub fn for_rank(&self, rank: usize) -> Self {
        Self {
            min_level: self.min_level,
            use_color: self.use_color,
            name: format!("RANK{}", rank),
            run_id: self.run_id.clone(),
        }
    }

    /// Attach a run correlation id (generated once per run)
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    /// Generate a fresh run correlation id
    pub fn new_run_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Set minimum log level
    pub fn set_level(&mut self, level: LogLevel) {
        self.min_level = level;
    }

    /// Check if a log level would be output
    pub fn would_log(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    /// Create a log entry builder
    pub fn log(&self, level: LogLevel, message: &str) -> LogEntryBuilder<'_> {
        LogEntryBuilder::new(self, level, message.to_string())
    }

    pub fn debug(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Debug, message)
    }

    pub fn info(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Info, message)
    }

    pub fn warn(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Warn, message)
    }

    pub fn error(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Error, message)
    }

    fn write_line(&self, level: LogLevel, message: &str, fields: &BTreeMap<String, serde_json::Value>) {
        if level < self.min_level {
            return;
        }

        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let formatted_level = if self.use_color {
            format!("{}{:>5}{}", level.color_code(), level.as_str(), LogLevel::reset_code())
        } else {
            format!("{:>5}", level.as_str())
        };

        let mut output = format!("{} {} [{}] {}", timestamp, formatted_level, self.name, message);

        if let Some(run_id) = &self.run_id {
            // First 8 chars are enough to correlate within a session
            output.push_str(&format!(" [{}]", &run_id[..8.min(run_id.len())]));
        }

        if !fields.is_empty() {
            let fields_str: Vec<String> =
                fields.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            output.push_str(&format!(" {{{}}}", fields_str.join(", ")));
        }

        if level >= LogLevel::Warn {
            let _ = writeln!(io::stderr(), "{}", output);
        } else {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }
}

/// Builder pattern for log entries with structured fields
pub struct LogEntryBuilder<'a> {
    logger: &'a Logger,
    level: LogLevel,
    message: String,
    fields: BTreeMap<String, serde_json::Value>,
}

impl<'a> LogEntryBuilder<'a> {
    fn new(logger: &'a Logger, level: LogLevel, message: String) -> Self {
        Self {
            logger,
            level,
            message,
            fields: BTreeMap::new(),
        }
    }

    /// Add a structured field
    pub fn field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.fields.insert(key.to_string(), json_value);
        }
        self
    }

    /// Add error information fields
    pub fn error_info(self, error: &AppError) -> Self {
        self.field("error_category", error.category())
            .field("error_recoverable", error.is_recoverable())
    }

    /// Finalize and write the log entry
    pub fn log(self) {
        self.logger.write_line(self.level, &self.message, &self.fields);
    }
}
