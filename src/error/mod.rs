//! Error handling for the ping-pong benchmark

use thiserror::Error;

/// Custom error types for the ping-pong benchmark
#[derive(Error, Debug)]
pub enum AppError {
    /// Group size makes the measurement undefined (running in serial)
    #[error("Invalid group size: {0}")]
    InvalidGroupSize(String),

    /// Send/receive mismatch or channel failure between participants
    #[error("Communication error: {0}")]
    Communication(String),

    /// A receive or barrier wait exceeded the configured bound
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// A fitted latency/bandwidth model is not physically meaningful
    #[error("Model fit error: {0}")]
    ModelFit(String),

    /// A pair appears twice or is missing when partial results are merged
    #[error("Aggregation error: {0}")]
    Aggregation(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// I/O errors (result file operations, etc.)
    #[error("I/O error: {0}")]
    Io(String),

    /// Parsing errors (CLI values, env variables, etc.)
    #[error("Parsing error: {0}")]
    Parse(String),

    /// Serialization errors (result encoding/decoding)
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create a new invalid-group-size error
    pub fn invalid_group_size<S: Into<String>>(message: S) -> Self {
        Self::InvalidGroupSize(message.into())
    }

    /// Create a new communication error
    pub fn communication<S: Into<String>>(message: S) -> Self {
        Self::Communication(message.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout(message.into())
    }

    /// Create a new model-fit error
    pub fn model_fit<S: Into<String>>(message: S) -> Self {
        Self::ModelFit(message.into())
    }

    /// Create a new aggregation error
    pub fn aggregation<S: Into<String>>(message: S) -> Self {
        Self::Aggregation(message.into())
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    /// Create a new parsing error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new serialization error
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        Self::Serialization(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidGroupSize(_) => "GROUP_SIZE",
            Self::Communication(_) => "COMM",
            Self::Timeout(_) => "TIMEOUT",
            Self::ModelFit(_) => "MODEL_FIT",
            Self::Aggregation(_) => "AGGREGATION",
            Self::Config(_) => "CONFIG",
            Self::Validation(_) => "VALIDATION",
            Self::Io(_) => "IO",
            Self::Parse(_) => "PARSE",
            Self::Serialization(_) => "SERIALIZATION",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Check if the error can be recorded per-pair without aborting the run.
    ///
    /// Protocol-structural errors (group size, communication, aggregation)
    /// are unrecoverable and abort everything; a bad numeric fit is
    /// recorded as a sentinel measurement and the run continues.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::ModelFit(_) => true,
            Self::InvalidGroupSize(_)
            | Self::Communication(_)
            | Self::Timeout(_)
            | Self::Aggregation(_) => false,
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) => false,
            Self::Io(_) | Self::Serialization(_) | Self::Internal(_) => false,
        }
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Validation(_) | Self::Parse(_) => 1, // Invalid configuration/usage
            Self::InvalidGroupSize(_) => 2,                              // Measurement undefined
            Self::Communication(_) => 3,                                 // Channel failures
            Self::Timeout(_) => 4,                                       // Partner too slow or dead
            Self::Aggregation(_) => 5,                                   // Protocol bug
            Self::Io(_) | Self::Serialization(_) => 6,                   // Result persistence
            Self::ModelFit(_) => 7,                                      // Surfaced fit problem
            Self::Internal(_) => 99,                                     // Internal/unexpected errors
        }
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if use_color {
            use colored::Colorize;
            match self {
                Self::Config(_) | Self::Validation(_) | Self::Parse(_) => {
                    format!("[{}] {}", category.red().bold(), message.red())
                }
                Self::Communication(_) | Self::InvalidGroupSize(_) => {
                    format!("[{}] {}", category.yellow().bold(), message.yellow())
                }
                Self::Timeout(_) => {
                    format!("[{}] {}", category.blue().bold(), message.blue())
                }
                Self::ModelFit(_) | Self::Aggregation(_) => {
                    format!("[{}] {}", category.magenta().bold(), message.magenta())
                }
                Self::Io(_) | Self::Serialization(_) => {
                    format!("[{}] {}", category.cyan().bold(), message.cyan())
                }
                Self::Internal(_) => {
                    format!("[{}] {}", category.bright_red().bold(), message.bright_red())
                }
            }
        } else {
            format!("[{}] {}", category, message)
        }
    }
}

// Standard library error conversions
impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", error))
    }
}

impl From<bincode::Error> for AppError {
    fn from(error: bincode::Error) -> Self {
        Self::serialization(format!("Binary encoding error: {}", error))
    }
}

impl From<dotenv::Error> for AppError {
    fn from(error: dotenv::Error) -> Self {
        Self::config(format!("Environment file error: {}", error))
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(error: std::num::ParseIntError) -> Self {
        Self::parse(format!("Integer parse error: {}", error))
    }
}

impl From<std::num::ParseFloatError> for AppError {
    fn from(error: std::num::ParseFloatError) -> Self {
        Self::parse(format!("Float parse error: {}", error))
    }
}

impl From<std::str::ParseBoolError> for AppError {
    fn from(error: std::str::ParseBoolError) -> Self {
        Self::parse(format!("Boolean parse error: {}", error))
    }
}

// Anyhow integration
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::internal(error.to_string())
    }
}

/// Custom Result type for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Error context trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add context to an error
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Add static context to an error
    fn context(self, message: &'static str) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<AppError>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let original_error = e.into();
            let context = f();
            AppError::internal(format!("{}: {}", context, original_error))
        })
    }

    fn context(self, message: &'static str) -> Result<T> {
        self.with_context(|| message.to_string())
    }
}
