//! Error handling and error types for forest lowering.
//!
//! Every fallible operation in the crate returns [`Result`], whose error type
//! is [`ForestError`]. The three domain categories are:
//!
//! - [`ForestError::InvalidArgument`]: a caller broke an input precondition
//!   (for example pushing a decreasing value into a compressed list). The
//!   failing call leaves its receiver unchanged.
//! - [`ForestError::InvariantViolation`]: a forest handed to the lowering pass
//!   is malformed (child indices out of order, dangling edge targets).
//! - [`ForestError::StructuralMismatch`]: the shape of a forest or graph does
//!   not fit what an operation can handle.

use std::io;
use thiserror::Error;

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum ForestError {
    /// An input precondition was violated
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Which precondition failed and the offending values
        message: String,
    },

    /// A structural invariant of a forest or graph does not hold
    #[error("Invariant violation: {message}")]
    InvariantViolation {
        /// The node or edge that breaks the invariant
        message: String,
    },

    /// A forest or graph has a shape the operation cannot handle
    #[error("Structural mismatch: {message}")]
    StructuralMismatch {
        /// What shape was found and what was expected
        message: String,
    },

    /// Configuration and validation errors
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the bad setting
        message: String,
    },

    /// Invalid input parameters
    #[error("Invalid parameter: {parameter} = {value}, {reason}")]
    InvalidParameter {
        /// Name of the parameter
        parameter: String,
        /// The rejected value, rendered as text
        value: String,
        /// Why the value was rejected
        reason: String,
    },

    /// Dimension mismatch errors
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The dimension the operation needs
        expected: String,
        /// The dimension it was given
        actual: String,
    },

    /// Out of bounds access
    #[error("Index out of bounds: index {index}, length {length}")]
    IndexOutOfBounds {
        /// The requested index
        index: usize,
        /// Length of the indexed collection
        length: usize,
    },

    /// Forest serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization {
        /// What could not be read or written
        message: String,
    },

    /// File I/O errors
    #[error("I/O error: {source}")]
    IO {
        /// Underlying I/O error
        #[from]
        source: io::Error,
    },

    /// JSON serialization errors
    #[error("JSON error: {source}")]
    Json {
        /// Underlying serde_json error
        #[from]
        source: serde_json::Error,
    },

    /// Thread pool construction errors
    #[error("Threading error: {message}")]
    Threading {
        /// Why the pool could not be built
        message: String,
    },

    /// Internal library errors (should not occur in normal usage)
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the failure
        message: String,
    },
}

/// Type alias for Results using ForestError
pub type Result<T> = std::result::Result<T, ForestError>;

impl ForestError {
    /// Create an invalid argument error
    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        ForestError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create an invariant violation error
    pub fn invariant_violation<S: Into<String>>(message: S) -> Self {
        ForestError::InvariantViolation {
            message: message.into(),
        }
    }

    /// Create a structural mismatch error
    pub fn structural_mismatch<S: Into<String>>(message: S) -> Self {
        ForestError::StructuralMismatch {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        ForestError::Config {
            message: message.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter<P, V, R>(parameter: P, value: V, reason: R) -> Self
    where
        P: Into<String>,
        V: Into<String>,
        R: Into<String>,
    {
        ForestError::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a dimension mismatch error
    pub fn dimension_mismatch<E, A>(expected: E, actual: A) -> Self
    where
        E: Into<String>,
        A: Into<String>,
    {
        ForestError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an index out of bounds error
    pub fn index_out_of_bounds(index: usize, length: usize) -> Self {
        ForestError::IndexOutOfBounds { index, length }
    }

    /// Create a serialization error
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        ForestError::Serialization {
            message: message.into(),
        }
    }

    /// Create a threading error
    pub fn threading<S: Into<String>>(message: S) -> Self {
        ForestError::Threading {
            message: message.into(),
        }
    }

    /// Create an internal error (should be used sparingly)
    pub fn internal<S: Into<String>>(message: S) -> Self {
        ForestError::Internal {
            message: message.into(),
        }
    }

    /// Check if this error is recoverable.
    ///
    /// Recoverable errors leave the receiver in its previous state, so the
    /// caller may retry with corrected arguments.
    pub fn is_recoverable(&self) -> bool {
        match self {
            ForestError::InvalidArgument { .. } => true,
            ForestError::InvariantViolation { .. } => false,
            ForestError::StructuralMismatch { .. } => false,
            ForestError::Config { .. } => false,
            ForestError::InvalidParameter { .. } => false,
            ForestError::DimensionMismatch { .. } => true,
            ForestError::IndexOutOfBounds { .. } => false,
            ForestError::Serialization { .. } => false,
            ForestError::IO { .. } => false,
            ForestError::Json { .. } => false,
            ForestError::Threading { .. } => true,
            ForestError::Internal { .. } => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            ForestError::InvalidArgument { .. } => "invalid_argument",
            ForestError::InvariantViolation { .. } => "invariant_violation",
            ForestError::StructuralMismatch { .. } => "structural_mismatch",
            ForestError::Config { .. } => "config",
            ForestError::InvalidParameter { .. } => "invalid_parameter",
            ForestError::DimensionMismatch { .. } => "dimension_mismatch",
            ForestError::IndexOutOfBounds { .. } => "index_out_of_bounds",
            ForestError::Serialization { .. } => "serialization",
            ForestError::IO { .. } => "io",
            ForestError::Json { .. } => "json",
            ForestError::Threading { .. } => "threading",
            ForestError::Internal { .. } => "internal",
        }
    }
}

impl From<toml::de::Error> for ForestError {
    fn from(err: toml::de::Error) -> Self {
        ForestError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for ForestError {
    fn from(err: toml::ser::Error) -> Self {
        ForestError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<rayon::ThreadPoolBuildError> for ForestError {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        ForestError::Threading {
            message: err.to_string(),
        }
    }
}

/// Builds a [`ForestError::InvalidArgument`] from a message or format string.
#[macro_export]
macro_rules! invalid_argument {
    ($msg:expr) => {
        $crate::core::error::ForestError::invalid_argument($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::core::error::ForestError::invalid_argument(format!($fmt, $($arg)*))
    };
}

/// Builds a [`ForestError::InvariantViolation`] from a message or format string.
#[macro_export]
macro_rules! invariant_violation {
    ($msg:expr) => {
        $crate::core::error::ForestError::invariant_violation($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::core::error::ForestError::invariant_violation(format!($fmt, $($arg)*))
    };
}

/// Returns early with `$err` unless `$cond` holds.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !($cond) {
            return Err($err.into());
        }
    };
}
