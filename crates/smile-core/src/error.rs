//! Error types for Smile

use std::fmt;
use thiserror::Error;

/// The main error type for Smile operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SmileError {
    /// Bad arguments, malformed image data, invalid format or bit widths
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A backend call failed
    #[error("Internal error: {0}")]
    InternalError(String),

    /// An allocation could not be satisfied
    #[error("Memory error: {0}")]
    MemError(String),

    /// The operation was redundant (unloading twice, reloading loaded resources)
    #[error("Already done: {0}")]
    Already(String),

    /// The decoder reported an unrecoverable parse failure
    #[error("Logic error: {0}")]
    LogicError(String),

    #[error("Context is not initialized")]
    NotInitialized,
}

/// Result type alias for Smile operations
pub type Result<T> = std::result::Result<T, SmileError>;

impl SmileError {
    pub fn code(&self) -> ResultCode {
        match self {
            SmileError::InvalidInput(_) => ResultCode::InvalidInput,
            SmileError::InternalError(_) => ResultCode::InternalError,
            SmileError::MemError(_) => ResultCode::MemError,
            SmileError::Already(_) => ResultCode::Already,
            SmileError::LogicError(_) => ResultCode::LogicError,
            SmileError::NotInitialized => ResultCode::NotInitialized,
        }
    }

    pub fn is_already(&self) -> bool {
        matches!(self, SmileError::Already(_))
    }
}

/// Flat result code reported across the context surface
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResultCode {
    Ok,
    InvalidInput,
    InternalError,
    MemError,
    Already,
    LogicError,
    NotInitialized,
}

impl ResultCode {
    /// Collapse a result into its code
    pub fn of<T>(result: &Result<T>) -> Self {
        match result {
            Ok(_) => ResultCode::Ok,
            Err(e) => e.code(),
        }
    }

    /// Stable name of the code, as shown in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultCode::Ok => "Ok",
            ResultCode::InvalidInput => "InvalidInput",
            ResultCode::InternalError => "InternalError",
            ResultCode::MemError => "MemError",
            ResultCode::Already => "Already",
            ResultCode::LogicError => "LogicError",
            ResultCode::NotInitialized => "NotInitialized",
        }
    }

    pub fn is_ok(&self) -> bool {
        *self == ResultCode::Ok
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_names() {
        assert_eq!(ResultCode::Ok.to_string(), "Ok");
        assert_eq!(ResultCode::NotInitialized.as_str(), "NotInitialized");
        assert_eq!(
            SmileError::MemError("png".into()).code().as_str(),
            "MemError"
        );
    }

    #[test]
    fn test_code_of_result() {
        let ok: Result<u32> = Ok(7);
        assert_eq!(ResultCode::of(&ok), ResultCode::Ok);

        let err: Result<u32> = Err(SmileError::Already("unload".into()));
        assert_eq!(ResultCode::of(&err), ResultCode::Already);
        assert!(err.unwrap_err().is_already());
    }

    #[test]
    fn test_error_display() {
        let err = SmileError::InvalidInput("missing PNG signature".into());
        assert_eq!(err.to_string(), "Invalid input: missing PNG signature");
        assert_eq!(
            SmileError::NotInitialized.to_string(),
            "Context is not initialized"
        );
    }
}
