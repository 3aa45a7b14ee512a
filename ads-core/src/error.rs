use crate::error_code::AdsErrorCode;
use thiserror::Error;

/// Main error type for ADS operations
///
/// Variants fall into four families:
/// - configuration errors, raised synchronously while building a session
/// - protocol errors, fatal for the session that observed them
/// - device errors, carrying a non-zero ADS return code
/// - transport errors, raised by the byte stream underneath
#[derive(Error, Debug)]
pub enum AdsError {
    #[error("Connection error: {0}")]
    Connection(#[from] std::io::Error),

    #[error("Timeout")]
    Timeout,

    #[error("Session closed")]
    SessionClosed,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid AMS address: {0}")]
    InvalidAddress(String),

    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("No pending request for invoke id {0}")]
    UnmatchedResponse(u32),

    #[error("Invoke id {0} is still pending")]
    InvokeIdCollision(u32),

    #[error("Device error: {0}")]
    Device(AdsErrorCode),

    #[error("Could not resolve handle for symbol '{symbol}': {reason}")]
    HandleResolution { symbol: String, reason: String },

    #[error("Field '{0}' holds no value")]
    MissingFieldValue(String),

    #[error("Field '{field}' expects {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: String,
    },

    #[error("String of {len} bytes does not fit into STRING({capacity})")]
    StringTooLong { len: usize, capacity: usize },

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl AdsError {
    /// Whether the error terminates the session that observed it
    ///
    /// Protocol violations and transport failures are fatal; device and
    /// marshalling errors leave the session usable.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AdsError::Connection(_)
                | AdsError::Timeout
                | AdsError::SessionClosed
                | AdsError::MalformedFrame(_)
                | AdsError::UnmatchedResponse(_)
                | AdsError::InvokeIdCollision(_)
        )
    }

    /// The ADS return code carried by a device error, if any
    pub fn device_code(&self) -> Option<u32> {
        match self {
            AdsError::Device(code) => Some(code.code()),
            _ => None,
        }
    }
}

/// Result type alias for ADS operations
pub type AdsResult<T> = Result<T, AdsError>;
