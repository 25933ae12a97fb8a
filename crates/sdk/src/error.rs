//! SDK Error Types

use thiserror::Error;

/// SDK Result type
pub type Result<T> = std::result::Result<T, SdkError>;

// Application error codes returned by the daemon
const CODE_VALIDATION: i32 = 4000;
const CODE_NOT_FOUND: i32 = 4001;
const CODE_CONFLICT: i32 = 4002;
const CODE_THROTTLED: i32 = 4003;
const CODE_FORBIDDEN: i32 = 4004;
const CODE_BUSY: i32 = 5003;

/// SDK Error
#[derive(Debug, Error)]
pub enum SdkError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("RPC error ({code}): {message}")]
    Rpc { code: i32, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl SdkError {
    fn code(&self) -> Option<i32> {
        match self {
            SdkError::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.code() == Some(CODE_VALIDATION)
    }

    pub fn is_not_found(&self) -> bool {
        self.code() == Some(CODE_NOT_FOUND)
    }

    /// Wrong state for the request (paused queue, served entry, live entries on delete)
    pub fn is_conflict(&self) -> bool {
        self.code() == Some(CODE_CONFLICT)
    }

    pub fn is_forbidden(&self) -> bool {
        self.code() == Some(CODE_FORBIDDEN)
    }

    /// Worth repeating later unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self.code(), Some(CODE_BUSY) | Some(CODE_THROTTLED))
    }
}

impl From<jsonrpsee::core::ClientError> for SdkError {
    fn from(e: jsonrpsee::core::ClientError) -> Self {
        match e {
            jsonrpsee::core::ClientError::Call(call_err) => SdkError::Rpc {
                code: call_err.code(),
                message: call_err.message().to_string(),
            },
            jsonrpsee::core::ClientError::Transport(e) => {
                SdkError::Transport(format!("Transport error: {}", e))
            }
            jsonrpsee::core::ClientError::RestartNeeded(_) => {
                SdkError::Connection("Connection restart needed".to_string())
            }
            jsonrpsee::core::ClientError::ParseError(e) => {
                SdkError::Other(format!("Parse error: {}", e))
            }
            _ => SdkError::Other(e.to_string()),
        }
    }
}
