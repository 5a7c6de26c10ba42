use serde_json::{json, Value};

/// Core error classification for upload and retrieval requests
///
/// Each variant knows its HTTP status code and the exact JSON body the
/// client receives. The response payloads are part of the wire contract
/// and must not drift.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    // 400-level: client errors
    #[error("uniform_id field did not pass validation")]
    InvalidUniformId,

    #[error("declared content length {declared} exceeds limit of {limit} bytes")]
    ContentTooLarge { declared: u64, limit: usize },

    #[error("file size {size} exceeds limit of {limit} bytes")]
    FileTooLarge { size: usize, limit: usize },

    #[error("missing key or password")]
    MissingCredentials,

    #[error("no record stored under the requested key")]
    NotFound,

    // 500-level: server errors
    #[error("storage operation failed: {message}")]
    StorageFailed { message: String },

    #[error("{message}")]
    Internal { message: String },
}

impl ApiError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidUniformId => 400,
            Self::ContentTooLarge { .. } => 413,
            Self::FileTooLarge { .. } => 413,
            Self::MissingCredentials => 400,
            Self::NotFound => 404,
            Self::StorageFailed { .. } => 500,
            Self::Internal { .. } => 500,
        }
    }

    /// Client-facing JSON body for this error
    ///
    /// The two 413 variants carry distinct payloads: the Content-Length
    /// pre-check reports the configured ceiling, the post-read check uses
    /// the short rejection message.
    pub fn body(&self) -> Value {
        match self {
            Self::InvalidUniformId => {
                json!({"data": "uniform_id field did not pass validation"})
            }
            Self::ContentTooLarge { limit, .. } => json!({
                "success": false,
                "message": format!("File size exceeds {}MB limit", limit / (1024 * 1024)),
            }),
            Self::FileTooLarge { .. } => json!({"data": "Size is too big!"}),
            Self::MissingCredentials => json!({"error": "Missing key or password"}),
            Self::NotFound => json!({"error": "Data not found"}),
            Self::StorageFailed { .. } | Self::Internal { .. } => {
                json!({"error": "Internal Server Error"})
            }
        }
    }
}
