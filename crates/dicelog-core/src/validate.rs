use crate::error::ApiError;

/// Default ceiling for uploaded payloads (2 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024;

/// Check the `uniform_id` field against the required shape: one or more
/// non-colon characters, a colon, one or more ASCII digits
/// (e.g. `"platform:123456"`).
pub fn is_valid_uniform_id(uniform_id: &str) -> bool {
    match uniform_id.split_once(':') {
        Some((head, digits)) => {
            !head.is_empty()
                && !digits.is_empty()
                && digits.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

pub fn check_uniform_id(uniform_id: &str) -> Result<(), ApiError> {
    if is_valid_uniform_id(uniform_id) {
        Ok(())
    } else {
        Err(ApiError::InvalidUniformId)
    }
}

/// Pre-read check against the declared Content-Length, so oversized
/// bodies are rejected before being consumed.
pub fn check_content_length(declared: u64, limit: usize) -> Result<(), ApiError> {
    if declared > limit as u64 {
        Err(ApiError::ContentTooLarge { declared, limit })
    } else {
        Ok(())
    }
}

/// Post-read check on the actual file bytes, guarding against a caller
/// lying about its Content-Length.
pub fn check_file_size(size: usize, limit: usize) -> Result<(), ApiError> {
    if size > limit {
        Err(ApiError::FileTooLarge { size, limit })
    } else {
        Ok(())
    }
}
