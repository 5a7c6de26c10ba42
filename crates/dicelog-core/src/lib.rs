// Core domain logic for the dicelog log-sharing backend
//
// Pure crate: record construction, storage key generation, upload
// validation and error classification. No async, no I/O.

mod error;
mod key;
mod record;
mod validate;

pub use error::ApiError;
pub use key::{StorageKey, KEY_LEN, PASSWORD_MAX, PASSWORD_MIN};
pub use record::{StoredRecord, CLIENT_TAG};
pub use validate::{
    check_content_length, check_file_size, check_uniform_id, is_valid_uniform_id,
    DEFAULT_MAX_UPLOAD_BYTES,
};
