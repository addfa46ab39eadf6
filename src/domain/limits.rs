//! Upload size limits of the Bot API.

use super::entities::DEFAULT_API_BASE_URL;

const MB: u64 = 1024 * 1024;

/// Document size limit of the public cloud Bot API.
pub const CLOUD_UPLOAD_LIMIT: u64 = 50 * MB;

/// Document size limit of a self-hosted Bot API server.
pub const LOCAL_UPLOAD_LIMIT: u64 = 2000 * MB;

/// Picks the limit for `api_base_url`.
///
/// Only the exact public URL gets the cloud limit: a trailing slash or a
/// different scheme case counts as a self-hosted server.
pub fn upload_size_limit(api_base_url: &str) -> u64 {
    if api_base_url == DEFAULT_API_BASE_URL {
        CLOUD_UPLOAD_LIMIT
    } else {
        LOCAL_UPLOAD_LIMIT
    }
}
