use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session token payload. Only the subject identifies the caller; the role is
/// looked up per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    /// Unix seconds.
    pub iat: usize,
    /// Unix seconds; `iat` plus the configured TTL.
    pub exp: usize,
    pub iss: String,
    pub aud: String,
}
