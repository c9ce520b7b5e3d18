//! CSRF Token Service
//!
//! Issues and verifies the per-session anti-forgery token. The token is
//! 256 bits from the OS CSPRNG, hex-encoded, and compared in constant
//! time.

use platform::crypto::{constant_time_eq, random_hex};

use crate::domain::entity::SessionRecord;

/// Token size in bytes (256 bits)
const CSRF_TOKEN_BYTES: usize = 32;

/// Return the session's token, generating and storing one first if the
/// session has none. Idempotent within a session.
pub fn get_or_create_token(record: &mut SessionRecord) -> String {
    if let Some(token) = &record.csrf_token {
        return token.clone();
    }

    let token = random_hex(CSRF_TOKEN_BYTES);
    record.csrf_token = Some(token.clone());
    token
}

/// Verify a candidate against the session's token.
///
/// False when no token exists or the candidate is empty; never an
/// error. Constant-time comparison avoids a timing side channel.
pub fn verify(record: &SessionRecord, candidate: &str) -> bool {
    match &record.csrf_token {
        Some(token) if !candidate.is_empty() => {
            constant_time_eq(token.as_bytes(), candidate.as_bytes())
        }
        _ => false,
    }
}
