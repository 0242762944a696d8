//! Opaque session tokens.
//!
//! A token is 32 random bytes, hex-encoded (64 chars). Only its SHA-256
//! digest is stored, so a leaked sessions table cannot be replayed.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Generate a fresh session token.
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}

/// Hex SHA-256 digest of a token, the form kept in storage.
pub fn token_digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
