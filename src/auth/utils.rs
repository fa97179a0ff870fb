//! Small helpers for input validation and reset-ticket handling.

use anyhow::{Context, Result};
use base64::Engine;
use rand::{rngs::OsRng, RngCore};
use regex::Regex;
use sha2::{Digest, Sha256};

/// Normalize an email for lookup/uniqueness checks.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
#[must_use]
pub fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

/// Create a new raw reset ticket.
///
/// The raw value is only returned to the verified caller; the store keeps a
/// hash.
///
/// # Errors
/// Returns an error if the system RNG fails.
pub fn generate_reset_ticket() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate reset ticket")?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

/// Hash a reset ticket so raw values never touch the database.
#[must_use]
pub fn hash_reset_ticket(ticket: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(ticket.as_bytes());
    hasher.finalize().to_vec()
}
