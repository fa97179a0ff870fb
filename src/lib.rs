//! # Kunci (User Authentication Backend)
//!
//! `kunci` is a user-authentication service supporting two account roles
//! (customer, admin), email-based registration with one-time-passcode (OTP)
//! verification, login, password reset, and password change.
//!
//! ## Verification Model (OTP)
//!
//! Registration and password reset both prove email possession with a short
//! 6-character one-time passcode delivered out of band:
//!
//! - **Expiry:** Codes expire 300 seconds after issuance (absolute, not sliding).
//! - **Single use:** A code is consumed exactly once; re-validating a consumed
//!   code is indistinguishable from a wrong code.
//! - **Re-issuance:** Issuing a new code for the same (user, action) pair
//!   invalidates earlier unconsumed codes, so at most one code is live per pair.
//!
//! ## Password Reset
//!
//! A successful OTP verification for `password_reset` returns a single-use
//! reset ticket; the confirm step requires it, so the reset cannot be replayed
//! or reached out of sequence. Only ticket hashes touch the database.
//!
//! ## Collaborators
//!
//! Persistence ([`auth::AuthStore`]) and notification ([`auth::Mailer`]) are
//! traits: production wires Postgres (sqlx) and SMTP (lettre); local dev and
//! tests wire the in-memory store and a logging mailer.

pub mod api;
pub mod auth;
pub mod cli;
pub mod mailer;
pub mod store;
