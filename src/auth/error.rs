//! Typed failure taxonomy returned by every workflow.
//!
//! Workflows never recover silently; the HTTP layer alone translates these
//! into status codes and user-facing messages.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed caller input (bad email format and the like).
    #[error("invalid {0}")]
    InvalidField(&'static str),

    /// A mandatory field was empty or absent.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Email or username already registered.
    #[error("a user with that email or username already exists")]
    DuplicateIdentity,

    /// No matching unconsumed code. Wrong code and already-consumed code
    /// surface identically, so there is no code-guessing oracle.
    #[error("invalid one-time code")]
    OtpNotFound,

    /// The code matched but its 300-second validity window has passed.
    #[error("one-time code expired")]
    OtpExpired,

    /// No user for the presented identity.
    #[error("no account matches that identity")]
    UnknownIdentity,

    /// Password did not match the stored digest.
    #[error("invalid credentials")]
    BadCredential,

    /// Credentials are correct but the account was never verified.
    #[error("account is not verified")]
    NotVerified,

    /// New password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// New password must differ from the current one.
    #[error("new password must differ from the old password")]
    SamePassword,

    /// Reset ticket missing, already used, or past its validity window.
    #[error("invalid or expired reset ticket")]
    InvalidTicket,

    /// The notification sink rejected the message. Persisted state is kept:
    /// at-least-once issuance, best-effort notify.
    #[error("notification delivery failed")]
    Delivery(#[source] anyhow::Error),

    /// Store-level failure (connection, constraint decode, ...).
    #[error("storage failure")]
    Store(#[from] anyhow::Error),
}
