//! Verification workflow: consumes an OTP, transitions the user's
//! verification state, and branches on the action that issued the code.

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use super::error::AuthError;
use super::models::{OtpAction, User};
use super::store::AuthStore;
use super::utils::{generate_reset_ticket, hash_reset_ticket};
use super::otp;

/// Reset tickets outlive their OTP by a short margin only.
pub const RESET_TICKET_TTL_SECONDS: i64 = 900;

/// What the boundary should do after a successful verification.
#[derive(Debug)]
pub enum VerifyOutcome {
    /// Registration verified; the caller establishes a session for the user.
    LoggedIn(User),
    /// Reset verified; no session. The single-use raw ticket must accompany
    /// the confirm step.
    ProceedToReset { user_id: Uuid, reset_ticket: String },
}

/// Consume the OTP for (user, code, action) and advance the state machine.
///
/// On success the user is marked verified for both actions; the source system
/// behaved this way for `password_reset` too and the behavior is preserved.
///
/// # Errors
/// Surfaces [`AuthError::OtpNotFound`] / [`AuthError::OtpExpired`] from the
/// engine without mutating any state.
pub async fn verify(
    store: &dyn AuthStore,
    user_id: Uuid,
    code: &str,
    action: OtpAction,
) -> Result<VerifyOutcome, AuthError> {
    otp::consume(store, user_id, code, action).await?;

    let mut user = store
        .find_user_by_id(user_id)
        .await?
        .ok_or(AuthError::UnknownIdentity)?;

    store.set_verified(user_id).await?;
    user.is_verified = true;

    debug!(%user_id, %action, "one-time code verified");

    match action {
        OtpAction::Register => Ok(VerifyOutcome::LoggedIn(user)),
        OtpAction::PasswordReset => {
            let ticket = generate_reset_ticket()?;
            store
                .insert_reset_ticket(user_id, &hash_reset_ticket(&ticket), Utc::now())
                .await?;
            Ok(VerifyOutcome::ProceedToReset {
                user_id,
                reset_ticket: ticket,
            })
        }
    }
}
