//! Credential workflow: login, password reset, and password change.

use chrono::{Duration, Utc};
use tracing::{debug, error};
use uuid::Uuid;

use super::error::AuthError;
use super::models::{OtpAction, User};
use super::store::{AuthStore, Mailer};
use super::utils::{hash_reset_ticket, normalize_email};
use super::verification::RESET_TICKET_TTL_SECONDS;
use super::{hash, otp};

/// Validate credentials and return the user for session establishment.
///
/// # Errors
/// [`AuthError::UnknownIdentity`] for an unknown email,
/// [`AuthError::BadCredential`] on digest mismatch, and
/// [`AuthError::NotVerified`] for a correct password on an unverified
/// account. A session is never established for an unverified user.
pub async fn login(store: &dyn AuthStore, email: &str, password: &str) -> Result<User, AuthError> {
    let email = normalize_email(email);
    let user = store
        .find_user_by_email(&email)
        .await?
        .ok_or(AuthError::UnknownIdentity)?;

    if !hash::verify_password(password, &user.password_hash) {
        debug!(%email, "login rejected: bad credential");
        return Err(AuthError::BadCredential);
    }

    if !user.is_verified {
        debug!(%email, "login rejected: account not verified");
        return Err(AuthError::NotVerified);
    }

    Ok(user)
}

/// Begin a password reset: issue an OTP bound to `password_reset` and send
/// it to the account email. Returns the user id the boundary threads into
/// the verification step.
///
/// # Errors
/// [`AuthError::UnknownIdentity`] when no account matches;
/// [`AuthError::Delivery`] when the notification sink rejects the message
/// (the issued code stays durable).
pub async fn request_password_reset(
    store: &dyn AuthStore,
    mailer: &dyn Mailer,
    email: &str,
) -> Result<Uuid, AuthError> {
    let email = normalize_email(email);
    let user = store
        .find_user_by_email(&email)
        .await?
        .ok_or(AuthError::UnknownIdentity)?;

    let code = otp::issue(store, user.id, OtpAction::PasswordReset).await?;

    mailer
        .send(
            &user.email,
            "Your password reset code",
            &format!("Your one-time code is {}", code.code),
        )
        .map_err(|err| {
            error!(email = %user.email, "failed to deliver reset code: {err:?}");
            AuthError::Delivery(err)
        })?;

    Ok(user.id)
}

/// Complete a password reset using the single-use ticket minted by a prior
/// successful `password_reset` verification.
///
/// The mismatch check runs before the ticket is consumed so a typo does not
/// burn the ticket.
///
/// # Errors
/// [`AuthError::PasswordMismatch`] when the confirmation differs,
/// [`AuthError::MissingField`] for an empty password, and
/// [`AuthError::InvalidTicket`] when no live unused ticket matches.
pub async fn confirm_password_reset(
    store: &dyn AuthStore,
    user_id: Uuid,
    reset_ticket: &str,
    new_password: &str,
    confirm_password: &str,
) -> Result<(), AuthError> {
    if new_password != confirm_password {
        return Err(AuthError::PasswordMismatch);
    }

    if new_password.is_empty() {
        return Err(AuthError::MissingField("new_password"));
    }

    let issued_after = Utc::now() - Duration::seconds(RESET_TICKET_TTL_SECONDS);
    let consumed = store
        .consume_reset_ticket(user_id, &hash_reset_ticket(reset_ticket), issued_after)
        .await?;
    if !consumed {
        return Err(AuthError::InvalidTicket);
    }

    let digest = hash::hash_password(new_password)?;
    store.set_password(user_id, &digest).await?;

    debug!(%user_id, "password reset completed");

    Ok(())
}

/// Change the password of an authenticated account after re-checking the old
/// one, then send a confirmation notification.
///
/// # Errors
/// [`AuthError::BadCredential`] on old-password mismatch and
/// [`AuthError::SamePassword`] when nothing would change.
pub async fn change_password(
    store: &dyn AuthStore,
    mailer: &dyn Mailer,
    email: &str,
    old_password: &str,
    new_password: &str,
) -> Result<(), AuthError> {
    let email = normalize_email(email);
    let user = store
        .find_user_by_email(&email)
        .await?
        .ok_or(AuthError::UnknownIdentity)?;

    if !hash::verify_password(old_password, &user.password_hash) {
        return Err(AuthError::BadCredential);
    }

    if new_password == old_password {
        return Err(AuthError::SamePassword);
    }

    if new_password.is_empty() {
        return Err(AuthError::MissingField("new_password"));
    }

    let digest = hash::hash_password(new_password)?;
    store.set_password(user.id, &digest).await?;

    mailer
        .send(
            &user.email,
            "Password changed",
            "Your password has been changed successfully.",
        )
        .map_err(|err| {
            error!(email = %user.email, "failed to deliver change notice: {err:?}");
            AuthError::Delivery(err)
        })?;

    Ok(())
}
