//! OTP engine: issues, validates, and expires one-time codes bound to a user
//! and an action.

use chrono::{Duration, Utc};
use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use tracing::debug;
use uuid::Uuid;

use super::error::AuthError;
use super::models::{Otp, OtpAction};
use super::store::AuthStore;

/// Code length in characters.
pub const OTP_CODE_LEN: usize = 6;

/// Absolute validity window after issuance, in seconds.
pub const OTP_TTL_SECONDS: i64 = 300;

/// Generate a code drawn uniformly from the 62-character alphanumeric
/// alphabet, using the operating system CSPRNG.
#[must_use]
pub fn generate_code() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(OTP_CODE_LEN)
        .map(char::from)
        .collect()
}

/// Issue a fresh OTP for (user, action).
///
/// Prior unconsumed codes for the same pair are invalidated by the store in
/// the same transaction, so at most one code is live per pair. Notification
/// dispatch is the caller's responsibility.
///
/// # Errors
/// Returns [`AuthError::Store`] when persistence fails.
pub async fn issue(
    store: &dyn AuthStore,
    user_id: Uuid,
    action: OtpAction,
) -> Result<Otp, AuthError> {
    let otp = Otp {
        id: Uuid::new_v4(),
        user_id,
        code: generate_code(),
        action,
        issued_at: Utc::now(),
        consumed: false,
    };

    store.insert_otp(&otp).await?;

    debug!(%user_id, %action, "issued one-time code");

    Ok(otp)
}

/// Consume an OTP matching (user, code, action).
///
/// # Errors
/// - [`AuthError::OtpNotFound`] when no unconsumed row matches; a wrong code
///   and an already-consumed code surface identically.
/// - [`AuthError::OtpExpired`] past the validity window; the row is left
///   unconsumed so the caller may prompt a resend.
/// - [`AuthError::OtpNotFound`] when a concurrent consumer won the
///   conditional update.
pub async fn consume(
    store: &dyn AuthStore,
    user_id: Uuid,
    code: &str,
    action: OtpAction,
) -> Result<(), AuthError> {
    let otp = store
        .find_unconsumed_otp(user_id, code, action)
        .await?
        .ok_or(AuthError::OtpNotFound)?;

    if Utc::now() - otp.issued_at > Duration::seconds(OTP_TTL_SECONDS) {
        return Err(AuthError::OtpExpired);
    }

    if !store.consume_otp(otp.id).await? {
        // Lost the race against another consumer of the same row.
        return Err(AuthError::OtpNotFound);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mem::MemStore;
    use anyhow::Result;

    fn charset_ok(code: &str) -> bool {
        code.chars().all(|c| c.is_ascii_alphanumeric())
    }

    #[test]
    fn generated_codes_are_six_alphanumeric_chars() {
        for _ in 0..32 {
            let code = generate_code();
            assert_eq!(code.len(), OTP_CODE_LEN);
            assert!(charset_ok(&code));
        }
    }

    #[tokio::test]
    async fn consume_marks_code_and_second_attempt_fails() -> Result<()> {
        let store = MemStore::new();
        let user_id = store.seed_user("alice", "alice@example.com", "digest")?;

        let otp = issue(&store, user_id, OtpAction::Register).await?;
        consume(&store, user_id, &otp.code, OtpAction::Register).await?;

        let again = consume(&store, user_id, &otp.code, OtpAction::Register).await;
        assert!(matches!(again, Err(AuthError::OtpNotFound)));
        Ok(())
    }

    #[tokio::test]
    async fn wrong_code_is_not_found() -> Result<()> {
        let store = MemStore::new();
        let user_id = store.seed_user("alice", "alice@example.com", "digest")?;

        issue(&store, user_id, OtpAction::Register).await?;
        let result = consume(&store, user_id, "zzzzzz", OtpAction::Register).await;
        assert!(matches!(result, Err(AuthError::OtpNotFound)));
        Ok(())
    }

    #[tokio::test]
    async fn action_is_part_of_the_binding() -> Result<()> {
        let store = MemStore::new();
        let user_id = store.seed_user("alice", "alice@example.com", "digest")?;

        let otp = issue(&store, user_id, OtpAction::Register).await?;
        let result = consume(&store, user_id, &otp.code, OtpAction::PasswordReset).await;
        assert!(matches!(result, Err(AuthError::OtpNotFound)));
        Ok(())
    }

    #[tokio::test]
    async fn expired_code_is_rejected_but_left_unconsumed() -> Result<()> {
        let store = MemStore::new();
        let user_id = store.seed_user("alice", "alice@example.com", "digest")?;

        let otp = issue(&store, user_id, OtpAction::Register).await?;
        store.backdate_otps(user_id, OTP_TTL_SECONDS + 1);

        let result = consume(&store, user_id, &otp.code, OtpAction::Register).await;
        assert!(matches!(result, Err(AuthError::OtpExpired)));

        // The row stays unconsumed, ready for a resend prompt upstream.
        let row = store
            .find_unconsumed_otp(user_id, &otp.code, OtpAction::Register)
            .await?;
        assert!(row.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn code_just_inside_the_window_is_accepted() -> Result<()> {
        let store = MemStore::new();
        let user_id = store.seed_user("alice", "alice@example.com", "digest")?;

        let otp = issue(&store, user_id, OtpAction::Register).await?;
        store.backdate_otps(user_id, OTP_TTL_SECONDS - 1);

        consume(&store, user_id, &otp.code, OtpAction::Register).await?;
        Ok(())
    }

    #[tokio::test]
    async fn reissue_invalidates_prior_code() -> Result<()> {
        let store = MemStore::new();
        let user_id = store.seed_user("alice", "alice@example.com", "digest")?;

        let first = issue(&store, user_id, OtpAction::Register).await?;
        let second = issue(&store, user_id, OtpAction::Register).await?;

        let stale = consume(&store, user_id, &first.code, OtpAction::Register).await;
        assert!(matches!(stale, Err(AuthError::OtpNotFound)));

        consume(&store, user_id, &second.code, OtpAction::Register).await?;
        Ok(())
    }

    #[tokio::test]
    async fn reissue_for_other_action_keeps_code_alive() -> Result<()> {
        let store = MemStore::new();
        let user_id = store.seed_user("alice", "alice@example.com", "digest")?;

        let register = issue(&store, user_id, OtpAction::Register).await?;
        issue(&store, user_id, OtpAction::PasswordReset).await?;

        consume(&store, user_id, &register.code, OtpAction::Register).await?;
        Ok(())
    }
}
