//! Registration workflow: user + role profile creation, OTP issuance, and
//! notification dispatch.

use tracing::{debug, error};

use super::error::AuthError;
use super::models::{OtpAction, RoleProfile, User};
use super::store::{AuthStore, CreateUserOutcome, Mailer, NewUser};
use super::utils::{normalize_email, valid_email};
use super::{hash, otp};

/// Register a customer account. The address is mandatory.
///
/// # Errors
/// See [`register`].
pub async fn register_customer(
    store: &dyn AuthStore,
    mailer: &dyn Mailer,
    username: &str,
    email: &str,
    password: &str,
    address: &str,
) -> Result<User, AuthError> {
    if address.trim().is_empty() {
        return Err(AuthError::MissingField("address"));
    }

    register(
        store,
        mailer,
        username,
        email,
        password,
        RoleProfile::Customer {
            address: address.trim().to_string(),
        },
    )
    .await
}

/// Register an admin account. The department is mandatory.
///
/// # Errors
/// See [`register`].
pub async fn register_admin(
    store: &dyn AuthStore,
    mailer: &dyn Mailer,
    username: &str,
    email: &str,
    password: &str,
    department: &str,
) -> Result<User, AuthError> {
    if department.trim().is_empty() {
        return Err(AuthError::MissingField("department"));
    }

    register(
        store,
        mailer,
        username,
        email,
        password,
        RoleProfile::Admin {
            department: department.trim().to_string(),
        },
    )
    .await
}

/// Shared registration path.
///
/// User, role profile, and OTP are durable before the notification attempt,
/// so a delivery failure never leaves the persisted state inconsistent and a
/// retry can re-issue the code.
///
/// # Errors
/// - [`AuthError::InvalidField`] / [`AuthError::MissingField`] on bad input.
/// - [`AuthError::DuplicateIdentity`] when email or username is taken.
/// - [`AuthError::Delivery`] when the notification sink rejects the code
///   email; the created rows are kept.
async fn register(
    store: &dyn AuthStore,
    mailer: &dyn Mailer,
    username: &str,
    email: &str,
    password: &str,
    profile: RoleProfile,
) -> Result<User, AuthError> {
    let email = normalize_email(email);
    if !valid_email(&email) {
        return Err(AuthError::InvalidField("email"));
    }

    let username = username.trim();
    if username.is_empty() {
        return Err(AuthError::MissingField("username"));
    }

    if password.is_empty() {
        return Err(AuthError::MissingField("password"));
    }

    let password_hash = hash::hash_password(password)?;

    let user = match store
        .create_user(NewUser {
            username: username.to_string(),
            email: email.clone(),
            password_hash,
            profile,
        })
        .await?
    {
        CreateUserOutcome::Created(user) => user,
        CreateUserOutcome::DuplicateIdentity => {
            debug!(%email, "registration rejected: identity already exists");
            return Err(AuthError::DuplicateIdentity);
        }
    };

    let code = otp::issue(store, user.id, OtpAction::Register).await?;

    mailer
        .send(
            &user.email,
            "Your verification code",
            &format!("Your one-time code is {}", code.code),
        )
        .map_err(|err| {
            error!(email = %user.email, "failed to deliver verification code: {err:?}");
            AuthError::Delivery(err)
        })?;

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::otp::OTP_CODE_LEN;
    use crate::auth::Role;
    use crate::store::mem::MemStore;
    use anyhow::{anyhow, Result};
    use std::sync::Mutex;

    struct RecordingMailer {
        sent: Mutex<Vec<(String, String, String)>>,
        fail: bool,
    }

    impl RecordingMailer {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        fn count(&self) -> usize {
            self.sent.lock().expect("mailer lock").len()
        }
    }

    impl Mailer for RecordingMailer {
        fn send(&self, to_email: &str, subject: &str, body: &str) -> Result<()> {
            if self.fail {
                return Err(anyhow!("smtp relay unavailable"));
            }
            self.sent.lock().expect("mailer lock").push((
                to_email.to_string(),
                subject.to_string(),
                body.to_string(),
            ));
            Ok(())
        }
    }

    #[tokio::test]
    async fn customer_registration_creates_user_profile_and_code() -> Result<()> {
        let store = MemStore::new();
        let mailer = RecordingMailer::new();

        let user = register_customer(
            &store,
            &mailer,
            "alice",
            " Alice@Example.COM ",
            "hunter2",
            "1 Main St",
        )
        .await?;

        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.role, Role::Customer);
        assert!(!user.is_verified);

        let profile = store.find_profile(user.id).await?;
        assert_eq!(
            profile,
            Some(RoleProfile::Customer {
                address: "1 Main St".to_string()
            })
        );

        let active = store.active_otps(user.id, OtpAction::Register);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].code.len(), OTP_CODE_LEN);
        assert!(active[0].code.chars().all(|c| c.is_ascii_alphanumeric()));

        assert_eq!(mailer.count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn admin_registration_requires_department() -> Result<()> {
        let store = MemStore::new();
        let mailer = RecordingMailer::new();

        let result = register_admin(
            &store,
            &mailer,
            "root",
            "root@example.com",
            "hunter2",
            "  ",
        )
        .await;
        assert!(matches!(result, Err(AuthError::MissingField("department"))));
        assert_eq!(mailer.count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn customer_registration_requires_address() -> Result<()> {
        let store = MemStore::new();
        let mailer = RecordingMailer::new();

        let result =
            register_customer(&store, &mailer, "alice", "alice@example.com", "hunter2", "").await;
        assert!(matches!(result, Err(AuthError::MissingField("address"))));
        Ok(())
    }

    #[tokio::test]
    async fn malformed_email_is_rejected_before_any_write() -> Result<()> {
        let store = MemStore::new();
        let mailer = RecordingMailer::new();

        let result =
            register_customer(&store, &mailer, "alice", "not-an-email", "hunter2", "addr").await;
        assert!(matches!(result, Err(AuthError::InvalidField("email"))));
        assert_eq!(store.user_count(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_email_leaves_no_partial_profile() -> Result<()> {
        let store = MemStore::new();
        let mailer = RecordingMailer::new();

        register_customer(
            &store,
            &mailer,
            "alice",
            "alice@example.com",
            "hunter2",
            "1 Main St",
        )
        .await?;

        let second = register_admin(
            &store,
            &mailer,
            "alice2",
            "alice@example.com",
            "hunter2",
            "ops",
        )
        .await;
        assert!(matches!(second, Err(AuthError::DuplicateIdentity)));

        assert_eq!(store.user_count(), 1);
        assert_eq!(store.profile_count(), 1);
        assert_eq!(mailer.count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() -> Result<()> {
        let store = MemStore::new();
        let mailer = RecordingMailer::new();

        register_customer(
            &store,
            &mailer,
            "alice",
            "alice@example.com",
            "hunter2",
            "1 Main St",
        )
        .await?;

        let second = register_customer(
            &store,
            &mailer,
            "alice",
            "other@example.com",
            "hunter2",
            "2 Main St",
        )
        .await;
        assert!(matches!(second, Err(AuthError::DuplicateIdentity)));
        Ok(())
    }

    #[tokio::test]
    async fn delivery_failure_keeps_durable_state() -> Result<()> {
        let store = MemStore::new();
        let mailer = RecordingMailer::failing();

        let result = register_customer(
            &store,
            &mailer,
            "alice",
            "alice@example.com",
            "hunter2",
            "1 Main St",
        )
        .await;
        assert!(matches!(result, Err(AuthError::Delivery(_))));

        // User, profile, and OTP were durable before the send attempt.
        let user = store
            .find_user_by_email("alice@example.com")
            .await?
            .ok_or_else(|| anyhow!("user missing"))?;
        assert!(store.find_profile(user.id).await?.is_some());
        assert_eq!(store.active_otps(user.id, OtpAction::Register).len(), 1);
        Ok(())
    }
}
