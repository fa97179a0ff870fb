//! Collaborator contracts consumed by the workflows: persistence
//! ([`AuthStore`]) and notification ([`Mailer`]).

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::models::{Otp, OtpAction, RoleProfile, User};

/// Parameters for a transactional user + profile creation.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub profile: RoleProfile,
}

/// Outcome when attempting to create a new user + role profile.
#[derive(Debug)]
pub enum CreateUserOutcome {
    Created(User),
    /// Email or username collided with a store-level unique constraint.
    DuplicateIdentity,
}

/// Record store contract. Implementations must provide the atomicity the
/// workflows rely on: user + profile creation is one transaction, uniqueness
/// is a store-level constraint, and OTP/ticket consumption is a conditional
/// update so a double-submit loses cleanly.
#[async_trait]
pub trait AuthStore: Send + Sync {
    /// Create the user and its role profile atomically. Either both rows
    /// exist afterwards or neither does.
    async fn create_user(&self, new_user: NewUser) -> Result<CreateUserOutcome>;

    /// Look up a user by normalized email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Fetch the role profile linked 1:1 to a user, if any.
    async fn find_profile(&self, user_id: Uuid) -> Result<Option<RoleProfile>>;

    /// Mark the user verified.
    async fn set_verified(&self, id: Uuid) -> Result<()>;

    /// Replace the stored password digest.
    async fn set_password(&self, id: Uuid, password_hash: &str) -> Result<()>;

    /// Persist a freshly issued OTP, marking prior unconsumed codes for the
    /// same (user, action) pair consumed in the same transaction.
    async fn insert_otp(&self, otp: &Otp) -> Result<()>;

    /// Find the most recent unconsumed OTP matching (user, code, action).
    async fn find_unconsumed_otp(
        &self,
        user_id: Uuid,
        code: &str,
        action: OtpAction,
    ) -> Result<Option<Otp>>;

    /// Flip `consumed` on a single OTP row. Returns `false` when the row was
    /// already consumed, so exactly one of two racing consumers wins.
    async fn consume_otp(&self, otp_id: Uuid) -> Result<bool>;

    /// Persist a reset-ticket hash issued at `issued_at`.
    async fn insert_reset_ticket(
        &self,
        user_id: Uuid,
        token_hash: &[u8],
        issued_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Atomically consume an unused ticket issued after `issued_after`.
    /// Returns `false` when no live ticket matched.
    async fn consume_reset_ticket(
        &self,
        user_id: Uuid,
        token_hash: &[u8],
        issued_after: DateTime<Utc>,
    ) -> Result<bool>;
}

/// Notification sink. Delivery failure propagates to the caller; it is never
/// swallowed, and already-persisted state is not rolled back.
pub trait Mailer: Send + Sync {
    /// Deliver a message or return an error.
    ///
    /// # Errors
    /// Returns an error when the underlying transport rejects the message.
    fn send(&self, to_email: &str, subject: &str, body: &str) -> Result<()>;
}
