//! In-memory record store for local development (`--dsn memory`) and tests.
//!
//! The mutex is held across each operation, which gives the same
//! serialization guarantees the Postgres adapter gets from conditional
//! updates: exactly one of two racing consumers observes `consumed = false`.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::auth::models::{Otp, OtpAction, ResetTicketRecord, RoleProfile, User};
use crate::auth::store::{AuthStore, CreateUserOutcome, NewUser};

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    profiles: HashMap<Uuid, RoleProfile>,
    otps: Vec<Otp>,
    tickets: Vec<ResetTicketRecord>,
}

#[derive(Default)]
pub struct MemStore {
    inner: Mutex<Inner>,
}

impl MemStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>> {
        self.inner.lock().map_err(|_| anyhow!("store lock poisoned"))
    }

    /// Insert a bare user without a profile. Test seam for exercising the
    /// OTP/credential workflows in isolation.
    ///
    /// # Errors
    /// Returns an error if the lock is poisoned.
    pub fn seed_user(&self, username: &str, email: &str, password_hash: &str) -> Result<Uuid> {
        let mut inner = self.lock()?;
        let id = Uuid::new_v4();
        inner.users.insert(
            id,
            User {
                id,
                username: username.to_string(),
                email: email.to_string(),
                password_hash: password_hash.to_string(),
                is_verified: false,
                role: crate::auth::Role::Unset,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    /// Shift `issued_at` of every OTP for a user into the past. Expiry is
    /// absolute, so backdating issuance is equivalent to advancing the clock.
    pub fn backdate_otps(&self, user_id: Uuid, seconds: i64) {
        if let Ok(mut inner) = self.lock() {
            for otp in inner.otps.iter_mut().filter(|otp| otp.user_id == user_id) {
                otp.issued_at -= Duration::seconds(seconds);
            }
        }
    }

    /// Shift `issued_at` of every reset ticket for a user into the past.
    pub fn backdate_reset_tickets(&self, user_id: Uuid, seconds: i64) {
        if let Ok(mut inner) = self.lock() {
            for ticket in inner
                .tickets
                .iter_mut()
                .filter(|ticket| ticket.user_id == user_id)
            {
                ticket.issued_at -= Duration::seconds(seconds);
            }
        }
    }

    /// Unconsumed OTPs for (user, action), newest first.
    #[must_use]
    pub fn active_otps(&self, user_id: Uuid, action: OtpAction) -> Vec<Otp> {
        self.lock().map_or_else(
            |_| Vec::new(),
            |inner| {
                let mut rows: Vec<Otp> = inner
                    .otps
                    .iter()
                    .filter(|otp| otp.user_id == user_id && otp.action == action && !otp.consumed)
                    .cloned()
                    .collect();
                rows.sort_by(|a, b| b.issued_at.cmp(&a.issued_at));
                rows
            },
        )
    }

    #[must_use]
    pub fn user_count(&self) -> usize {
        self.lock().map_or(0, |inner| inner.users.len())
    }

    #[must_use]
    pub fn profile_count(&self) -> usize {
        self.lock().map_or(0, |inner| inner.profiles.len())
    }
}

#[async_trait]
impl AuthStore for MemStore {
    async fn create_user(&self, new_user: NewUser) -> Result<CreateUserOutcome> {
        let mut inner = self.lock()?;

        let collision = inner
            .users
            .values()
            .any(|user| user.email == new_user.email || user.username == new_user.username);
        if collision {
            return Ok(CreateUserOutcome::DuplicateIdentity);
        }

        let id = Uuid::new_v4();
        let user = User {
            id,
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            is_verified: false,
            role: new_user.profile.role(),
            created_at: Utc::now(),
        };
        inner.users.insert(id, user.clone());
        inner.profiles.insert(id, new_user.profile);

        Ok(CreateUserOutcome::Created(user))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let inner = self.lock()?;
        Ok(inner
            .users
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let inner = self.lock()?;
        Ok(inner.users.get(&id).cloned())
    }

    async fn find_profile(&self, user_id: Uuid) -> Result<Option<RoleProfile>> {
        let inner = self.lock()?;
        Ok(inner.profiles.get(&user_id).cloned())
    }

    async fn set_verified(&self, id: Uuid) -> Result<()> {
        let mut inner = self.lock()?;
        let user = inner
            .users
            .get_mut(&id)
            .ok_or_else(|| anyhow!("no user {id}"))?;
        user.is_verified = true;
        Ok(())
    }

    async fn set_password(&self, id: Uuid, password_hash: &str) -> Result<()> {
        let mut inner = self.lock()?;
        let user = inner
            .users
            .get_mut(&id)
            .ok_or_else(|| anyhow!("no user {id}"))?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn insert_otp(&self, otp: &Otp) -> Result<()> {
        let mut inner = self.lock()?;
        for row in inner
            .otps
            .iter_mut()
            .filter(|row| row.user_id == otp.user_id && row.action == otp.action && !row.consumed)
        {
            row.consumed = true;
        }
        inner.otps.push(otp.clone());
        Ok(())
    }

    async fn find_unconsumed_otp(
        &self,
        user_id: Uuid,
        code: &str,
        action: OtpAction,
    ) -> Result<Option<Otp>> {
        let inner = self.lock()?;
        Ok(inner
            .otps
            .iter()
            .filter(|otp| {
                otp.user_id == user_id && otp.code == code && otp.action == action && !otp.consumed
            })
            .max_by_key(|otp| otp.issued_at)
            .cloned())
    }

    async fn consume_otp(&self, otp_id: Uuid) -> Result<bool> {
        let mut inner = self.lock()?;
        let Some(otp) = inner.otps.iter_mut().find(|otp| otp.id == otp_id) else {
            return Ok(false);
        };
        if otp.consumed {
            return Ok(false);
        }
        otp.consumed = true;
        Ok(true)
    }

    async fn insert_reset_ticket(
        &self,
        user_id: Uuid,
        token_hash: &[u8],
        issued_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut inner = self.lock()?;
        inner.tickets.push(ResetTicketRecord {
            user_id,
            token_hash: token_hash.to_vec(),
            issued_at,
            used: false,
        });
        Ok(())
    }

    async fn consume_reset_ticket(
        &self,
        user_id: Uuid,
        token_hash: &[u8],
        issued_after: DateTime<Utc>,
    ) -> Result<bool> {
        let mut inner = self.lock()?;
        let Some(ticket) = inner.tickets.iter_mut().find(|ticket| {
            ticket.user_id == user_id
                && ticket.token_hash == token_hash
                && !ticket.used
                && ticket.issued_at > issued_after
        }) else {
            return Ok(false);
        };
        ticket.used = true;
        Ok(true)
    }
}
