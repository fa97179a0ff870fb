//! Postgres record store (sqlx).
//!
//! Uniqueness rests on the schema's unique constraints (SQLSTATE 23505 maps
//! to a duplicate outcome), user + profile creation runs in one transaction,
//! and OTP/ticket consumption is a conditional `UPDATE ... WHERE` so racing
//! consumers serialize at the row.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, FromRow, PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use crate::auth::models::{Otp, OtpAction, Role, RoleProfile, User};
use crate::auth::store::{AuthStore, CreateUserOutcome, NewUser};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn decode_error(message: String) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        message,
    )))
}

impl<'r> FromRow<'r, PgRow> for User {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let role: String = row.try_get("role")?;
        Ok(Self {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            is_verified: row.try_get("is_verified")?,
            role: Role::parse(&role)
                .ok_or_else(|| decode_error(format!("invalid users.role value: {role}")))?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for Otp {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let action: String = row.try_get("action")?;
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            code: row.try_get("code")?,
            action: OtpAction::parse(&action)
                .ok_or_else(|| decode_error(format!("invalid otp_codes.action value: {action}")))?,
            issued_at: row.try_get("issued_at")?,
            consumed: row.try_get("consumed")?,
        })
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

fn query_span(operation: &str, statement: &str) -> tracing::Span {
    tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

#[async_trait]
impl AuthStore for PgStore {
    async fn create_user(&self, new_user: NewUser) -> Result<CreateUserOutcome> {
        // Transaction ensures user and profile rows stay consistent; a unique
        // violation rolls back both.
        let mut tx = self.pool.begin().await.context("begin create_user")?;

        let id = Uuid::new_v4();
        let query = r"
            INSERT INTO users (id, email, username, password_hash, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, username, password_hash, is_verified, role, created_at
        ";
        let row = sqlx::query_as::<_, User>(query)
            .bind(id)
            .bind(&new_user.email)
            .bind(&new_user.username)
            .bind(&new_user.password_hash)
            .bind(new_user.profile.role().as_str())
            .fetch_one(&mut *tx)
            .instrument(query_span("INSERT", query))
            .await;

        let user = match row {
            Ok(user) => user,
            Err(err) => {
                if is_unique_violation(&err) {
                    let _ = tx.rollback().await;
                    return Ok(CreateUserOutcome::DuplicateIdentity);
                }
                return Err(err).context("failed to insert user");
            }
        };

        let (address, department) = match &new_user.profile {
            RoleProfile::Customer { address } => (Some(address.as_str()), None),
            RoleProfile::Admin { department } => (None, Some(department.as_str())),
        };

        let query = r"
            INSERT INTO role_profiles (user_id, role, address, department)
            VALUES ($1, $2, $3, $4)
        ";
        sqlx::query(query)
            .bind(id)
            .bind(new_user.profile.role().as_str())
            .bind(address)
            .bind(department)
            .execute(&mut *tx)
            .instrument(query_span("INSERT", query))
            .await
            .context("failed to insert role profile")?;

        tx.commit().await.context("commit create_user")?;

        Ok(CreateUserOutcome::Created(user))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let query = r"
            SELECT id, email, username, password_hash, is_verified, role, created_at
            FROM users WHERE email = $1
        ";
        sqlx::query_as::<_, User>(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", query))
            .await
            .context("failed to look up user by email")
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let query = r"
            SELECT id, email, username, password_hash, is_verified, role, created_at
            FROM users WHERE id = $1
        ";
        sqlx::query_as::<_, User>(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", query))
            .await
            .context("failed to look up user by id")
    }

    async fn find_profile(&self, user_id: Uuid) -> Result<Option<RoleProfile>> {
        let query = "SELECT role, address, department FROM role_profiles WHERE user_id = $1";
        let row = sqlx::query(query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", query))
            .await
            .context("failed to look up role profile")?;

        row.map(|row| {
            let role: String = row.try_get("role")?;
            match Role::parse(&role) {
                Some(Role::Customer) => Ok(RoleProfile::Customer {
                    address: row.try_get::<Option<String>, _>("address")?.unwrap_or_default(),
                }),
                Some(Role::Admin) => Ok(RoleProfile::Admin {
                    department: row
                        .try_get::<Option<String>, _>("department")?
                        .unwrap_or_default(),
                }),
                _ => Err(decode_error(format!(
                    "invalid role_profiles.role value: {role}"
                ))),
            }
        })
        .transpose()
        .context("failed to decode role profile")
    }

    async fn set_verified(&self, id: Uuid) -> Result<()> {
        let query = "UPDATE users SET is_verified = TRUE WHERE id = $1";
        sqlx::query(query)
            .bind(id)
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await
            .context("failed to set verified flag")?;
        Ok(())
    }

    async fn set_password(&self, id: Uuid, password_hash: &str) -> Result<()> {
        let query = "UPDATE users SET password_hash = $2 WHERE id = $1";
        sqlx::query(query)
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await
            .context("failed to update password")?;
        Ok(())
    }

    async fn insert_otp(&self, otp: &Otp) -> Result<()> {
        // Invalidate prior unconsumed codes for the same (user, action) in
        // the same transaction, so at most one code is live per pair.
        let mut tx = self.pool.begin().await.context("begin insert_otp")?;

        let query = r"
            UPDATE otp_codes SET consumed = TRUE
            WHERE user_id = $1 AND action = $2 AND consumed = FALSE
        ";
        sqlx::query(query)
            .bind(otp.user_id)
            .bind(otp.action.as_str())
            .execute(&mut *tx)
            .instrument(query_span("UPDATE", query))
            .await
            .context("failed to invalidate prior codes")?;

        let query = r"
            INSERT INTO otp_codes (id, user_id, code, action, issued_at, consumed)
            VALUES ($1, $2, $3, $4, $5, $6)
        ";
        sqlx::query(query)
            .bind(otp.id)
            .bind(otp.user_id)
            .bind(&otp.code)
            .bind(otp.action.as_str())
            .bind(otp.issued_at)
            .bind(otp.consumed)
            .execute(&mut *tx)
            .instrument(query_span("INSERT", query))
            .await
            .context("failed to insert one-time code")?;

        tx.commit().await.context("commit insert_otp")?;
        Ok(())
    }

    async fn find_unconsumed_otp(
        &self,
        user_id: Uuid,
        code: &str,
        action: OtpAction,
    ) -> Result<Option<Otp>> {
        let query = r"
            SELECT id, user_id, code, action, issued_at, consumed
            FROM otp_codes
            WHERE user_id = $1 AND code = $2 AND action = $3 AND consumed = FALSE
            ORDER BY issued_at DESC
            LIMIT 1
        ";
        sqlx::query_as::<_, Otp>(query)
            .bind(user_id)
            .bind(code)
            .bind(action.as_str())
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", query))
            .await
            .context("failed to look up one-time code")
    }

    async fn consume_otp(&self, otp_id: Uuid) -> Result<bool> {
        // Conditional update: exactly one of two racing consumers flips the
        // flag; the loser sees zero rows affected.
        let query = "UPDATE otp_codes SET consumed = TRUE WHERE id = $1 AND consumed = FALSE";
        let result = sqlx::query(query)
            .bind(otp_id)
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await
            .context("failed to consume one-time code")?;
        Ok(result.rows_affected() == 1)
    }

    async fn insert_reset_ticket(
        &self,
        user_id: Uuid,
        token_hash: &[u8],
        issued_at: DateTime<Utc>,
    ) -> Result<()> {
        let query = r"
            INSERT INTO reset_tickets (user_id, token_hash, issued_at)
            VALUES ($1, $2, $3)
        ";
        sqlx::query(query)
            .bind(user_id)
            .bind(token_hash)
            .bind(issued_at)
            .execute(&self.pool)
            .instrument(query_span("INSERT", query))
            .await
            .context("failed to insert reset ticket")?;
        Ok(())
    }

    async fn consume_reset_ticket(
        &self,
        user_id: Uuid,
        token_hash: &[u8],
        issued_after: DateTime<Utc>,
    ) -> Result<bool> {
        let query = r"
            UPDATE reset_tickets SET used = TRUE
            WHERE user_id = $1 AND token_hash = $2 AND used = FALSE AND issued_at > $3
        ";
        let result = sqlx::query(query)
            .bind(user_id)
            .bind(token_hash)
            .bind(issued_after)
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await
            .context("failed to consume reset ticket")?;
        Ok(result.rows_affected() == 1)
    }
}
