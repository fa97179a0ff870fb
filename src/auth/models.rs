//! Domain records persisted through [`crate::auth::AuthStore`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Account role tag carried on the user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Admin,
    Unset,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Admin => "admin",
            Self::Unset => "unset",
        }
    }

    /// Parse the persisted textual value into a typed enum.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "customer" => Some(Self::Customer),
            "admin" => Some(Self::Admin),
            "unset" => Some(Self::Unset),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role-specific attribute bundle, exactly one per user once a role is
/// assigned, created atomically with the user row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleProfile {
    Customer { address: String },
    Admin { department: String },
}

impl RoleProfile {
    #[must_use]
    pub const fn role(&self) -> Role {
        match self {
            Self::Customer { .. } => Role::Customer,
            Self::Admin { .. } => Role::Admin,
        }
    }
}

/// Identity record. `is_verified` is mutated only by the verification
/// workflow, the password only by the credential workflow.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_verified: bool,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Why an OTP was issued; determines post-verification branching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpAction {
    Register,
    PasswordReset,
}

impl OtpAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::PasswordReset => "password_reset",
        }
    }

    /// Parse the boundary/persisted tag (`register` | `password_reset`).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "register" => Some(Self::Register),
            "password_reset" => Some(Self::PasswordReset),
            _ => None,
        }
    }
}

impl fmt::Display for OtpAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One-time passcode bound to a user and an action. Rows are never deleted;
/// consumed and expired codes remain as an audit trail.
#[derive(Debug, Clone)]
pub struct Otp {
    pub id: Uuid,
    pub user_id: Uuid,
    pub code: String,
    pub action: OtpAction,
    pub issued_at: DateTime<Utc>,
    pub consumed: bool,
}

/// Single-use password-reset ticket row. Only the SHA-256 hash of the raw
/// ticket is stored.
#[derive(Debug, Clone)]
pub struct ResetTicketRecord {
    pub user_id: Uuid,
    pub token_hash: Vec<u8>,
    pub issued_at: DateTime<Utc>,
    pub used: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_text() {
        for role in [Role::Customer, Role::Admin, Role::Unset] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("superuser"), None);
    }

    #[test]
    fn otp_action_round_trips_through_text() {
        assert_eq!(OtpAction::parse("register"), Some(OtpAction::Register));
        assert_eq!(
            OtpAction::parse("password_reset"),
            Some(OtpAction::PasswordReset)
        );
        assert_eq!(OtpAction::parse("mfa"), None);
    }

    #[test]
    fn profile_determines_role() {
        let customer = RoleProfile::Customer {
            address: "1 Main St".to_string(),
        };
        let admin = RoleProfile::Admin {
            department: "ops".to_string(),
        };
        assert_eq!(customer.role(), Role::Customer);
        assert_eq!(admin.role(), Role::Admin);
    }
}
