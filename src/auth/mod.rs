//! Core authentication domain: models, OTP engine, and the registration,
//! verification, and credential workflows.
//!
//! Workflows are plain async functions over the [`AuthStore`] and [`Mailer`]
//! traits; the HTTP layer owns status-code mapping, the store owns atomicity.

pub mod credentials;
pub mod error;
pub mod hash;
pub mod models;
pub mod otp;
pub mod registration;
pub mod store;
pub mod utils;
pub mod verification;

pub use error::AuthError;
pub use models::{Otp, OtpAction, ResetTicketRecord, Role, RoleProfile, User};
pub use store::{AuthStore, CreateUserOutcome, Mailer, NewUser};
pub use verification::VerifyOutcome;
