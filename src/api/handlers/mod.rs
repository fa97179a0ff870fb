pub mod health;
pub use self::health::health;

pub mod register;
pub use self::register::register;

pub mod verify;
pub use self::verify::verify;

pub mod login;
pub use self::login::login;

pub mod password;
pub use self::password::{password_change, password_reset, password_reset_confirm};

// common functions for the handlers
use axum::{http::StatusCode, response::IntoResponse, response::Response};
use tracing::error;

use crate::auth::AuthError;

/// Translate a workflow error into a status code and user-facing message.
/// Store failures are logged and never leak details to the client.
pub(crate) fn error_response(err: &AuthError) -> Response {
    let status = match err {
        AuthError::InvalidField(_)
        | AuthError::MissingField(_)
        | AuthError::OtpNotFound
        | AuthError::InvalidTicket => StatusCode::BAD_REQUEST,
        AuthError::DuplicateIdentity => StatusCode::CONFLICT,
        AuthError::OtpExpired => StatusCode::GONE,
        AuthError::UnknownIdentity => StatusCode::NOT_FOUND,
        AuthError::BadCredential => StatusCode::UNAUTHORIZED,
        AuthError::NotVerified => StatusCode::FORBIDDEN,
        AuthError::PasswordMismatch | AuthError::SamePassword => StatusCode::UNPROCESSABLE_ENTITY,
        AuthError::Delivery(_) => StatusCode::BAD_GATEWAY,
        AuthError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let message = match err {
        AuthError::Store(source) => {
            error!("storage failure: {source:?}");
            "Internal error".to_string()
        }
        other => other.to_string(),
    };

    (status, message).into_response()
}
