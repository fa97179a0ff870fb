//! OpenAPI document for the auth endpoints.

use utoipa::OpenApi;

use crate::api::handlers;
use crate::api::types::{
    LoginRequest, PasswordChangeRequest, PasswordResetConfirmRequest, PasswordResetRequest,
    PasswordResetResponse, RegisterRequest, UserResponse, VerifyRequest, VerifyResponse,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::register::register,
        handlers::verify::verify,
        handlers::login::login,
        handlers::password::password_reset,
        handlers::password::password_reset_confirm,
        handlers::password::password_change,
    ),
    components(schemas(
        RegisterRequest,
        UserResponse,
        VerifyRequest,
        VerifyResponse,
        LoginRequest,
        PasswordResetRequest,
        PasswordResetResponse,
        PasswordResetConfirmRequest,
        PasswordChangeRequest,
    )),
    tags(
        (name = "register", description = "Account registration"),
        (name = "verify", description = "One-time code verification"),
        (name = "login", description = "Credential checks"),
        (name = "password", description = "Password reset and change"),
        (name = "health", description = "Service health"),
    )
)]
pub struct ApiDoc;
