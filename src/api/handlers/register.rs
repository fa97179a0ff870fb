use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::instrument;

use crate::api::handlers::error_response;
use crate::api::types::{RegisterRequest, UserResponse};
use crate::auth::{registration, AuthStore, Mailer};

#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration successful, OTP sent to email", body = UserResponse, content_type = "application/json"),
        (status = 400, description = "Missing or malformed field"),
        (status = 409, description = "User with the specified username or email already exists"),
        (status = 502, description = "Verification code could not be delivered"),
    ),
    tag = "register"
)]
#[instrument(skip_all)]
pub async fn register(
    store: Extension<Arc<dyn AuthStore>>,
    mailer: Extension<Arc<dyn Mailer>>,
    payload: Option<Json<RegisterRequest>>,
) -> Response {
    let request: RegisterRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let result = match request.role.as_str() {
        "customer" => {
            registration::register_customer(
                store.as_ref(),
                mailer.as_ref(),
                &request.username,
                &request.email,
                &request.password,
                request.address.as_deref().unwrap_or_default(),
            )
            .await
        }
        "admin" => {
            registration::register_admin(
                store.as_ref(),
                mailer.as_ref(),
                &request.username,
                &request.email,
                &request.password,
                request.department.as_deref().unwrap_or_default(),
            )
            .await
        }
        _ => return (StatusCode::BAD_REQUEST, "Invalid role".to_string()).into_response(),
    };

    match result {
        Ok(user) => (StatusCode::CREATED, Json(UserResponse::from(&user))).into_response(),
        Err(err) => error_response(&err),
    }
}
