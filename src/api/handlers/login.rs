use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::instrument;

use crate::api::handlers::error_response;
use crate::api::types::{LoginRequest, UserResponse};
use crate::auth::{credentials, AuthStore};

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful, session established", body = UserResponse, content_type = "application/json"),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account not verified"),
        (status = 404, description = "No account for that email"),
    ),
    tag = "login"
)]
#[instrument(skip_all)]
pub async fn login(
    store: Extension<Arc<dyn AuthStore>>,
    payload: Option<Json<LoginRequest>>,
) -> Response {
    let request: LoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    match credentials::login(store.as_ref(), &request.email, &request.password).await {
        Ok(user) => (StatusCode::OK, Json(UserResponse::from(&user))).into_response(),
        Err(err) => error_response(&err),
    }
}
