//! Password reset and change endpoints.

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::instrument;

use crate::api::handlers::error_response;
use crate::api::types::{
    PasswordChangeRequest, PasswordResetConfirmRequest, PasswordResetRequest,
    PasswordResetResponse,
};
use crate::auth::{credentials, AuthStore, Mailer};

#[utoipa::path(
    post,
    path = "/password/reset",
    request_body = PasswordResetRequest,
    responses(
        (status = 202, description = "Reset code sent to the account email", body = PasswordResetResponse, content_type = "application/json"),
        (status = 404, description = "No account for that email"),
        (status = 502, description = "Reset code could not be delivered"),
    ),
    tag = "password"
)]
#[instrument(skip_all)]
pub async fn password_reset(
    store: Extension<Arc<dyn AuthStore>>,
    mailer: Extension<Arc<dyn Mailer>>,
    payload: Option<Json<PasswordResetRequest>>,
) -> Response {
    let request: PasswordResetRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    match credentials::request_password_reset(store.as_ref(), mailer.as_ref(), &request.email)
        .await
    {
        Ok(user_id) => (
            StatusCode::ACCEPTED,
            Json(PasswordResetResponse { user_id }),
        )
            .into_response(),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    post,
    path = "/password/reset/confirm",
    request_body = PasswordResetConfirmRequest,
    responses(
        (status = 204, description = "Password replaced"),
        (status = 400, description = "Invalid or expired reset ticket"),
        (status = 422, description = "Passwords do not match"),
    ),
    tag = "password"
)]
#[instrument(skip_all)]
pub async fn password_reset_confirm(
    store: Extension<Arc<dyn AuthStore>>,
    payload: Option<Json<PasswordResetConfirmRequest>>,
) -> Response {
    let request: PasswordResetConfirmRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    match credentials::confirm_password_reset(
        store.as_ref(),
        request.user_id,
        &request.reset_ticket,
        &request.new_password,
        &request.confirm_password,
    )
    .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    post,
    path = "/password/change",
    request_body = PasswordChangeRequest,
    responses(
        (status = 204, description = "Password changed, confirmation sent"),
        (status = 401, description = "Old password incorrect"),
        (status = 422, description = "New password must differ"),
    ),
    tag = "password"
)]
#[instrument(skip_all)]
pub async fn password_change(
    store: Extension<Arc<dyn AuthStore>>,
    mailer: Extension<Arc<dyn Mailer>>,
    payload: Option<Json<PasswordChangeRequest>>,
) -> Response {
    let request: PasswordChangeRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    match credentials::change_password(
        store.as_ref(),
        mailer.as_ref(),
        &request.email,
        &request.old_password,
        &request.new_password,
    )
    .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(&err),
    }
}
