use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::instrument;

use crate::api::handlers::error_response;
use crate::api::types::{UserResponse, VerifyRequest, VerifyResponse};
use crate::auth::{verification, AuthStore, OtpAction, VerifyOutcome};

#[utoipa::path(
    post,
    path = "/verify/{action}",
    params(
        ("action" = String, Path, description = "Why the code was issued: `register` or `password_reset`")
    ),
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Code verified", body = VerifyResponse, content_type = "application/json"),
        (status = 400, description = "Unknown action or invalid code"),
        (status = 410, description = "Code expired, request a new one"),
    ),
    tag = "verify"
)]
#[instrument(skip_all, fields(action = %action))]
pub async fn verify(
    Path(action): Path<String>,
    store: Extension<Arc<dyn AuthStore>>,
    payload: Option<Json<VerifyRequest>>,
) -> Response {
    let request: VerifyRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let Some(action) = OtpAction::parse(&action) else {
        return (StatusCode::BAD_REQUEST, "Invalid action".to_string()).into_response();
    };

    match verification::verify(store.as_ref(), request.user_id, &request.otp_code, action).await {
        Ok(VerifyOutcome::LoggedIn(user)) => {
            // Session establishment is the caller's concern; the verified
            // user is the session principal.
            let body = VerifyResponse {
                status: "logged_in".to_string(),
                user: Some(UserResponse::from(&user)),
                user_id: None,
                reset_ticket: None,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Ok(VerifyOutcome::ProceedToReset {
            user_id,
            reset_ticket,
        }) => {
            let body = VerifyResponse {
                status: "proceed_to_reset".to_string(),
                user: None,
                user_id: Some(user_id),
                reset_ticket: Some(reset_ticket),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => error_response(&err),
    }
}
