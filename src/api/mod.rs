//! HTTP boundary: router construction and server startup.

use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use utoipa::OpenApi;

use crate::auth::{AuthStore, Mailer};
use crate::cli::globals::GlobalArgs;
use crate::mailer::{LogMailer, SmtpMailer};
use crate::store::{MemStore, PgStore};

pub mod handlers;
pub mod openapi;
pub mod types;

/// Build the application router with all layers applied.
pub fn app(store: Arc<dyn AuthStore>, mailer: Arc<dyn Mailer>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/register", post(handlers::register))
        .route("/verify/:action", post(handlers::verify))
        .route("/login", post(handlers::login))
        .route("/password/reset", post(handlers::password_reset))
        .route(
            "/password/reset/confirm",
            post(handlers::password_reset_confirm),
        )
        .route("/password/change", post(handlers::password_change))
        .route(
            "/openapi.json",
            get(|| async { Json(openapi::ApiDoc::openapi()) }),
        )
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_request: &Request<Body>| {
                        HeaderValue::from_str(Ulid::new().to_string().as_str()).ok()
                    },
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(store))
                .layer(Extension(mailer)),
        )
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, dsn: String, globals: &GlobalArgs) -> Result<()> {
    // `memory` keeps everything in-process; anything else is a Postgres DSN.
    let store: Arc<dyn AuthStore> = if dsn == "memory" {
        info!("using in-memory record store");
        Arc::new(MemStore::new())
    } else {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(&dsn)
            .await
            .context("Failed to connect to database")?;
        Arc::new(PgStore::new(pool))
    };

    let mailer: Arc<dyn Mailer> = match &globals.smtp {
        Some(smtp) => Arc::new(SmtpMailer::new(smtp, &globals.from_email)?),
        None => {
            info!("no SMTP relay configured, logging outbound mail");
            Arc::new(LogMailer)
        }
    };

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app(store, mailer).into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
