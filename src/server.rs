use axum::{
    Json, Router,
    extract::{Request, State, rejection::JsonRejection},
    http::{
        HeaderValue, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
        },
    },
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::channel::{ChannelValidator, ValidationResult};

pub const VALIDATE_ROUTE: &str = "/validateM3U8";

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    #[serde(default)]
    pub url: Option<String>,
}

/// Routes of the validation service, with permissive CORS on every response
#[must_use]
pub fn router(validator: ChannelValidator) -> Router {
    Router::new()
        .route(VALIDATE_ROUTE, post(validate_m3u8).options(preflight))
        .layer(middleware::from_fn(allow_any_origin))
        .with_state(validator)
}

/// Serves [`router`] on `listener` until `ct` is cancelled
///
/// # Errors
/// Errors when accepting connections fails
pub async fn serve(
    listener: TcpListener,
    validator: ChannelValidator,
    ct: CancellationToken,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Listening on http://{addr}{VALIDATE_ROUTE}");
    }

    axum::serve(listener, router(validator))
        .with_graceful_shutdown(async move { ct.cancelled().await })
        .await
}

#[instrument(skip_all)]
async fn validate_m3u8(
    State(validator): State<ChannelValidator>,
    body: Result<Json<ValidateRequest>, JsonRejection>,
) -> (StatusCode, Json<ValidationResult>) {
    let url = match body {
        Ok(Json(ValidateRequest { url: Some(url) })) => url,
        Ok(_) => return bad_request("Missing `url` field"),
        Err(e) => return bad_request(e.body_text()),
    };

    let result = validator.validate(&url).await;
    info!(
        url = %result.url,
        load_time = result.load_time,
        is_valid = result.is_valid,
        info = %serde_json::to_string(&result.info).unwrap_or_default(),
        "Validated stream"
    );

    (StatusCode::OK, Json(result))
}

fn bad_request(error: impl ToString) -> (StatusCode, Json<ValidationResult>) {
    let error = error.to_string();
    warn!("Rejecting validation request: {error}");
    (
        StatusCode::BAD_REQUEST,
        Json(ValidationResult::fault("", error)),
    )
}

async fn preflight() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [
            (ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"),
            (ACCESS_CONTROL_ALLOW_HEADERS, "content-type"),
        ],
    )
}

async fn allow_any_origin(req: Request, next: Next) -> Response {
    let mut res = next.run(req).await;
    res.headers_mut()
        .insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    res
}
