//! HTTP API (feature `server`).
//!
//! A thin axum layer over the conversion core: `POST /convert` takes JSON
//! and returns `application/pdf` bytes, `GET /healthz` answers liveness
//! probes. One shared [`ChromiumEngine`] lives in the router state and is
//! shut down after a graceful exit.
//!
//! Error mapping is the only logic here: validation problems are 422 with
//! the per-field list in the body, bad input (unparsable JSON content, an
//! unknown declared type) is 400, everything downstream is 500.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::convert::convert_to_html;
use crate::detect::DeclaredType;
use crate::error::{DocPressError, FieldError};
use crate::options::ConversionOptions;
use crate::render::{ChromiumEngine, RenderEngine};

/// `POST /convert` request body.
#[derive(Debug, Deserialize)]
pub struct ConvertRequest {
    /// Raw content to convert.
    pub content: String,
    /// Declared content type: `text`, `html`, `json`, `markdown`, or
    /// `auto` (the default) to run detection.
    #[serde(default, rename = "type")]
    pub content_type: Option<String>,
    /// Conversion options; every field optional.
    #[serde(default)]
    pub options: ConversionOptions,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<FieldError>,
}

/// Build the application router around a shared engine.
pub fn router(engine: Arc<ChromiumEngine>) -> Router {
    Router::new()
        .route("/convert", post(convert_handler))
        .route("/healthz", get(healthz))
        .with_state(engine)
}

/// Bind and serve until interrupted, then shut the browser down.
pub async fn serve(addr: SocketAddr) -> Result<(), DocPressError> {
    let engine = Arc::new(ChromiumEngine::new());
    let app = router(Arc::clone(&engine));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| DocPressError::Internal(format!("failed to bind {addr}: {e}")))?;
    info!("Listening on http://{addr}");

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| DocPressError::Internal(format!("server error: {e}")));

    engine.shutdown().await;
    result
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}

async fn healthz() -> &'static str {
    "ok"
}

async fn convert_handler(
    State(engine): State<Arc<ChromiumEngine>>,
    Json(request): Json<ConvertRequest>,
) -> Response {
    let declared = match DeclaredType::from_name(request.content_type.as_deref().unwrap_or("auto"))
    {
        Ok(declared) => declared,
        Err(e) => return error_response(e),
    };

    let html = match convert_to_html(&request.content, declared, &request.options) {
        Ok(html) => html,
        Err(e) => return error_response(e),
    };

    match engine.render(&html, &request.options.page_layout).await {
        Ok(pdf) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/pdf")],
            pdf,
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

fn error_response(e: DocPressError) -> Response {
    let status = match &e {
        DocPressError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DocPressError::JsonParse { .. } | DocPressError::UnsupportedType { .. } => {
            StatusCode::BAD_REQUEST
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!("Request failed: {e}");
    }
    let fields = match &e {
        DocPressError::Validation(fields) => fields.clone(),
        _ => Vec::new(),
    };
    (
        status,
        Json(ErrorBody {
            error: e.to_string(),
            fields,
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_unprocessable_entity() {
        let response = error_response(DocPressError::Validation(vec![FieldError::new(
            "page_format",
            "unknown page format 'B5'",
        )]));
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn bad_input_maps_to_bad_request() {
        let response = error_response(DocPressError::JsonParse {
            detail: "expected value".into(),
        });
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = error_response(DocPressError::UnsupportedType {
            declared: "docx".into(),
        });
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn render_failures_map_to_server_error() {
        let response = error_response(DocPressError::Render {
            detail: "browser crashed".into(),
        });
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn request_body_accepts_minimal_payload() {
        let request: ConvertRequest = serde_json::from_str(r#"{"content":"hello"}"#).unwrap();
        assert_eq!(request.content, "hello");
        assert!(request.content_type.is_none());
        assert!(request.options.title.is_none());
    }

    #[test]
    fn request_body_accepts_full_payload() {
        let request: ConvertRequest = serde_json::from_str(
            r#"{
                "content": "{\"a\":1}",
                "type": "json",
                "options": {
                    "title": "Report",
                    "json_display_mode": "table",
                    "page_layout": {"page_format": "letter", "print_background": false}
                }
            }"#,
        )
        .unwrap();
        assert_eq!(request.content_type.as_deref(), Some("json"));
        assert_eq!(request.options.title.as_deref(), Some("Report"));
    }
}
