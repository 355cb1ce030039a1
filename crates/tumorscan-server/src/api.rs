//! REST API for the image classification service.
//!
//! One upload endpoint runs the full decode → preprocess → predict →
//! post-process pipeline per request and returns the top class with its
//! confidence. A health probe reports liveness. Cross-origin requests are
//! permitted from any origin so browser front ends can call the API
//! directly.

use bytes::BufMut;
use futures_util::TryStreamExt;
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;
use tracing::error;
use tumorscan_infer::metrics::Metrics;
use tumorscan_infer::{classify, preprocess, InferError, LabelSet, Model, Prediction};
use warp::http::StatusCode;
use warp::multipart::{FormData, Part};
use warp::{Filter, Rejection, Reply};

// =============================================================================
// Shared state
// =============================================================================

/// Process-wide immutable state, built once before the server starts
/// listening and injected into every request handler.
pub struct AppState {
    pub model: Box<dyn Model>,
    pub labels: LabelSet,
    pub metrics: Option<Metrics>,
    pub started: Instant,
}

pub type SharedState = Arc<AppState>;

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize)]
struct ResultResponse {
    result: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

// =============================================================================
// API Routes
// =============================================================================

/// Build the complete route tree: prediction endpoint, health probe, CORS.
pub fn routes(
    state: SharedState,
    max_upload_bytes: u64,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let check_tumor = warp::path("api")
        .and(warp::path("check-tumor"))
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::multipart::form().max_length(max_upload_bytes))
        .and(with_state(state.clone()))
        .and_then(handle_check_tumor);

    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state(state))
        .and_then(handle_health);

    // CORS configuration for browser-based clients
    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "POST", "OPTIONS"])
        .allow_headers(vec!["content-type"]);

    check_tumor
        .or(health)
        .with(cors)
        .recover(handle_rejection)
}

// =============================================================================
// Filters
// =============================================================================

fn with_state(state: SharedState) -> impl Filter<Extract = (SharedState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

// =============================================================================
// Per-request error mapping
// =============================================================================

/// Outcomes of one upload request, before translation into HTTP.
enum UploadError {
    /// No multipart part named `image` (or no usable multipart body at all).
    NoImage,
    /// The `image` part carries no filename.
    EmptyFilename,
    /// Reading the part's payload failed mid-stream.
    Read(String),
    /// Decode, inference, or post-processing failure.
    Pipeline(InferError),
}

impl UploadError {
    fn status(&self) -> StatusCode {
        match self {
            UploadError::NoImage | UploadError::EmptyFilename => StatusCode::BAD_REQUEST,
            UploadError::Read(_) | UploadError::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            UploadError::NoImage => "No image uploaded".to_string(),
            UploadError::EmptyFilename => "Empty filename".to_string(),
            UploadError::Read(msg) => format!("Failed to read upload: {}", msg),
            UploadError::Pipeline(e) => e.to_string(),
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn handle_check_tumor(
    form: FormData,
    state: SharedState,
) -> Result<impl Reply, Infallible> {
    let started = Instant::now();

    let (status, reply) = match classify_upload(form, &state).await {
        Ok(prediction) => {
            if let Some(metrics) = &state.metrics {
                metrics.record_prediction(&prediction.label, started.elapsed().as_secs_f64());
            }
            let body = ResultResponse {
                result: prediction.display(),
            };
            (
                StatusCode::OK,
                warp::reply::with_status(warp::reply::json(&body), StatusCode::OK).into_response(),
            )
        }
        Err(e) => {
            let status = e.status();
            let message = e.message();
            if status.is_server_error() {
                error!("Prediction request failed: {}", message);
            }
            (status, error_response(status, &message))
        }
    };

    if let Some(metrics) = &state.metrics {
        metrics.record_request(status.as_u16());
    }

    Ok(reply)
}

/// The per-request pipeline: validate the upload, then classify it.
///
/// Failures past input validation are collapsed into the uniform error
/// envelope by the caller; no partial results are ever returned.
async fn classify_upload(form: FormData, state: &AppState) -> Result<Prediction, UploadError> {
    // A body that cannot be parsed as multipart yields no usable parts,
    // which is indistinguishable from an upload without the image field.
    let parts: Vec<Part> = form.try_collect().await.map_err(|_| UploadError::NoImage)?;

    let part = parts
        .into_iter()
        .find(|p| p.name() == "image")
        .ok_or(UploadError::NoImage)?;

    if part.filename().map_or(true, |f| f.is_empty()) {
        return Err(UploadError::EmptyFilename);
    }

    let bytes = part_bytes(part)
        .await
        .map_err(|e| UploadError::Read(e.to_string()))?;

    let tensor = preprocess(&bytes).map_err(UploadError::Pipeline)?;

    // Synchronous, blocking model call — no timeout, no cancellation.
    classify(state.model.as_ref(), &state.labels, &tensor).map_err(UploadError::Pipeline)
}

async fn part_bytes(part: Part) -> Result<Vec<u8>, warp::Error> {
    part.stream()
        .try_fold(Vec::new(), |mut acc, data| {
            acc.put(data);
            async move { Ok(acc) }
        })
        .await
}

async fn handle_health(state: SharedState) -> Result<impl Reply, Infallible> {
    let response = serde_json::json!({
        "status": "healthy",
        "uptime_seconds": state.started.elapsed().as_secs_f64(),
        "version": env!("CARGO_PKG_VERSION"),
        "classes": state.labels.len(),
    });
    Ok(warp::reply::json(&response))
}

// =============================================================================
// Rejection handling
// =============================================================================

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found")
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Image too large")
    } else {
        // The only other rejection source is the multipart filter: a POST
        // that never produced a multipart body (missing or non-multipart
        // content-type) carries no image.
        (StatusCode::BAD_REQUEST, "No image uploaded")
    };

    Ok(error_response(status, message))
}

fn error_response(status: StatusCode, message: &str) -> warp::reply::Response {
    warp::reply::with_status(
        warp::reply::json(&ErrorResponse {
            error: message.to_string(),
        }),
        status,
    )
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_error_status_mapping() {
        assert_eq!(UploadError::NoImage.status(), StatusCode::BAD_REQUEST);
        assert_eq!(UploadError::EmptyFilename.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            UploadError::Read("eof".to_string()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            UploadError::Pipeline(InferError::Decode("bad".to_string())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_upload_error_messages() {
        assert_eq!(UploadError::NoImage.message(), "No image uploaded");
        assert_eq!(UploadError::EmptyFilename.message(), "Empty filename");
        assert!(UploadError::Pipeline(InferError::EmptyPrediction)
            .message()
            .contains("empty prediction"));
    }
}
