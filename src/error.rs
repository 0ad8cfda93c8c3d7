use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Request-path failures, each mapped to a status code. Every variant
/// serializes as `{"error": "<message>"}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("cannot read dataset {path}: {source}")]
    SourceUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed row in {path}: {detail}")]
    MalformedRow { path: String, detail: String },

    #[error("{0}")]
    NotFound(String),

    #[error("unsupported node type '{0}'")]
    UnsupportedNodeType(String),

    #[error("bad upload: {0}")]
    BadUpload(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::SourceUnreadable { .. } | ApiError::MalformedRow { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::UnsupportedNodeType(_) | ApiError::BadUpload(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::error!(%status, "{self}");
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
