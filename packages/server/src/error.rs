use actix_web::{
    HttpRequest, HttpResponse, ResponseError, error::JsonPayloadError, http::StatusCode,
};
use promptlift_ai_provider::AiProviderError;
use promptlift_git_provider::{FlattenError, models::ParseRepoUrlError};
use serde::Serialize;

/// JSON shape of every error response: `{"error": "..."}`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    #[must_use]
    pub const fn new(error: String) -> Self {
        Self { error }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error(transparent)]
    Dispatch(#[from] AiProviderError),

    #[error(transparent)]
    Ingest(#[from] FlattenError),
}

impl From<ParseRepoUrlError> for ApiError {
    fn from(value: ParseRepoUrlError) -> Self {
        Self::Validation(value.to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Dispatch(AiProviderError::UnsupportedProvider(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Dispatch(_) | Self::Ingest(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("Request failed: {self}");
        } else {
            log::warn!("Rejected request: {self}");
        }
        HttpResponse::build(status).json(ErrorBody::new(self.to_string()))
    }
}

/// Turns body extraction failures into the `{"error"}` shape instead of
/// actix's plain-text default.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    match err {
        JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
            ApiError::PayloadTooLarge(err.to_string()).into()
        }
        err => ApiError::Validation(format!("Invalid JSON body: {err}")).into(),
    }
}
