use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use petplates_engine::{PassError, ScoringError};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Scoring error: {0}")]
    ScoringError(#[from] ScoringError),

    #[error("{0}")]
    Superseded(#[from] PassError),

    #[error("Internal server error")]
    InternalError(String),
}

impl From<petplates_shared::Error> for AppError {
    fn from(err: petplates_shared::Error) -> Self {
        use petplates_shared::Error;

        match err {
            Error::Validate(errors) => AppError::ValidationError(errors.to_string()),
            Error::InvalidInput(msg) => AppError::ValidationError(msg),
            Error::NotFound(msg) => AppError::NotFound(msg),
            Error::Conflict(_) => AppError::Superseded(PassError::Superseded),
            Error::Unknown(err) => AppError::InternalError(err.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::MalformedRequest(rejection.body_text())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalError(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status_code, error) = match &self {
            AppError::ValidationError(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            AppError::MalformedRequest(_) => (StatusCode::UNPROCESSABLE_ENTITY, "malformed_request"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::ScoringError(_) => (StatusCode::UNPROCESSABLE_ENTITY, "scoring_error"),
            AppError::Superseded(_) => (StatusCode::CONFLICT, "superseded"),
            AppError::InternalError(details) => {
                tracing::error!("Internal error: {details}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        };

        (
            status_code,
            Json(json!({
                "error": error,
                "message": message,
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (
                AppError::ValidationError("bad".to_string()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (AppError::NotFound("x".to_string()), StatusCode::NOT_FOUND),
            (
                AppError::Superseded(PassError::Superseded),
                StatusCode::CONFLICT,
            ),
            (
                AppError::InternalError("boom".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_shared_errors_map_to_app_errors() {
        let err: AppError = petplates_shared::Error::Conflict("stale".to_string()).into();
        assert!(matches!(err, AppError::Superseded(_)));

        let err: AppError = petplates_shared::Error::NotFound("recipe".to_string()).into();
        assert!(matches!(err, AppError::NotFound(_)));

        let err: AppError = petplates_shared::Error::InvalidInput("count".to_string()).into();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
