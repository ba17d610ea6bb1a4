use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use maeum_core::CoreError;
use maeum_reasoning::{JournalError, TurnError};
use serde_json::json;

/// Every failure a route can report, rendered as
/// `{"error": {"kind", "stage", "message"}}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Invalid(#[from] CoreError),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    /// An external service failed at the named stage.
    #[error("{message}")]
    Upstream { stage: &'static str, message: String },
    #[error("{0:#}")]
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Invalid(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Upstream { .. } => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Invalid(e) => e.kind(),
            Self::BadRequest(_) => "bad_request",
            Self::Unauthorized(_) => "unauthorized",
            Self::NotFound(_) => "not_found",
            Self::Upstream { .. } => "upstream",
            Self::Internal(_) => "internal",
        }
    }

    pub fn stage(&self) -> Option<&'static str> {
        match self {
            Self::Upstream { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    pub fn upstream(stage: &'static str, source: anyhow::Error) -> Self {
        Self::Upstream {
            stage,
            message: format!("{:#}", source),
        }
    }
}

/// Typed core errors keep their kind; anything else is internal.
impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        match e.downcast::<CoreError>() {
            Ok(core) => Self::Invalid(core),
            Err(e) => Self::Internal(e),
        }
    }
}

impl From<TurnError> for ApiError {
    fn from(e: TurnError) -> Self {
        match e {
            TurnError::Rejected(core) => Self::Invalid(core),
            TurnError::Failed { stage, source } => Self::upstream(stage.as_str(), source),
        }
    }
}

impl From<JournalError> for ApiError {
    fn from(e: JournalError) -> Self {
        match e {
            JournalError::Rejected(core) => Self::Invalid(core),
            JournalError::Classification(source) => Self::upstream("classification", source),
            JournalError::Storage(source) => Self::Internal(source),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed ({}): {}", self.kind(), self);
        } else {
            tracing::debug!("Request rejected ({}): {}", self.kind(), self);
        }
        let body = json!({
            "error": {
                "kind": self.kind(),
                "stage": self.stage(),
                "message": self.to_string(),
            }
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maeum_reasoning::Stage;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(CoreError::UnknownBucket("x".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unauthorized("no".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::NotFound("no".into()).status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_anyhow_downcasts_core_error() {
        let err: anyhow::Error = CoreError::EmptyInput("text").into();
        let api = ApiError::from(err);
        assert_eq!(api.kind(), "empty_input");

        let api = ApiError::from(anyhow::anyhow!("disk full"));
        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_turn_error_keeps_stage() {
        let api = ApiError::from(TurnError::Failed {
            stage: Stage::Completion,
            source: anyhow::anyhow!("timeout"),
        });
        assert_eq!(api.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(api.stage(), Some("completion"));
        assert_eq!(api.kind(), "upstream");
    }

    #[test]
    fn test_journal_error_stages() {
        let api = ApiError::from(JournalError::Classification(anyhow::anyhow!("503")));
        assert_eq!(api.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(api.stage(), Some("classification"));

        let api = ApiError::from(JournalError::Storage(anyhow::anyhow!("locked")));
        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.stage(), None);
    }
}
