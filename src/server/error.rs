use crate::error::ComicError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Handler error: any failure, rendered as `{"error": "..."}` with a status
/// derived from the underlying [`ComicError`] when there is one
#[derive(Debug)]
pub struct ApiError(anyhow::Error);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.downcast_ref::<ComicError>() {
            Some(ComicError::RecordNotFound(_)) => StatusCode::NOT_FOUND,
            Some(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %format!("{:#}", self.0), "Request failed");
        }

        (
            status,
            Json(serde_json::json!({ "error": format!("{:#}", self.0) })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::from(ComicError::NoImages).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::from(ComicError::EmptyStory).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(ComicError::RecordNotFound("x".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(anyhow::anyhow!("disk full")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_context_keeps_downcast() {
        use anyhow::Context;
        let err: anyhow::Result<()> = Err(ComicError::InvalidColumns(0)).context("assembling page");
        let api = ApiError::from(err.unwrap_err());
        assert_eq!(api.status(), StatusCode::BAD_REQUEST);
    }
}
