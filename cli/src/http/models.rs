//! HTTP API错误模型

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use surf_vcr_core::api::RegistryError;

#[derive(Debug)]
pub enum HttpServerError {
    Unauthorized,
    Registry(RegistryError),
}

impl From<RegistryError> for HttpServerError {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}

impl HttpServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Registry(RegistryError::NotFound) => StatusCode::NOT_FOUND,
            Self::Registry(RegistryError::AlreadyEnabled)
            | Self::Registry(RegistryError::AlreadyDisabled) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for HttpServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::Unauthorized => "Unauthorized".to_string(),
            Self::Registry(e) => e.to_string(),
        };

        (status, format!("{message}\n")).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            HttpServerError::Unauthorized.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            HttpServerError::from(RegistryError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            HttpServerError::from(RegistryError::AlreadyEnabled).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            HttpServerError::from(RegistryError::AlreadyDisabled).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_error_body_is_plain_text() {
        let resp = HttpServerError::from(RegistryError::NotFound).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"No such stream\n");
    }
}
