use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Machine-readable codes carried in every error body. Clients branch on
/// these, not on `message`.
pub mod error_code {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const ALREADY_EXISTS: &str = "ALREADY_EXISTS";
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
    pub const UNAUTHENTICATED: &str = "UNAUTHENTICATED";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
    pub const INTERNAL: &str = "INTERNAL";
}

/// Error returned by every service and controller.
///
/// Rendered as `{"code": "...", "message": "..."}`, e.g.
///
/// ```json
/// {"code": "NOT_FOUND", "message": "Unable to identify resource with id \"1\"."}
/// ```
#[derive(Error, Debug)]
pub enum ServiceError {
    /// 404
    #[error("{0}")]
    NotFound(String),

    /// A unique key is already taken. 409
    #[error("{0}")]
    Conflict(String),

    /// Bad input: schema violations, malformed references, paging values. 400
    #[error("{0}")]
    Validation(String),

    /// Missing, unknown or expired credentials or token. 401
    #[error("{0}")]
    Unauthorized(String),

    /// The KV backend failed. 500
    #[error("{0}")]
    Storage(String),

    #[error("{0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: String,
}

impl ServiceError {
    pub fn error_code(&self) -> &'static str {
        self.parts().1
    }

    pub fn status_code(&self) -> StatusCode {
        self.parts().0
    }

    fn parts(&self) -> (StatusCode, &'static str) {
        use ServiceError::*;
        match self {
            NotFound(_) => (StatusCode::NOT_FOUND, error_code::NOT_FOUND),
            Conflict(_) => (StatusCode::CONFLICT, error_code::ALREADY_EXISTS),
            Validation(_) => (StatusCode::BAD_REQUEST, error_code::VALIDATION_FAILED),
            Unauthorized(_) => (StatusCode::UNAUTHORIZED, error_code::UNAUTHENTICATED),
            Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, error_code::STORAGE_ERROR),
            Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, error_code::INTERNAL),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, code) = self.parts();
        let body = ErrorBody { code, message: self.to_string() };
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_map_to_status_and_code() {
        let cases = [
            (ServiceError::NotFound("x".into()), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (ServiceError::Conflict("x".into()), StatusCode::CONFLICT, "ALREADY_EXISTS"),
            (ServiceError::Validation("x".into()), StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
            (ServiceError::Unauthorized("x".into()), StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            (ServiceError::Storage("x".into()), StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            (ServiceError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.status_code(), status, "{:?}", err);
            assert_eq!(err.error_code(), code);
        }
    }

    #[test]
    fn display_is_the_bare_message() {
        assert_eq!(ServiceError::Conflict("dup key".into()).to_string(), "dup key");
    }

    #[tokio::test]
    async fn response_body_has_code_and_message() {
        let resp = ServiceError::NotFound("gone".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, serde_json::json!({"code": "NOT_FOUND", "message": "gone"}));
    }
}
