use axum::response::IntoResponse;
use axum::Json;
use http::StatusCode;
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

/// A single problem with a request, optionally tied to an input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldError {
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ApiError {
    pub errors: Vec<FieldError>,
    pub status_code: StatusCode,
}

impl ApiError {
    /// Create a new ApiError with a detail message and status code
    pub fn new<S: ToString>(detail: S, status_code: StatusCode) -> Self {
        Self {
            errors: vec![FieldError {
                detail: detail.to_string(),
                field: None,
            }],
            status_code,
        }
    }

    /// Create a validation error (400) collecting several field errors
    pub fn validation(errors: Vec<FieldError>) -> Self {
        Self {
            errors,
            status_code: StatusCode::BAD_REQUEST,
        }
    }

    /// Create new Internal Server Error (500) with a detail message
    pub fn internal<S: ToString>(detail: S) -> Self {
        Self::new(detail, StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Create new Bad Request Error (400) with a detail message
    pub fn bad_request<S: ToString>(detail: S) -> Self {
        Self::new(detail, StatusCode::BAD_REQUEST)
    }

    /// Create new Unauthorized Error (401)
    pub fn unauthorized() -> Self {
        Self::new("Unauthorized", StatusCode::UNAUTHORIZED)
    }

    /// Create new Forbidden Error (403)
    pub fn forbidden() -> Self {
        Self::new("Forbidden", StatusCode::FORBIDDEN)
    }

    /// Create new Not Found Error (404) with a detail message
    pub fn not_found<S: ToString>(detail: S) -> Self {
        Self::new(detail, StatusCode::NOT_FOUND)
    }

    /// The first error message
    pub fn detail(&self) -> &str {
        self.errors
            .first()
            .map(|error| error.detail.as_str())
            .unwrap_or_default()
    }
}

impl FieldError {
    pub fn new<S: ToString>(field: &str, detail: S) -> Self {
        Self {
            detail: detail.to_string(),
            field: Some(field.to_string()),
        }
    }
}

impl From<crate::db::StoreError> for ApiError {
    fn from(err: crate::db::StoreError) -> Self {
        log::error!("Storage failure: {}", err);
        Self::internal("Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status_code = self.status_code;
        let body = json!({
            "detail": self.detail(),
            "errors": self.errors,
        });
        (status_code, Json(body)).into_response()
    }
}
