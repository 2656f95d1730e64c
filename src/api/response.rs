//! JSON envelope shared by every endpoint
//!
//! Every body looks like `{ "success": bool, ... }` with the optional keys
//! `message`, `data`, `count`, `total`, `page`, `pages` and `error` present
//! only when set.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::{Error, ErrorCategory};
use crate::storage::Page;

// ============================================================================
// API Response Types
// ============================================================================

/// Generic API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            count: None,
            total: None,
            page: None,
            pages: None,
            error: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl<T: Serialize> ApiResponse<Vec<T>> {
    /// List body carrying its length in `count`
    pub fn list(items: Vec<T>) -> Self {
        let count = items.len();
        Self {
            count: Some(count),
            ..Self::success(items)
        }
    }

    /// One page of a listing with its totals
    pub fn paginated(page: Page<T>) -> Self {
        let pages = page.pages();
        Self {
            total: Some(page.total),
            page: Some(page.page),
            pages: Some(pages),
            ..Self::list(page.items)
        }
    }
}

impl ApiResponse<()> {
    /// Body with a message and no data
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            data: None,
            ..Self::success(())
        }
        .with_message(message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            ..Self::success(())
        }
    }
}

/// Handler result: an envelope or an [`Error`] rendered as one
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, Error>;

// ============================================================================
// Error Mapping
// ============================================================================

impl Error {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            e if e.is_unique_violation() => StatusCode::BAD_REQUEST,
            e if e.category() == ErrorCategory::Validation => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if self.is_unique_violation() {
            "Record already exists (duplicate NPSN, email or id)".to_string()
        } else if status.is_server_error() {
            tracing::error!(error = %self, category = self.category().as_str(), "Request failed");
            self.to_string()
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
            self.to_string()
        };

        (status, Json(ApiResponse::error(message))).into_response()
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

// ============================================================================
// Extractors
// ============================================================================

/// `Json` extractor whose rejection is an enveloped 400
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct ApiJson<T>(pub T);

/// `Query` extractor whose rejection is an enveloped 400
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(Error))]
pub struct ApiQuery<T>(pub T);
