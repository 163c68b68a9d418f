//! JSON error responses.
//!
//! Every failure leaves the API as
//! `{"error": {"message": ..., "type": ..., "code": ...}}` with `code` only
//! present when a client is expected to branch on it.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mei_core::{CalculationError, RepositoryError, UsageQuota};
use serde::{Deserialize, Serialize};
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorType {
    InvalidRequestError,
    AuthenticationError,
    PermissionError,
    NotFoundError,
    ServerError,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: ApiErrorType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Usage snapshot attached to quota denials.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageQuota>,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ApiErrorResponse,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        error_type: ApiErrorType,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            response: ApiErrorResponse {
                error: ApiErrorDetail {
                    message: message.into(),
                    error_type,
                    code: None,
                    usage: None,
                },
            },
        }
    }

    pub fn with_code(
        mut self,
        code: impl Into<String>,
    ) -> Self {
        self.response.error.code = Some(code.into());
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ApiErrorType::InvalidRequestError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, ApiErrorType::AuthenticationError, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, ApiErrorType::PermissionError, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ApiErrorType::NotFoundError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, ApiErrorType::ServerError, message)
    }

    /// The plan's allowance for the current period is used up.
    pub fn quota_exceeded(usage: UsageQuota) -> Self {
        let mut err = Self::forbidden(format!(
            "{} plan limit reached for this month; upgrade to save more calculations",
            usage.plan
        ))
        .with_code("quota_exceeded");
        err.response.error.usage = Some(usage);
        err
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

impl From<CalculationError> for ApiError {
    fn from(err: CalculationError) -> Self {
        match err {
            CalculationError::InvalidInput(message) => {
                Self::bad_request(message).with_code("invalid_input")
            }
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::not_found("Resource not found"),
            other => {
                // Storage details stay in the log.
                error!(error = %other, "storage failure");
                Self::internal("Internal server error")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use mei_core::{Limit, Plan};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn invalid_input_maps_to_400() {
        let err = ApiError::from(CalculationError::InvalidInput(
            "revenue must be non-negative, got -1".to_string(),
        ));

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.response.error.code.as_deref(), Some("invalid_input"));
    }

    #[test]
    fn not_found_maps_to_404() {
        let err = ApiError::from(RepositoryError::NotFound);

        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn database_error_is_500_without_details() {
        let err = ApiError::from(RepositoryError::Database("disk I/O error".to_string()));

        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.response.error.message.contains("disk"));
    }

    #[test]
    fn quota_exceeded_body() {
        let usage = UsageQuota::new(Plan::Free, 10, Limit::Count(10));

        let err = ApiError::quota_exceeded(usage);

        assert_eq!(err.status, StatusCode::FORBIDDEN);
        let body = serde_json::to_value(&err.response).unwrap();
        assert_eq!(body["error"]["type"], json!("permission_error"));
        assert_eq!(body["error"]["code"], json!("quota_exceeded"));
        assert_eq!(
            body["error"]["usage"],
            json!({"plan": "FREE", "used": 10, "limit": 10, "remaining": 0})
        );
    }

    #[test]
    fn code_is_omitted_when_absent() {
        let body = serde_json::to_value(ApiError::not_found("nope").response).unwrap();

        assert_eq!(
            body,
            json!({"error": {"message": "nope", "type": "not_found_error"}})
        );
    }
}
