//! Unified error responses for the HTTP boundary
//!
//! Every failed request is answered with the same JSON shape, carrying the
//! request id so that a client report can be matched to the server log.

use crate::api::middleware::{RequestId, REQUEST_ID_HEADER};
use crate::domain::errors::PipelineError;
use crate::domain::types::UnknownOption;
use crate::infrastructure::log_messages::request_processing as messages;
use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

/// Standard error response format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Unique error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Request ID for correlation
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            request_id: None,
            details: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Convert to HTTP response with the request id header set
    pub fn into_response_with_status(self, status: StatusCode) -> Response {
        let request_id = self.request_id.clone();
        let mut response = (status, Json(self)).into_response();

        if let Some(id) = request_id {
            if let Ok(header_value) = HeaderValue::from_str(&id) {
                response
                    .headers_mut()
                    .insert(REQUEST_ID_HEADER, header_value);
            }
        }

        response
    }
}

/// Extension trait for consistent error formatting
pub trait ErrorResponseExt {
    fn to_error_response(&self) -> ErrorResponse;

    fn status_code(&self) -> StatusCode;
}

/// Everything a handler can fail with
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    UnknownOption(#[from] UnknownOption),

    #[error("Invalid query parameter '{field}': {reason}")]
    InvalidQuery { field: String, reason: String },

    #[error("Forecast task failed: {0}")]
    TaskFailed(String),
}

impl ApiError {
    pub fn invalid_query(field: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidQuery {
            field: field.into(),
            reason: reason.to_string(),
        }
    }

    /// Attach the request id of the failing request
    pub fn for_request(self, request_id: &RequestId) -> ApiRejection {
        ApiRejection {
            error: self,
            request_id: request_id.clone(),
        }
    }
}

impl ErrorResponseExt for ApiError {
    fn to_error_response(&self) -> ErrorResponse {
        use PipelineError::*;

        match self {
            Self::Pipeline(error) => match error {
                EntityNotFound { label } => {
                    ErrorResponse::new("ENTITY_NOT_FOUND", error.to_string())
                        .with_details(serde_json::json!({ "entity": label }))
                }
                AmbiguousEntity { label, matches } => {
                    ErrorResponse::new("AMBIGUOUS_ENTITY", error.to_string())
                        .with_details(serde_json::json!({ "entity": label, "matches": matches }))
                }
                InvalidWindow(_) => ErrorResponse::new("INVALID_WINDOW", error.to_string()),
                InsufficientHistory {
                    required,
                    available,
                } => ErrorResponse::new("INSUFFICIENT_HISTORY", error.to_string()).with_details(
                    serde_json::json!({ "required": required, "available": available }),
                ),
                ModelFit { model, .. } => ErrorResponse::new("FORECAST_FAILED", error.to_string())
                    .with_details(serde_json::json!({ "model": model })),
                MissingMetric { metric } => {
                    ErrorResponse::new("UNKNOWN_METRIC", error.to_string())
                        .with_details(serde_json::json!({ "metric": metric }))
                }
                MalformedDateColumn { .. }
                | MalformedTable(_)
                | MalformedCount { .. }
                | DateNotFound { .. } => {
                    ErrorResponse::new("SOURCE_DATA_ERROR", "Source data could not be processed")
                        .with_details(serde_json::json!({ "error": error.to_string() }))
                }
            },
            Self::UnknownOption(error) => ErrorResponse::new("UNKNOWN_OPTION", error.to_string())
                .with_details(serde_json::json!({ "field": error.field, "value": error.value })),
            Self::InvalidQuery { .. } => ErrorResponse::new("INVALID_QUERY", self.to_string()),
            Self::TaskFailed(_) => {
                ErrorResponse::new("INTERNAL_ERROR", "The request could not be completed")
            }
        }
    }

    fn status_code(&self) -> StatusCode {
        use PipelineError::*;

        match self {
            Self::Pipeline(error) => match error {
                EntityNotFound { .. } => StatusCode::NOT_FOUND,
                AmbiguousEntity { .. } => StatusCode::CONFLICT,
                InvalidWindow(_) | InsufficientHistory { .. } | ModelFit { .. } => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                MissingMetric { .. } => StatusCode::BAD_REQUEST,
                MalformedDateColumn { .. }
                | MalformedTable(_)
                | MalformedCount { .. }
                | DateNotFound { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::UnknownOption(_) | Self::InvalidQuery { .. } => StatusCode::BAD_REQUEST,
            Self::TaskFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// A handler failure tied to its request
#[derive(Debug)]
pub struct ApiRejection {
    pub error: ApiError,
    pub request_id: RequestId,
}

impl IntoResponse for ApiRejection {
    fn into_response(self) -> Response {
        let status = self.error.status_code();
        if status.is_server_error() {
            error!(request_id = %self.request_id, error = %self.error, "{}", messages::REQUEST_FAILED);
        } else {
            warn!(request_id = %self.request_id, error = %self.error, "{}", messages::REQUEST_FAILED);
        }
        self.error
            .to_error_response()
            .with_request_id(self.request_id.to_string())
            .into_response_with_status(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_error_response_creation() {
        let error = ErrorResponse::new("TEST_ERROR", "Test error message");
        assert_eq!(error.code, "TEST_ERROR");
        assert!(error.request_id.is_none());
        assert!(error.details.is_none());
    }

    #[rstest]
    #[case(PipelineError::entity_not_found("Kings, Texas"), StatusCode::NOT_FOUND)]
    #[case(
        PipelineError::AmbiguousEntity { label: "A, B".to_string(), matches: 2 },
        StatusCode::CONFLICT
    )]
    #[case(PipelineError::InvalidWindow("1".to_string()), StatusCode::UNPROCESSABLE_ENTITY)]
    #[case(
        PipelineError::InsufficientHistory { required: 4, available: 1 },
        StatusCode::UNPROCESSABLE_ENTITY
    )]
    #[case(
        PipelineError::ModelFit {
            model: "trend_seasonal".to_string(),
            reason: "singular".to_string(),
        },
        StatusCode::UNPROCESSABLE_ENTITY
    )]
    #[case(PipelineError::missing_metric("Recovered"), StatusCode::BAD_REQUEST)]
    #[case(PipelineError::MalformedTable("ragged".to_string()), StatusCode::INTERNAL_SERVER_ERROR)]
    fn test_pipeline_error_status(#[case] error: PipelineError, #[case] expected: StatusCode) {
        assert_eq!(ApiError::from(error).status_code(), expected);
    }

    #[test]
    fn test_model_fit_failure_names_the_model() {
        let error = ApiError::from(PipelineError::ModelFit {
            model: "trend_seasonal".to_string(),
            reason: "singular".to_string(),
        });
        let response = error.to_error_response();
        assert_eq!(response.code, "FORECAST_FAILED");
        assert_eq!(
            response.details,
            Some(serde_json::json!({ "model": "trend_seasonal" }))
        );
    }

    #[test]
    fn test_source_data_errors_hide_internals_in_message() {
        let error = ApiError::from(PipelineError::MalformedCount {
            column: "1/2/20".to_string(),
            value: "x".to_string(),
        });
        let response = error.to_error_response();
        assert_eq!(response.code, "SOURCE_DATA_ERROR");
        assert!(response.details.is_some());
    }

    #[test]
    fn test_rejection_carries_request_id_header() {
        let request_id = RequestId::new();
        let response = ApiError::invalid_query("window", "not a number")
            .for_request(&request_id)
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok()),
            Some(request_id.to_string().as_str())
        );
    }
}
