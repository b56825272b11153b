//! # Response Envelope
//!
//! The wire shape every operation result travels in.
//!
//! ## Contract
//! ```text
//! Success:  { "status": "success", "data": { ... } }
//! Error:    { "status": "error", "code": "NOT_FOUND", "message": "..." }
//! ```
//!
//! The presentation adapter pairs the error body with
//! [`ApiError::http_status`](crate::error::ApiError::http_status) for the
//! actual response status line.

use serde::Serialize;

use crate::error::{ApiError, ErrorCode};

/// Successful response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    /// Always `"success"`; the discriminator callers switch on.
    pub status: &'static str,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Wraps a payload in the success envelope.
    pub fn success(data: T) -> Self {
        ApiResponse {
            status: "success",
            data,
        }
    }
}

/// Error response envelope.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Always `"error"`.
    pub status: &'static str,
    pub code: ErrorCode,
    pub message: String,
}

impl From<ApiError> for ErrorResponse {
    fn from(err: ApiError) -> Self {
        ErrorResponse {
            status: "error",
            code: err.code,
            message: err.message,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope() {
        let json = serde_json::to_value(ApiResponse::success(serde_json::json!({ "n": 1 }))).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["data"]["n"], 1);
    }

    #[test]
    fn test_error_envelope() {
        let err = ApiError::not_found("Sale", "s-1");
        let body: ErrorResponse = err.into();
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Sale not found: s-1");
    }
}
