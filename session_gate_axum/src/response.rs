//! JSON envelope shared by every gate and route response

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;

/// `{success, message, code, data?, path?, valid?}`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Envelope {
    pub success: bool,
    pub message: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,
}

impl Envelope {
    pub fn ok(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            code,
            data: None,
            path: None,
            valid: None,
        }
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn valid(mut self, valid: bool) -> Self {
        self.valid = Some(valid);
        self
    }
}

/// Failed request, rendered as an [`Envelope`] with `success: false`
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub path: Option<String>,
    pub valid: Option<bool>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            path: None,
            valid: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_valid(mut self, valid: bool) -> Self {
        self.valid = Some(valid);
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message)
    }

    pub fn not_found(path: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", "Resource not found").with_path(path)
    }

    /// Generic 500 that never carries internal detail
    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "SERVER_ERROR",
            "Internal server error",
        )
    }

    pub(crate) fn envelope(&self) -> Envelope {
        Envelope {
            success: false,
            message: self.message.clone(),
            code: self.code,
            data: None,
            path: self.path.clone(),
            valid: self.valid,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.envelope())).into_response()
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_skips_absent_fields() {
        let value = serde_json::to_value(Envelope::ok("SUCCESS", "done")).unwrap();

        assert_eq!(
            value,
            json!({"success": true, "message": "done", "code": "SUCCESS"})
        );
    }

    #[test]
    fn test_envelope_with_data_and_valid() {
        let value = serde_json::to_value(
            Envelope::ok("SESSION_VALID", "Session is valid")
                .data(json!({"username": "alice"}))
                .valid(true),
        )
        .unwrap();

        assert_eq!(value["data"]["username"], "alice");
        assert_eq!(value["valid"], true);
    }

    #[test]
    fn test_api_error_envelope() {
        let error = ApiError::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "nope")
            .with_path("/api/users");

        let value = serde_json::to_value(error.envelope()).unwrap();

        assert_eq!(
            value,
            json!({
                "success": false,
                "message": "nope",
                "code": "UNAUTHORIZED",
                "path": "/api/users"
            })
        );
    }

    #[test]
    fn test_api_error_status() {
        let response = ApiError::internal().into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = ApiError::not_found("/nowhere").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
