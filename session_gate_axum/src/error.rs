use http::StatusCode;
use session_gate::CoordinationError;

use crate::response::ApiError;

/// Helper trait for converting errors to a standard response error format
pub trait IntoResponseError<T> {
    fn into_response_error(self) -> Result<T, ApiError>;
}

/// Map coordination failures to status codes and client-facing codes
impl<T> IntoResponseError<T> for Result<T, CoordinationError> {
    fn into_response_error(self) -> Result<T, ApiError> {
        self.map_err(|e| {
            let (status, code) = match &e {
                CoordinationError::MissingFields => (StatusCode::BAD_REQUEST, "MISSING_FIELDS"),
                CoordinationError::MissingUsername => {
                    (StatusCode::BAD_REQUEST, "MISSING_USERNAME")
                }
                CoordinationError::PasswordTooShort(_) => {
                    (StatusCode::BAD_REQUEST, "PASSWORD_TOO_SHORT")
                }
                CoordinationError::UserNotFound => (StatusCode::NOT_FOUND, "USER_NOT_FOUND"),
                CoordinationError::InvalidPassword => {
                    (StatusCode::UNAUTHORIZED, "INVALID_PASSWORD")
                }
                CoordinationError::InvalidCurrentPassword => {
                    (StatusCode::UNAUTHORIZED, "INVALID_CURRENT_PASSWORD")
                }
                CoordinationError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
                CoordinationError::SessionError(_)
                | CoordinationError::UserError(_)
                | CoordinationError::UtilsError(_) => return ApiError::internal(),
            };
            ApiError::new(status, code, e.to_string())
        })
    }
}

/// Implementation for http::Error (used by Response::builder())
impl<T> IntoResponseError<T> for http::Result<T> {
    fn into_response_error(self) -> Result<T, ApiError> {
        self.map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use session_gate::{SessionError, UserError};

    fn status_and_code(err: CoordinationError) -> (StatusCode, &'static str) {
        let result: Result<(), CoordinationError> = Err(err);
        let api_error = result.into_response_error().unwrap_err();
        (api_error.status, api_error.code)
    }

    #[test]
    fn test_client_errors() {
        assert_eq!(
            status_and_code(CoordinationError::MissingFields),
            (StatusCode::BAD_REQUEST, "MISSING_FIELDS")
        );
        assert_eq!(
            status_and_code(CoordinationError::MissingUsername),
            (StatusCode::BAD_REQUEST, "MISSING_USERNAME")
        );
        assert_eq!(
            status_and_code(CoordinationError::PasswordTooShort(6)),
            (StatusCode::BAD_REQUEST, "PASSWORD_TOO_SHORT")
        );
        assert_eq!(
            status_and_code(CoordinationError::UserNotFound),
            (StatusCode::NOT_FOUND, "USER_NOT_FOUND")
        );
        assert_eq!(
            status_and_code(CoordinationError::InvalidPassword),
            (StatusCode::UNAUTHORIZED, "INVALID_PASSWORD")
        );
        assert_eq!(
            status_and_code(CoordinationError::InvalidCurrentPassword),
            (StatusCode::UNAUTHORIZED, "INVALID_CURRENT_PASSWORD")
        );
        assert_eq!(
            status_and_code(CoordinationError::Conflict("dup".to_string())),
            (StatusCode::CONFLICT, "CONFLICT")
        );
    }

    #[test]
    fn test_storage_errors_hide_detail() {
        let result: Result<(), CoordinationError> = Err(CoordinationError::SessionError(
            SessionError::User(UserError::Storage("connection refused at 10.0.0.5".to_string())),
        ));

        let api_error = result.into_response_error().unwrap_err();

        assert_eq!(api_error.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api_error.code, "SERVER_ERROR");
        assert_eq!(api_error.message, "Internal server error");
    }

    #[test]
    fn test_ok_passes_through() {
        let result: Result<u8, CoordinationError> = Ok(7);
        assert_eq!(result.into_response_error().unwrap(), 7);
    }
}
