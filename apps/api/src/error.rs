use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use feedesk_core::{AccountError, AppError};
use tracing::error;

mod types;

pub use types::ErrorResponse;

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl From<AccountError> for ApiError {
    fn from(value: AccountError) -> Self {
        Self(AppError::Account(value))
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Account(account) => match account {
                AccountError::TokenMalformed | AccountError::InvalidTarget(_) => {
                    StatusCode::BAD_REQUEST
                }
                AccountError::InvitationNotFound => StatusCode::NOT_FOUND,
                AccountError::InvitationExpired => StatusCode::GONE,
                AccountError::InvitationAlreadyUsed
                | AccountError::DuplicateAccount
                | AccountError::AlreadyImpersonating => StatusCode::CONFLICT,
                AccountError::ProfileIncomplete(_) => StatusCode::UNPROCESSABLE_ENTITY,
                AccountError::ProvisionPartialFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
                AccountError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            },
        }
    }

    fn code(&self) -> &'static str {
        match &self.0 {
            AppError::Validation(_) => "validation",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::RateLimited(_) => "rate_limited",
            AppError::Internal(_) => "internal",
            AppError::Account(account) => account.code(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Driver detail stays in the log.
        let message = if let AppError::Internal(detail) = &self.0 {
            error!(%detail, "request failed");
            "internal error, please retry later".to_owned()
        } else {
            self.0.to_string()
        };

        let payload = Json(ErrorResponse {
            code: self.code(),
            message,
        });

        (status, payload).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;
