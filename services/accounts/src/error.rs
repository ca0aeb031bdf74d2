use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Accounts service domain error variants.
#[derive(Debug, thiserror::Error)]
pub enum AccountsServiceError {
    #[error("invalid phone number")]
    InvalidPhoneNumber,
    #[error("invalid code format")]
    InvalidCodeFormat,
    #[error("invalid email")]
    InvalidEmail,
    #[error("name must be at most 150 characters")]
    InvalidName,
    #[error("missing data")]
    MissingData,
    #[error("user not found")]
    UserNotFound,
    #[error("invalid code")]
    InvalidCode,
    #[error("user disabled")]
    UserDisabled,
    #[error("invalid referral code")]
    InvalidReferralCode,
    #[error("cannot refer yourself")]
    SelfReferral,
    #[error("invalid token")]
    InvalidToken,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl AccountsServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidPhoneNumber => "INVALID_PHONE_NUMBER",
            Self::InvalidCodeFormat => "INVALID_CODE_FORMAT",
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::InvalidName => "INVALID_NAME",
            Self::MissingData => "MISSING_DATA",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::InvalidCode => "INVALID_CODE",
            Self::UserDisabled => "USER_DISABLED",
            Self::InvalidReferralCode => "INVALID_REFERRAL_CODE",
            Self::SelfReferral => "SELF_REFERRAL",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidPhoneNumber
            | Self::InvalidCodeFormat
            | Self::InvalidEmail
            | Self::InvalidName
            | Self::MissingData
            | Self::InvalidReferralCode
            | Self::SelfReferral => StatusCode::BAD_REQUEST,
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::InvalidCode | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::UserDisabled => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AccountsServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        // TraceLayer already records every request's status; only 500s need their cause.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = %format!("{e:#}"), kind = "INTERNAL", "internal error");
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
