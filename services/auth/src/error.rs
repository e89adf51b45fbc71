use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::mailer::MailError;

/// Auth flow error variants. Messages are the full client-visible
/// detail; store-level `NotFound` and `Expired` both surface as
/// `InvalidCredential` so callers cannot enumerate which occurred.
#[derive(Debug, thiserror::Error)]
pub enum AuthFlowError {
    #[error("Valid email required.")]
    InvalidEmail,
    #[error("{hint}")]
    RateLimited { hint: &'static str },
    #[error("Code expired or invalid. Please request a new one.")]
    InvalidCredential,
    #[error("Incorrect code.")]
    IncorrectCode,
    #[error("Too many attempts.")]
    AttemptsExhausted,
    #[error("Could not send email. Please try again.")]
    Delivery(#[source] MailError),
    #[error("Something went wrong.")]
    Internal(#[from] anyhow::Error),
}

impl AuthFlowError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::InvalidCredential => "INVALID_CREDENTIAL",
            Self::IncorrectCode => "INCORRECT_CODE",
            Self::AttemptsExhausted => "ATTEMPTS_EXHAUSTED",
            Self::Delivery(_) => "DELIVERY_FAILURE",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

impl IntoResponse for AuthFlowError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidEmail | Self::InvalidCredential | Self::IncorrectCode => {
                StatusCode::BAD_REQUEST
            }
            Self::RateLimited { .. } | Self::AttemptsExhausted => StatusCode::TOO_MANY_REQUESTS,
            Self::Delivery(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // 4xx are expected client outcomes; TraceLayer already records
        // method/uri/status. 5xx-class failures carry causes worth a log line.
        match &self {
            Self::Delivery(e) => {
                tracing::warn!(error = %e, kind = self.kind(), "email delivery failed");
            }
            Self::Internal(e) => {
                tracing::error!(error = %e, kind = self.kind(), "internal error");
            }
            _ => {}
        }
        let body = serde_json::json!({
            "ok": false,
            "error": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
