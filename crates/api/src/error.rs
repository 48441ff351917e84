use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use users_domain::DomainError;
use users_observability::{ErrorReport, GENERIC_FAULT_MESSAGE};

use crate::auth::AuthError;

/// Every failure a handler or guard can return.
///
/// `into_response` leaves an empty body and attaches an [`ErrorReport`];
/// the error responder middleware turns it into the JSON error body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error(transparent)]
    Authentication(#[from] AuthError),

    #[error("{message}")]
    Rejection { status: StatusCode, message: String },

    #[error("{0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("handler panicked: {message}")]
    Panic {
        message: String,
        backtrace: Option<String>,
    },
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::Rejection {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Rejection {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
        }
    }

    pub fn report(&self) -> ErrorReport {
        match self {
            ApiError::Domain(err) => domain_report(err),
            ApiError::Validation(errors) => {
                let (messages, details) = validation_messages(errors);
                ErrorReport::http(400, "ValidationError", messages).with_details(details)
            }
            ApiError::Authentication(err) => ErrorReport::http(401, "Unauthorized", err.to_string()),
            ApiError::Rejection { status, message } => {
                ErrorReport::http(status.as_u16(), "HttpException", message.as_str())
            }
            ApiError::NotFound(message) => ErrorReport::http(404, "NotFound", message.as_str()),
            ApiError::Internal(err) => ErrorReport::fault(GENERIC_FAULT_MESSAGE)
                .with_error_type("InternalError")
                .with_stack(format!("{err:?}")),
            ApiError::Panic { message, backtrace } => ErrorReport::fault(GENERIC_FAULT_MESSAGE)
                .with_error_type("Panic")
                .with_stack(format!(
                    "{message}\n{}",
                    backtrace.as_deref().unwrap_or("(backtrace unavailable)")
                )),
        }
    }
}

fn domain_report(err: &DomainError) -> ErrorReport {
    match err {
        DomainError::NotFound(message) => ErrorReport::http(404, "NotFound", message.as_str()),
        DomainError::Conflict(message) => ErrorReport::http(409, "Conflict", message.as_str()),
        DomainError::Validation(message) => {
            ErrorReport::http(400, "ValidationError", message.as_str())
        }
        DomainError::InvalidCredentials => {
            ErrorReport::http(401, "Unauthorized", err.to_string())
        }
        DomainError::Storage(source) => ErrorReport::fault(GENERIC_FAULT_MESSAGE)
            .with_error_type("StorageError")
            .with_stack(format!("{source:?}")),
    }
}

/// Flattens field errors into sorted messages plus a `{field: [codes]}` map.
fn validation_messages(errors: &validator::ValidationErrors) -> (Vec<String>, serde_json::Value) {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    let mut messages = Vec::new();
    let mut details = serde_json::Map::new();
    for (field, field_errors) in fields {
        let codes: Vec<serde_json::Value> = field_errors
            .iter()
            .map(|e| serde_json::Value::String(e.code.to_string()))
            .collect();
        details.insert(field.to_string(), serde_json::Value::Array(codes));

        for error in field_errors {
            messages.push(match &error.message {
                Some(message) => message.to_string(),
                None => format!("{field} is invalid"),
            });
        }
    }

    (messages, serde_json::Value::Object(details))
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let report = self.report();
        let status = report
            .declared_status
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut response = status.into_response();
        response.extensions_mut().insert(report);
        response
    }
}
