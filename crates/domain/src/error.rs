use serde::Serialize;

/// Shared error type used across all forge crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("provider {provider}: {message}")]
    Provider { provider: String, message: String },

    #[error("validation: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("business rule violated: {code}: {message}")]
    BusinessRule { code: String, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("config: {0}")]
    Config(String),

    #[error("auth: {0}")]
    Auth(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// The error kind, used to pick an HTTP status and a stable error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    BusinessRule,
    NotFound,
    Conflict,
    ExternalApi,
    Database,
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation { .. } => ErrorKind::Validation,
            Error::BusinessRule { .. } => ErrorKind::BusinessRule,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Conflict(_) => ErrorKind::Conflict,
            Error::Provider { .. } | Error::Timeout(_) | Error::Http(_) => ErrorKind::ExternalApi,
            Error::Io(_) => ErrorKind::Database,
            Error::Json(_) | Error::Config(_) | Error::Auth(_) | Error::Other(_) => ErrorKind::Internal,
        }
    }

    /// A stable machine-readable code, independent of the human message.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation { .. } => "VALIDATION_ERROR",
            Error::BusinessRule { code, .. } => {
                // Business-rule errors carry their own enforcement code
                // (e.g. `CLAIM_LIMIT_EXCEEDED`); this generic code is the
                // fallback when `code` isn't one `axum`'s router can see
                // statically. Callers needing the precise code should
                // match on `code` directly.
                let _ = code;
                "BUSINESS_RULE_VIOLATION"
            }
            Error::NotFound(_) => "NOT_FOUND",
            Error::Conflict(_) => "CONFLICT",
            Error::Provider { .. } | Error::Timeout(_) | Error::Http(_) => "EXTERNAL_API_ERROR",
            Error::Io(_) => "DATABASE_ERROR",
            Error::Json(_) | Error::Config(_) | Error::Auth(_) | Error::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// The HTTP status code this error maps to.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::BusinessRule => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::ExternalApi | ErrorKind::Database => 503,
            ErrorKind::Internal => 500,
        }
    }
}

/// REST error envelope: `{"error": {"code", "message", "field"?}}`.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl From<&Error> for ErrorEnvelope {
    fn from(err: &Error) -> Self {
        let field = match err {
            Error::Validation { field, .. } => Some(field.clone()),
            _ => None,
        };
        let code = match err {
            Error::BusinessRule { code, .. } => code.clone(),
            other => other.code().to_string(),
        };
        ErrorEnvelope {
            error: ErrorBody {
                code,
                message: err.to_string(),
                field,
            },
        }
    }
}

/// Tool-result-shaped error envelope, returned to the model so it can
/// correct itself instead of the session aborting. Deliberately a
/// different shape from [`ErrorEnvelope`] — the model expects a flat
/// `status`/`error_code`/`message` object, not a REST `{error: {...}}`
/// wrapper.
pub fn tool_error(code: &str, message: impl Into<String>) -> serde_json::Value {
    serde_json::json!({
        "status": "error",
        "error_code": code,
        "message": message.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_rule_maps_to_400() {
        let err = Error::BusinessRule {
            code: "CLAIM_LIMIT_EXCEEDED".into(),
            message: "too many claims".into(),
        };
        assert_eq!(err.status_code(), 400);
        let envelope = ErrorEnvelope::from(&err);
        assert_eq!(envelope.error.code, "CLAIM_LIMIT_EXCEEDED");
    }

    #[test]
    fn not_found_maps_to_404() {
        let err = Error::NotFound("session abc".into());
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn tool_error_is_flat_not_nested() {
        let v = tool_error("NOT_CUMULATIVE", "claim does not extend prior evidence");
        assert_eq!(v["status"], "error");
        assert_eq!(v["error_code"], "NOT_CUMULATIVE");
        assert!(v.get("error").is_none());
    }
}
