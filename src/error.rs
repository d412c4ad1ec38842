use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

/// Every failure a handler can answer with. Rendered as
/// `{ success: false, error: CODE, message, details? }`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation {
        message: String,
        details: Option<Value>,
    },

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    InvalidToken(String),

    #[error("{message}")]
    NotFound { code: &'static str, message: String },

    #[error("Method {0} not allowed")]
    MethodNotAllowed(String),

    #[error("{message}")]
    AlreadyExists {
        message: String,
        details: Option<Value>,
    },

    /// Business-rule precondition failures (INVALID_TYPE, NO_TEMPLATE, ...).
    #[error("{message}")]
    Rule {
        code: &'static str,
        message: String,
        details: Option<Value>,
    },

    #[error("{0}")]
    RateLimited(String),

    #[error("{message}")]
    Generation { code: &'static str, message: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            details: None,
        }
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        ApiError::NotFound {
            code,
            message: message.into(),
        }
    }

    pub fn rule(code: &'static str, message: impl Into<String>) -> Self {
        ApiError::Rule {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "VALIDATION_ERROR",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::InvalidToken(_) => "INVALID_TOKEN",
            ApiError::NotFound { code, .. } => code,
            ApiError::MethodNotAllowed(_) => "METHOD_NOT_ALLOWED",
            ApiError::AlreadyExists { .. } => "ALREADY_EXISTS",
            ApiError::Rule { code, .. } => code,
            ApiError::RateLimited(_) => "RATE_LIMITED",
            ApiError::Generation { code, .. } => code,
            ApiError::Database(_) => "DATABASE_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. }
            | ApiError::AlreadyExists { .. }
            | ApiError::Rule { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) | ApiError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Generation { .. } | ApiError::Database(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            ApiError::Validation { details, .. }
            | ApiError::AlreadyExists { details, .. }
            | ApiError::Rule { details, .. } => details.clone(),
            ApiError::Database(sqlx::Error::Database(db)) => {
                Some(json!({ "code": db.code().map(|c| c.into_owned()) }))
            }
            _ => None,
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Validation {
            message: "Requête invalide".into(),
            details: serde_json::to_value(&errors).ok(),
        }
    }
}

/// Postgres SQLSTATE for unique_violation.
pub fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            db.code().as_deref() == Some("23505") && db.constraint() == Some(constraint)
        }
        _ => false,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), "request failed: {self}");
        } else {
            tracing::debug!(code = self.code(), "request rejected: {self}");
        }

        let mut body = json!({
            "success": false,
            "error": self.code(),
            "message": self.to_string(),
        });
        if let Some(details) = self.details() {
            body["details"] = details;
        }

        (status, Json(body)).into_response()
    }
}

/// Success envelope: `{ success: true, data, message? }`.
#[derive(Debug)]
pub struct ApiResponse {
    status: StatusCode,
    data: Value,
    message: Option<String>,
}

impl ApiResponse {
    pub fn ok<T: Serialize + ?Sized>(data: &T) -> Result<Self, ApiError> {
        Self::with_status(StatusCode::OK, data)
    }

    pub fn created<T: Serialize + ?Sized>(data: &T) -> Result<Self, ApiError> {
        Self::with_status(StatusCode::CREATED, data)
    }

    fn with_status<T: Serialize + ?Sized>(status: StatusCode, data: &T) -> Result<Self, ApiError> {
        let data = serde_json::to_value(data)
            .map_err(|e| anyhow::anyhow!("Failed to serialize response: {e}"))?;
        Ok(Self {
            status,
            data,
            message: None,
        })
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn data(&self) -> &Value {
        &self.data
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let mut body = json!({ "success": true, "data": self.data });
        if let Some(message) = self.message {
            body["message"] = Value::String(message);
        }
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_map_to_statuses() {
        let cases = [
            (ApiError::validation("x"), "VALIDATION_ERROR", StatusCode::BAD_REQUEST),
            (ApiError::Unauthorized("x".into()), "UNAUTHORIZED", StatusCode::UNAUTHORIZED),
            (ApiError::InvalidToken("x".into()), "INVALID_TOKEN", StatusCode::UNAUTHORIZED),
            (ApiError::not_found("DEVIS_NOT_FOUND", "x"), "DEVIS_NOT_FOUND", StatusCode::NOT_FOUND),
            (ApiError::rule("INVALID_TYPE", "x"), "INVALID_TYPE", StatusCode::BAD_REQUEST),
            (
                ApiError::MethodNotAllowed("GET".into()),
                "METHOD_NOT_ALLOWED",
                StatusCode::METHOD_NOT_ALLOWED,
            ),
            (
                ApiError::Generation { code: "NUMERO_GENERATION_ERROR", message: "x".into() },
                "NUMERO_GENERATION_ERROR",
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, code, status) in cases {
            assert_eq!(err.code(), code);
            assert_eq!(err.status(), status);
        }
    }

    #[test]
    fn already_exists_keeps_details() {
        let err = ApiError::AlreadyExists {
            message: "déjà là".into(),
            details: Some(json!({ "suggested_type": "solde" })),
        };
        assert_eq!(err.details().unwrap()["suggested_type"], "solde");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
