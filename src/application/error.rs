use serde::Serialize;
use thiserror::Error;

use crate::application::repos::RepoError;
use crate::domain::error::DomainError;
use crate::infra::error::InfraError;

/// Field-level validation detail carried in the error envelope.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Application-level error taxonomy; the single place HTTP status mapping
/// draws from.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },
    #[error("{message}")]
    Conflict { message: String },
    #[error("{message}")]
    Validation {
        message: String,
        errors: Vec<FieldError>,
    },
    #[error("{message}")]
    Unauthorized { message: String },
    #[error("upstream service unavailable: {message}")]
    Upstream { message: String },
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn validation_fields(message: impl Into<String>, errors: Vec<FieldError>) -> Self {
        Self::Validation {
            message: message.into(),
            errors,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
        }
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}

impl From<DomainError> for AppError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::NotFound { entity } => AppError::NotFound { entity },
            DomainError::Validation { message } => AppError::Validation {
                message,
                errors: Vec::new(),
            },
            DomainError::Conflict { message } => AppError::Conflict { message },
        }
    }
}

impl From<RepoError> for AppError {
    fn from(error: RepoError) -> Self {
        match error {
            RepoError::NotFound => AppError::not_found("resource"),
            RepoError::Duplicate { constraint } => AppError::Conflict {
                message: format!("resource already exists ({constraint})"),
            },
            RepoError::InvalidInput { message } => AppError::Validation {
                message,
                errors: Vec::new(),
            },
            RepoError::Integrity { message } => AppError::Conflict { message },
            RepoError::Timeout => AppError::Upstream {
                message: "database timeout".to_string(),
            },
            RepoError::Persistence(message) => AppError::Unexpected(message),
        }
    }
}
