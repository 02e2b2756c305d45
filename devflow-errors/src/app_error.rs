use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field name to the messages that field failed with.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum AppError {
    #[error("Validation failed: {message}")]
    Validation { message: String, details: FieldErrors },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not permitted: {0}")]
    Authorization(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Persistence failure: {0}")]
    Persistence(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl AppError {
    pub fn validation(details: FieldErrors) -> Self {
        let message = details
            .iter()
            .flat_map(|(field, messages)| messages.iter().map(move |m| format!("{field}: {m}")))
            .collect::<Vec<_>>()
            .join(", ");
        Self::Validation { message, details }
    }

    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let mut details = FieldErrors::new();
        details.insert(field.to_string(), vec![message.into()]);
        Self::validation(details)
    }

    pub fn not_found(what: &str) -> Self {
        Self::NotFound(what.to_string())
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message, .. } => message.clone(),
            Self::Unauthorized => "You must be signed in to do that.".to_string(),
            Self::Authorization(msg) => msg.clone(),
            Self::NotFound(what) => format!("{what} not found"),
            Self::Persistence(_) => "Something went wrong on our side. Try again later.".to_string(),
            Self::Forbidden(msg) => msg.clone(),
        }
    }

    pub fn details(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation { details, .. } if !details.is_empty() => Some(details),
            _ => None,
        }
    }
}

#[cfg(feature = "ssr")]
mod ssr_impl {
    use super::AppError;
    use crate::ActionResponse;
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::Json;

    impl IntoResponse for AppError {
        fn into_response(self) -> Response {
            let status = match &self {
                AppError::Validation { .. } => StatusCode::BAD_REQUEST,
                AppError::Unauthorized => StatusCode::UNAUTHORIZED,
                AppError::Authorization(_) => StatusCode::FORBIDDEN,
                AppError::NotFound(_) => StatusCode::NOT_FOUND,
                AppError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
                AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            };
            (status, Json(ActionResponse::<()>::failure(&self))).into_response()
        }
    }
}
