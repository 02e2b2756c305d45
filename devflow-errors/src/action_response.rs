use crate::{AppError, FieldErrors};
use serde::{Deserialize, Serialize};

/// Tagged result handed to callers: `{success: true, data?}` or
/// `{success: false, error: {message, details?}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<FieldErrors>,
}

impl<T> ActionResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(error: &AppError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorBody {
                message: error.user_message(),
                details: error.details().cloned(),
            }),
        }
    }
}

impl ActionResponse<()> {
    pub fn empty() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }
}

impl<T> From<Result<T, AppError>> for ActionResponse<T> {
    fn from(result: Result<T, AppError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::failure(&e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_shape() {
        let body = serde_json::to_value(ActionResponse::ok(json!({ "saved": true }))).unwrap();
        assert_eq!(body, json!({ "success": true, "data": { "saved": true } }));

        let body = serde_json::to_value(ActionResponse::empty()).unwrap();
        assert_eq!(body, json!({ "success": true }));
    }

    #[test]
    fn test_failure_shape() {
        let response: ActionResponse<()> = Err(AppError::not_found("Answer")).into();
        let body = serde_json::to_value(response).unwrap();
        assert_eq!(
            body,
            json!({ "success": false, "error": { "message": "Answer not found" } })
        );
    }

    #[test]
    fn test_failure_carries_validation_details() {
        let response = ActionResponse::<()>::failure(&AppError::invalid_field(
            "content",
            "must not be empty",
        ));
        let error = response.error.unwrap();
        assert_eq!(error.message, "content: must not be empty");
        assert_eq!(
            error.details.unwrap().get("content"),
            Some(&vec!["must not be empty".to_string()])
        );
    }
}
