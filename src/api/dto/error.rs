//! Error response DTOs.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use utoipa::ToSchema;

use crate::error::ValidationFieldError;

/// Standard error response format.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "code": "NOT_FOUND",
    "message": "Product with ID '42' not found.",
    "request_id": "5f0c1c8e-3c1a-4a55-9d1b-1c2f3e4d5a6b"
}))]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorResponse {
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            details: None,
            request_id: None,
        }
    }

    pub fn not_found_error(message: &str, entity: &str, field: &str, value: &str) -> Self {
        Self::new("NOT_FOUND", message).with_details(json!({
            "entity": entity,
            "field": field,
            "value": value,
        }))
    }

    pub fn duplicate_error(entity: &str, field: &str, value: &str) -> Self {
        Self::new(
            "DUPLICATE_ENTRY",
            &format!("{entity} with {field} '{value}' already exists"),
        )
        .with_details(json!({
            "entity": entity,
            "field": field,
            "value": value,
        }))
    }

    pub fn validation_error(field: &str, reason: &str) -> Self {
        Self::new("VALIDATION_ERROR", &format!("Validation failed for {field}: {reason}"))
            .with_details(json!({
                "field": field,
                "reason": reason,
            }))
    }

    pub fn validation_errors(errors: &[ValidationFieldError]) -> Self {
        Self::new("VALIDATION_ERROR", "One or more validation errors occurred")
            .with_details(json!({ "errors": errors }))
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Adds request ID to the error response for correlation.
    pub fn with_request_id(mut self, request_id: &str) -> Self {
        self.request_id = Some(request_id.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_fields_are_omitted() {
        let body = serde_json::to_value(ErrorResponse::new("BAD_REQUEST", "Problem creating order"))
            .unwrap();
        assert_eq!(
            body,
            json!({"code": "BAD_REQUEST", "message": "Problem creating order"})
        );
    }

    #[test]
    fn test_validation_errors_list_fields() {
        let body = ErrorResponse::validation_errors(&[ValidationFieldError::new(
            "email",
            "Invalid email",
        )]);
        let details = body.details.unwrap();
        assert_eq!(details["errors"][0]["field"], "email");
        assert_eq!(details["errors"][0]["message"], "Invalid email");
    }
}
