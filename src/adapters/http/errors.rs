use actix_web::{
  HttpResponse,
  error::ResponseError,
  http::{StatusCode, header::ContentType},
};
use serde::Serialize;
use std::fmt;

use crate::domain::invoice::{EmailError, InvoiceError};

use super::dtos::ErrorResponse;

/// API error type that maps domain errors to HTTP responses
#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum ApiError {
  /// Missing or invalid input (400 Bad Request)
  Validation(String),

  /// Invoice or services absent (404 Not Found)
  NotFound(String),

  /// Database, transaction or PDF failure (500 Internal Server Error)
  Internal(String),

  /// Provider rejected the message or was unreachable (500)
  EmailDelivery(String),
}

impl fmt::Display for ApiError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ApiError::Validation(msg) => write!(f, "Validation error: {}", msg),
      ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
      ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
      ApiError::EmailDelivery(msg) => write!(f, "Email delivery error: {}", msg),
    }
  }
}

impl ResponseError for ApiError {
  fn status_code(&self) -> StatusCode {
    match self {
      ApiError::Validation(_) => StatusCode::BAD_REQUEST,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Internal(_) | ApiError::EmailDelivery(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    let (error_type, message) = match self {
      ApiError::Validation(msg) => ("validation_error", msg.clone()),
      ApiError::NotFound(msg) => ("not_found", msg.clone()),
      ApiError::Internal(msg) => {
        // Don't expose internal error details to callers
        tracing::error!("Internal error: {}", msg);
        ("internal_error", "Internal error".to_string())
      }
      ApiError::EmailDelivery(msg) => {
        tracing::error!("Email delivery error: {}", msg);
        ("email_delivery_error", "Email delivery failed".to_string())
      }
    };

    let error_response = ErrorResponse {
      error: error_type.to_string(),
      message,
    };

    HttpResponse::build(status)
      .content_type(ContentType::json())
      .json(error_response)
  }
}

/// Convert InvoiceError to ApiError
impl From<InvoiceError> for ApiError {
  fn from(error: InvoiceError) -> Self {
    match error {
      InvoiceError::Validation(e) => ApiError::Validation(e.to_string()),
      InvoiceError::BadRequest(msg) => ApiError::Validation(msg),
      InvoiceError::MissingSource | InvoiceError::NoBillableServices => {
        ApiError::Validation(error.to_string())
      }
      InvoiceError::ServicesNotFound => ApiError::NotFound(error.to_string()),
      InvoiceError::InvoiceNotFound(_) => ApiError::NotFound("Invoice not found".to_string()),
      InvoiceError::Email(e) => ApiError::from(e),
      InvoiceError::PdfRender(_) | InvoiceError::Repository(_) | InvoiceError::Database(_) => {
        ApiError::Internal(error.to_string())
      }
    }
  }
}

/// Convert EmailError to ApiError
impl From<EmailError> for ApiError {
  fn from(error: EmailError) -> Self {
    match error {
      EmailError::MissingRecipient => ApiError::Validation(error.to_string()),
      EmailError::Delivery { .. } => ApiError::EmailDelivery(error.to_string()),
      EmailError::NotConfigured | EmailError::InvalidAttachment(_) | EmailError::Template(_) => {
        ApiError::Internal(error.to_string())
      }
    }
  }
}

/// Convert validation errors from validator crate
impl From<validator::ValidationErrors> for ApiError {
  fn from(errors: validator::ValidationErrors) -> Self {
    let messages: Vec<String> = errors
      .field_errors()
      .iter()
      .flat_map(|(field, errors)| {
        errors
          .iter()
          .map(|error| {
            error
              .message
              .as_ref()
              .map(|m| m.to_string())
              .unwrap_or_else(|| format!("Invalid field: {}", field))
          })
          .collect::<Vec<_>>()
      })
      .collect();

    ApiError::Validation(messages.join(", "))
  }
}
