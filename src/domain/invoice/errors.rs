use super::value_objects::ValueObjectError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InvoiceError {
  #[error("Validation error: {0}")]
  Validation(#[from] ValueObjectError),

  #[error("{0}")]
  BadRequest(String),

  #[error("client_id/service_ids or items[] are required")]
  MissingSource,

  #[error("No billable services")]
  NoBillableServices,

  #[error("Services not found for that client")]
  ServicesNotFound,

  #[error("Invoice not found: {0}")]
  InvoiceNotFound(i64),

  #[error("PDF generation failed: {0}")]
  PdfRender(String),

  #[error("Email error: {0}")]
  Email(#[from] EmailError),

  #[error("Repository error: {0}")]
  Repository(String),

  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),
}

#[derive(Debug, Error)]
pub enum EmailError {
  #[error("Email provider API key is not configured")]
  NotConfigured,

  #[error("\"to\" is required")]
  MissingRecipient,

  #[error("Invalid attachment: {0}")]
  InvalidAttachment(String),

  #[error("Email template error: {0}")]
  Template(String),

  #[error("Email delivery failed: {message}")]
  Delivery {
    status: Option<u16>,
    message: String,
  },
}
