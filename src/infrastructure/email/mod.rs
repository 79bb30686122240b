//! Invoice e-mail delivery: message composition plus pluggable transports.

pub mod mailer;
pub mod mock_provider;
pub mod sendgrid;

use async_trait::async_trait;

use crate::domain::invoice::errors::EmailError;

pub use mailer::BrandedInvoiceMailer;
pub use mock_provider::MockEmailProvider;
pub use sendgrid::SendGridProvider;

pub const PDF_MIME_TYPE: &str = "application/pdf";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
  pub email: String,
  pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Attachment {
  /// Base64 encoded.
  pub content: String,
  pub filename: String,
  pub mime_type: String,
  pub disposition: String,
}

#[derive(Debug, Clone)]
pub struct EmailMessage {
  pub to: Vec<String>,
  pub cc: Vec<String>,
  pub from: Mailbox,
  pub reply_to: Option<String>,
  pub subject: String,
  pub text_body: String,
  pub html_body: String,
  pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderResponse {
  pub status: u16,
}

#[async_trait]
pub trait EmailProvider: Send + Sync {
  /// Short provider name reported back to API callers.
  fn engine(&self) -> &'static str;

  /// Whether credentials are present. Checked before anything is sent.
  fn is_configured(&self) -> bool;

  async fn send(&self, message: &EmailMessage) -> Result<ProviderResponse, EmailError>;
}

/// Splits a comma separated recipient list, dropping blanks.
pub fn parse_recipients(value: &str) -> Vec<String> {
  value
    .split(',')
    .map(str::trim)
    .filter(|address| !address.is_empty())
    .map(str::to_string)
    .collect()
}
