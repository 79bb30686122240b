use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{EmailMessage, EmailProvider, ProviderResponse};
use crate::domain::invoice::errors::EmailError;

/// Mock email provider for testing and local development.
///
/// Keeps every accepted message in memory instead of delivering it.
pub struct MockEmailProvider {
  configured: bool,
  send_count: AtomicU64,
  sent: Mutex<Vec<EmailMessage>>,
}

impl Default for MockEmailProvider {
  fn default() -> Self {
    Self::new()
  }
}

impl MockEmailProvider {
  pub fn new() -> Self {
    Self {
      configured: true,
      send_count: AtomicU64::new(0),
      sent: Mutex::new(Vec::new()),
    }
  }

  /// Behaves like a provider without an API key.
  pub fn unconfigured() -> Self {
    Self {
      configured: false,
      ..Self::new()
    }
  }

  pub fn send_count(&self) -> u64 {
    self.send_count.load(Ordering::SeqCst)
  }

  pub fn sent_messages(&self) -> Vec<EmailMessage> {
    self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
  }
}

#[async_trait]
impl EmailProvider for MockEmailProvider {
  fn engine(&self) -> &'static str {
    "mock"
  }

  fn is_configured(&self) -> bool {
    self.configured
  }

  async fn send(&self, message: &EmailMessage) -> Result<ProviderResponse, EmailError> {
    if !self.configured {
      return Err(EmailError::NotConfigured);
    }

    self.send_count.fetch_add(1, Ordering::SeqCst);
    self
      .sent
      .lock()
      .unwrap_or_else(|e| e.into_inner())
      .push(message.clone());

    tracing::info!(
      to = %message.to.join(","),
      subject = %message.subject,
      "[MOCK] Email would be sent"
    );

    Ok(ProviderResponse { status: 202 })
  }
}
