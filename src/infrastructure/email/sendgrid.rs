use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use super::{EmailMessage, EmailProvider, ProviderResponse};
use crate::domain::invoice::errors::EmailError;
use crate::infrastructure::config::EmailConfig;

#[derive(Debug, Serialize)]
struct Address<'a> {
  email: &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct Personalization<'a> {
  to: Vec<Address<'a>>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  cc: Vec<Address<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
  #[serde(rename = "type")]
  mime_type: &'a str,
  value: &'a str,
}

#[derive(Debug, Serialize)]
struct SendGridAttachment<'a> {
  content: &'a str,
  filename: &'a str,
  #[serde(rename = "type")]
  mime_type: &'a str,
  disposition: &'a str,
}

/// Body of `POST /v3/mail/send`.
#[derive(Debug, Serialize)]
struct SendRequest<'a> {
  personalizations: Vec<Personalization<'a>>,
  from: Address<'a>,
  #[serde(skip_serializing_if = "Option::is_none")]
  reply_to: Option<Address<'a>>,
  subject: &'a str,
  content: Vec<Content<'a>>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  attachments: Vec<SendGridAttachment<'a>>,
}

impl<'a> SendRequest<'a> {
  fn from_message(message: &'a EmailMessage) -> Self {
    let address = |email: &'a String| Address {
      email: email.as_str(),
      name: None,
    };

    Self {
      personalizations: vec![Personalization {
        to: message.to.iter().map(address).collect(),
        cc: message.cc.iter().map(address).collect(),
      }],
      from: Address {
        email: &message.from.email,
        name: message.from.name.as_deref(),
      },
      reply_to: message.reply_to.as_ref().map(address),
      subject: &message.subject,
      // SendGrid requires text/plain before text/html
      content: vec![
        Content {
          mime_type: "text/plain",
          value: &message.text_body,
        },
        Content {
          mime_type: "text/html",
          value: &message.html_body,
        },
      ],
      attachments: message
        .attachments
        .iter()
        .map(|a| SendGridAttachment {
          content: &a.content,
          filename: &a.filename,
          mime_type: &a.mime_type,
          disposition: &a.disposition,
        })
        .collect(),
    }
  }
}

/// Transactional e-mail over the SendGrid v3 HTTP API.
pub struct SendGridProvider {
  client: reqwest::Client,
  api_key: Option<String>,
  base_url: String,
}

impl SendGridProvider {
  pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_seconds))
      .build()
      .map_err(|e| EmailError::Delivery {
        status: None,
        message: format!("Failed to build HTTP client: {}", e),
      })?;

    Ok(Self {
      client,
      api_key: config.api_key().map(str::to_string),
      base_url: config.api_base_url.trim_end_matches('/').to_string(),
    })
  }
}

#[async_trait]
impl EmailProvider for SendGridProvider {
  fn engine(&self) -> &'static str {
    "sendgrid"
  }

  fn is_configured(&self) -> bool {
    self.api_key.is_some()
  }

  async fn send(&self, message: &EmailMessage) -> Result<ProviderResponse, EmailError> {
    let api_key = self.api_key.as_deref().ok_or(EmailError::NotConfigured)?;

    let response = self
      .client
      .post(format!("{}/v3/mail/send", self.base_url))
      .bearer_auth(api_key)
      .json(&SendRequest::from_message(message))
      .send()
      .await
      .map_err(|e| EmailError::Delivery {
        status: None,
        message: e.to_string(),
      })?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      tracing::error!(status = status.as_u16(), body = %body, "SendGrid rejected invoice e-mail");
      return Err(EmailError::Delivery {
        status: Some(status.as_u16()),
        message: format!("SendGrid responded with {}", status),
      });
    }

    tracing::info!(
      to = %message.to.join(","),
      subject = %message.subject,
      status = status.as_u16(),
      "Email sent successfully"
    );

    Ok(ProviderResponse {
      status: status.as_u16(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::infrastructure::email::{Attachment, Mailbox};

  fn message() -> EmailMessage {
    EmailMessage {
      to: vec!["a@example.com".to_string(), "b@example.com".to_string()],
      cc: vec![],
      from: Mailbox {
        email: "billing@example.com".to_string(),
        name: Some("Acme Billing".to_string()),
      },
      reply_to: Some("support@example.com".to_string()),
      subject: "Invoice #1 from Acme".to_string(),
      text_body: "text".to_string(),
      html_body: "<p>html</p>".to_string(),
      attachments: vec![Attachment {
        content: "JVBERi0=".to_string(),
        filename: "Invoice-1.pdf".to_string(),
        mime_type: "application/pdf".to_string(),
        disposition: "attachment".to_string(),
      }],
    }
  }

  #[test]
  fn test_request_body_shape() {
    let message = message();
    let body = serde_json::to_value(SendRequest::from_message(&message)).unwrap();

    assert_eq!(body["personalizations"][0]["to"][1]["email"], "b@example.com");
    assert!(body["personalizations"][0].get("cc").is_none());
    assert_eq!(body["from"]["name"], "Acme Billing");
    assert_eq!(body["reply_to"]["email"], "support@example.com");
    assert_eq!(body["content"][0]["type"], "text/plain");
    assert_eq!(body["content"][1]["type"], "text/html");
    assert_eq!(body["attachments"][0]["type"], "application/pdf");
    assert_eq!(body["attachments"][0]["disposition"], "attachment");
  }

  #[tokio::test]
  async fn test_missing_key_fails_without_network() {
    let provider = SendGridProvider::new(&EmailConfig {
      // unroutable, would hang if contacted
      api_base_url: "http://10.255.255.1".to_string(),
      ..EmailConfig::default()
    })
    .unwrap();

    assert!(!provider.is_configured());
    let err = provider.send(&message()).await.unwrap_err();
    assert!(matches!(err, EmailError::NotConfigured));
  }
}
