use std::sync::Arc;

use crate::domain::invoice::{
  EmailError, EmailReceipt, EmailRequest, InvoiceError, InvoiceService,
};
use crate::infrastructure::metrics::INVOICE_EMAILS_TOTAL;

#[derive(Debug, Default)]
pub struct EmailInvoiceCommand {
  pub invoice_id: i64,
  pub to: Option<String>,
  pub cc: Option<String>,
  pub subject: Option<String>,
  pub message: Option<String>,
}

pub type EmailInvoiceResponse = EmailReceipt;

pub struct EmailInvoiceUseCase {
  invoice_service: Arc<InvoiceService>,
}

impl EmailInvoiceUseCase {
  pub fn new(invoice_service: Arc<InvoiceService>) -> Self {
    Self { invoice_service }
  }

  pub async fn execute(&self, command: EmailInvoiceCommand) -> Result<EmailInvoiceResponse, InvoiceError> {
    let request = EmailRequest {
      to: command.to,
      cc: command.cc,
      subject: command.subject,
      message: command.message,
    };
    let result = self
      .invoice_service
      .email_invoice(command.invoice_id, request)
      .await;

    INVOICE_EMAILS_TOTAL
      .with_label_values(&[email_outcome(&result)])
      .inc();
    result
  }
}

fn email_outcome(result: &Result<EmailReceipt, InvoiceError>) -> &'static str {
  match result {
    Ok(_) => "sent",
    Err(InvoiceError::Email(EmailError::MissingRecipient)) | Err(InvoiceError::InvoiceNotFound(_)) => {
      "rejected"
    }
    Err(_) => "failed",
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_email_outcome() {
    let sent = Ok(EmailReceipt {
      ok: true,
      engine: "mock".to_string(),
      status: 202,
    });
    assert_eq!(email_outcome(&sent), "sent");
    assert_eq!(
      email_outcome(&Err(InvoiceError::Email(EmailError::MissingRecipient))),
      "rejected"
    );
    assert_eq!(email_outcome(&Err(InvoiceError::InvoiceNotFound(3))), "rejected");
    assert_eq!(
      email_outcome(&Err(InvoiceError::Email(EmailError::NotConfigured))),
      "failed"
    );
  }
}
