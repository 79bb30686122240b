use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;

use super::entities::{BillableService, Client, Invoice, InvoiceLine, NewInvoice};
use super::errors::{EmailError, InvoiceError};
use super::payload::InvoicePayload;
use super::value_objects::Currency;

#[async_trait]
pub trait InvoiceRepository: Send + Sync {
  /// Allocates the invoice number and writes the header with all of its
  /// lines atomically. Nothing is visible when this returns an error.
  async fn create(&self, invoice: NewInvoice) -> Result<(Invoice, Vec<InvoiceLine>), InvoiceError>;
  async fn find_by_id(&self, id: i64) -> Result<Option<Invoice>, InvoiceError>;
  /// Lines in insertion order.
  async fn find_lines(&self, invoice_id: i64) -> Result<Vec<InvoiceLine>, InvoiceError>;
}

#[async_trait]
pub trait ClientRepository: Send + Sync {
  async fn find_by_id(&self, id: i64) -> Result<Option<Client>, InvoiceError>;
}

#[async_trait]
pub trait ServiceRepository: Send + Sync {
  /// Services whose id is in `ids` AND that belong to `client_id`. Ids owned
  /// by another client are silently left out.
  async fn find_for_client(
    &self,
    client_id: i64,
    ids: &[i64],
  ) -> Result<Vec<BillableService>, InvoiceError>;
}

pub trait PdfRenderer: Send + Sync {
  /// Complete document in memory.
  fn render(&self, payload: &InvoicePayload) -> Result<Vec<u8>, InvoiceError>;
}

/// Figures shown in the e-mail totals table. `None` rows are omitted.
#[derive(Debug, Clone, Default)]
pub struct InvoiceEmailMeta {
  pub invoice_id: Option<i64>,
  pub invoice_no: Option<String>,
  pub currency: Currency,
  pub subtotal: Option<Decimal>,
  pub discount: Option<Decimal>,
  pub tax_amount: Option<Decimal>,
  pub total: Option<Decimal>,
}

#[derive(Debug, Clone)]
pub struct InvoiceEmail {
  pub to: Option<String>,
  pub cc: Option<String>,
  pub subject: Option<String>,
  pub message: Option<String>,
  pub pdf: Vec<u8>,
  pub meta: InvoiceEmailMeta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailReceipt {
  pub ok: bool,
  pub engine: String,
  pub status: u16,
}

#[async_trait]
pub trait InvoiceMailer: Send + Sync {
  async fn send(&self, email: InvoiceEmail) -> Result<EmailReceipt, EmailError>;
}
