use serde::Serialize;
use std::sync::Arc;

use crate::domain::invoice::{Invoice, InvoiceError, InvoiceLine, InvoiceService};

#[derive(Debug)]
pub struct GetInvoiceCommand {
  pub invoice_id: i64,
}

/// Header fields at the top level plus the ordered `lines`.
#[derive(Debug, Serialize)]
pub struct GetInvoiceResponse {
  #[serde(flatten)]
  pub invoice: Invoice,
  pub lines: Vec<InvoiceLine>,
}

pub struct GetInvoiceUseCase {
  invoice_service: Arc<InvoiceService>,
}

impl GetInvoiceUseCase {
  pub fn new(invoice_service: Arc<InvoiceService>) -> Self {
    Self { invoice_service }
  }

  pub async fn execute(&self, command: GetInvoiceCommand) -> Result<GetInvoiceResponse, InvoiceError> {
    let (invoice, lines) = self.invoice_service.get_by_id(command.invoice_id).await?;
    Ok(GetInvoiceResponse { invoice, lines })
  }
}
