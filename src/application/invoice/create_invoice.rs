use serde::Serialize;
use std::sync::Arc;

use super::invoice_command::InvoiceCommand;
use crate::domain::invoice::{InvoiceError, InvoiceService};
use crate::infrastructure::metrics::INVOICES_CREATED_TOTAL;

#[derive(Debug, Serialize)]
pub struct CreateInvoiceResponse {
  pub id: i64,
  pub invoice_no: String,
}

pub struct CreateInvoiceUseCase {
  invoice_service: Arc<InvoiceService>,
}

impl CreateInvoiceUseCase {
  pub fn new(invoice_service: Arc<InvoiceService>) -> Self {
    Self { invoice_service }
  }

  pub async fn execute(&self, command: InvoiceCommand) -> Result<CreateInvoiceResponse, InvoiceError> {
    let input = command.into_input()?;
    let invoice = self.invoice_service.create(&input).await?;

    INVOICES_CREATED_TOTAL
      .with_label_values(&[invoice.currency.as_str()])
      .inc();

    Ok(CreateInvoiceResponse {
      id: invoice.id,
      invoice_no: invoice.invoice_no.into_inner(),
    })
  }
}
