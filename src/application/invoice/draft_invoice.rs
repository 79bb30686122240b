use std::sync::Arc;

use super::invoice_command::InvoiceCommand;
use crate::domain::invoice::{DraftSummary, InvoiceError, InvoiceService};
use crate::infrastructure::metrics::{self, INVOICE_DRAFTS_TOTAL};

pub type DraftInvoiceResponse = DraftSummary;

/// Totals preview; nothing is written.
pub struct DraftInvoiceUseCase {
  invoice_service: Arc<InvoiceService>,
}

impl DraftInvoiceUseCase {
  pub fn new(invoice_service: Arc<InvoiceService>) -> Self {
    Self { invoice_service }
  }

  pub async fn execute(&self, command: InvoiceCommand) -> Result<DraftInvoiceResponse, InvoiceError> {
    let result = self.draft(command).await;
    INVOICE_DRAFTS_TOTAL
      .with_label_values(&[metrics::outcome(&result)])
      .inc();
    result
  }

  async fn draft(&self, command: InvoiceCommand) -> Result<DraftInvoiceResponse, InvoiceError> {
    let input = command.into_input()?;
    self.invoice_service.draft(&input).await
  }
}
