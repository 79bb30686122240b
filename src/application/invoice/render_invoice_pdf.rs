use std::sync::Arc;
use std::time::Instant;

use crate::domain::invoice::{InvoiceError, InvoicePayload, InvoiceService, RenderedInvoice};
use crate::infrastructure::metrics::{self, INVOICE_PDF_RENDER_SECONDS, INVOICE_PDFS_TOTAL};

#[derive(Debug)]
pub struct RenderInvoicePdfCommand {
  pub invoice_id: i64,
}

pub struct RenderInvoicePdfUseCase {
  invoice_service: Arc<InvoiceService>,
}

impl RenderInvoicePdfUseCase {
  pub fn new(invoice_service: Arc<InvoiceService>) -> Self {
    Self { invoice_service }
  }

  pub async fn execute(&self, command: RenderInvoicePdfCommand) -> Result<RenderedInvoice, InvoiceError> {
    let started = Instant::now();
    let result = self.invoice_service.render_pdf(command.invoice_id).await;

    INVOICE_PDFS_TOTAL
      .with_label_values(&[metrics::outcome(&result)])
      .inc();
    if result.is_ok() {
      INVOICE_PDF_RENDER_SECONDS
        .with_label_values(&["pdf"])
        .observe(started.elapsed().as_secs_f64());
    }
    result
  }

  /// The document the renderer would draw, for `?debug=1`.
  pub async fn payload(&self, command: RenderInvoicePdfCommand) -> Result<InvoicePayload, InvoiceError> {
    let (_invoice, payload) = self.invoice_service.build_payload(command.invoice_id).await?;
    Ok(payload)
  }
}
