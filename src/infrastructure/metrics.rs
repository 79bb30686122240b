//! Prometheus metrics for the invoice pipeline, served at `/metrics`.

use lazy_static::lazy_static;
use prometheus::{
  Encoder, HistogramVec, IntCounterVec, TextEncoder, register_histogram_vec,
  register_int_counter_vec,
};

pub const OUTCOME_OK: &str = "ok";
pub const OUTCOME_ERROR: &str = "error";

lazy_static! {
  /// Draft previews by outcome.
  pub static ref INVOICE_DRAFTS_TOTAL: IntCounterVec = register_int_counter_vec!(
    "crm_invoice_drafts_total",
    "Total number of invoice drafts computed",
    &["outcome"]
  )
  .expect("Failed to register crm_invoice_drafts_total");

  /// Persisted invoices by currency.
  pub static ref INVOICES_CREATED_TOTAL: IntCounterVec = register_int_counter_vec!(
    "crm_invoices_created_total",
    "Total number of invoices created",
    &["currency"]
  )
  .expect("Failed to register crm_invoices_created_total");

  /// Rendered PDFs by outcome.
  pub static ref INVOICE_PDFS_TOTAL: IntCounterVec = register_int_counter_vec!(
    "crm_invoice_pdfs_total",
    "Total number of invoice PDFs rendered",
    &["outcome"]
  )
  .expect("Failed to register crm_invoice_pdfs_total");

  pub static ref INVOICE_PDF_RENDER_SECONDS: HistogramVec = register_histogram_vec!(
    "crm_invoice_pdf_render_seconds",
    "Invoice PDF render duration in seconds",
    &["route"],
    vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]
  )
  .expect("Failed to register crm_invoice_pdf_render_seconds");

  /// Invoice e-mails by outcome (`sent`, `rejected`, `failed`).
  pub static ref INVOICE_EMAILS_TOTAL: IntCounterVec = register_int_counter_vec!(
    "crm_invoice_emails_total",
    "Total number of invoice e-mails by outcome",
    &["outcome"]
  )
  .expect("Failed to register crm_invoice_emails_total");
}

/// Registers every collector so they show up before first use.
pub fn init_metrics() {
  lazy_static::initialize(&INVOICE_DRAFTS_TOTAL);
  lazy_static::initialize(&INVOICES_CREATED_TOTAL);
  lazy_static::initialize(&INVOICE_PDFS_TOTAL);
  lazy_static::initialize(&INVOICE_PDF_RENDER_SECONDS);
  lazy_static::initialize(&INVOICE_EMAILS_TOTAL);
}

/// Text exposition of the default registry.
pub fn gather_metrics() -> Result<String, prometheus::Error> {
  let encoder = TextEncoder::new();
  let mut buffer = Vec::new();
  encoder.encode(&prometheus::gather(), &mut buffer)?;
  String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

pub fn outcome<T, E>(result: &Result<T, E>) -> &'static str {
  if result.is_ok() { OUTCOME_OK } else { OUTCOME_ERROR }
}
