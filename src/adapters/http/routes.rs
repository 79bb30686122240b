use actix_web::{error, web};
use std::sync::Arc;

use crate::application::invoice::{
  CreateInvoiceUseCase, DraftInvoiceUseCase, EmailInvoiceUseCase, GetInvoiceUseCase,
  RenderInvoicePdfUseCase,
};
use crate::domain::invoice::InvoiceService;

use super::errors::ApiError;
use super::handlers::invoices::{
  create_invoice_handler, draft_invoice_handler, email_invoice_handler, get_invoice_handler,
  health_handler, invoice_pdf_handler,
};
use super::handlers::metrics::metrics_handler;

/// Use cases behind the invoice routes, built from one shared service.
#[derive(Clone)]
pub struct InvoiceRouteDependencies {
  pub draft_use_case: Arc<DraftInvoiceUseCase>,
  pub create_use_case: Arc<CreateInvoiceUseCase>,
  pub get_use_case: Arc<GetInvoiceUseCase>,
  pub pdf_use_case: Arc<RenderInvoicePdfUseCase>,
  pub email_use_case: Arc<EmailInvoiceUseCase>,
}

impl InvoiceRouteDependencies {
  pub fn new(invoice_service: Arc<InvoiceService>) -> Self {
    Self {
      draft_use_case: Arc::new(DraftInvoiceUseCase::new(invoice_service.clone())),
      create_use_case: Arc::new(CreateInvoiceUseCase::new(invoice_service.clone())),
      get_use_case: Arc::new(GetInvoiceUseCase::new(invoice_service.clone())),
      pdf_use_case: Arc::new(RenderInvoicePdfUseCase::new(invoice_service.clone())),
      email_use_case: Arc::new(EmailInvoiceUseCase::new(invoice_service)),
    }
  }
}

/// Configure invoice routes
///
/// Mount under `/api/invoices`.
///
/// # Routes
///
/// - GET /health - Liveness probe
/// - POST /draft - Totals preview, nothing persisted
/// - POST /create - Persist invoice and lines in one transaction
/// - GET /{id} - Invoice header with its lines
/// - GET /{id}/pdf - PDF bytes (`?download=1` for attachment, `?debug=1` for the payload)
/// - POST /{id}/email - Send the PDF by e-mail
///
/// # Example
///
/// ```no_run
/// use actix_web::{App, web};
/// # use crm_invoicing::adapters::http::routes::{InvoiceRouteDependencies, configure_invoice_routes};
///
/// # fn example(deps: InvoiceRouteDependencies) {
/// let app = App::new().service(
///   web::scope("/api/invoices").configure(|cfg| configure_invoice_routes(cfg, deps)),
/// );
/// # }
/// ```
pub fn configure_invoice_routes(cfg: &mut web::ServiceConfig, deps: InvoiceRouteDependencies) {
  cfg
    .app_data(json_config())
    .app_data(web::Data::new(deps.draft_use_case))
    .app_data(web::Data::new(deps.create_use_case))
    .app_data(web::Data::new(deps.get_use_case))
    .app_data(web::Data::new(deps.pdf_use_case))
    .app_data(web::Data::new(deps.email_use_case))
    // /health must be registered before /{id}
    .route("/health", web::get().to(health_handler))
    .route("/draft", web::post().to(draft_invoice_handler))
    .route("/create", web::post().to(create_invoice_handler))
    .route("/{id}", web::get().to(get_invoice_handler))
    .route("/{id}/pdf", web::get().to(invoice_pdf_handler))
    .route("/{id}/email", web::post().to(email_invoice_handler));
}

/// Configure the Prometheus scrape endpoint
pub fn configure_metrics_routes(cfg: &mut web::ServiceConfig) {
  cfg.route("/metrics", web::get().to(metrics_handler));
}

/// Malformed JSON bodies come back in the API error shape.
fn json_config() -> web::JsonConfig {
  web::JsonConfig::default().error_handler(|err, _req| {
    let message = match &err {
      error::JsonPayloadError::ContentType => "Expected a JSON body".to_string(),
      other => format!("Invalid JSON body: {}", other),
    };
    ApiError::Validation(message).into()
  })
}
