use actix_web::{
  HttpResponse,
  http::header::{ContentDisposition, DispositionParam, DispositionType},
  web,
};
use std::sync::Arc;
use validator::Validate;

use crate::{
  adapters::http::{
    dtos::{
      EmailInvoiceRequest, HealthResponse, InvoiceRequest, PayloadResponse, PdfQuery,
    },
    errors::ApiError,
  },
  application::invoice::*,
};

pub const INVOICE_ENGINE_HEADER: &str = "X-Invoice-Engine";

/// Path ids must be positive integers.
fn parse_invoice_id(raw: &str) -> Result<i64, ApiError> {
  raw
    .trim()
    .parse::<i64>()
    .ok()
    .filter(|id| *id > 0)
    .ok_or_else(|| ApiError::Validation("Invalid ID".to_string()))
}

/// Liveness probe
/// GET /api/invoices/health
pub async fn health_handler() -> HttpResponse {
  HttpResponse::Ok().json(HealthResponse { ok: true })
}

/// Compute totals without persisting
/// POST /api/invoices/draft
pub async fn draft_invoice_handler(
  request: web::Json<InvoiceRequest>,
  use_case: web::Data<Arc<DraftInvoiceUseCase>>,
) -> Result<HttpResponse, ApiError> {
  let response = use_case.execute(request.into_inner().into()).await?;
  Ok(HttpResponse::Ok().json(response))
}

/// Persist a new invoice with its lines
/// POST /api/invoices/create
pub async fn create_invoice_handler(
  request: web::Json<InvoiceRequest>,
  use_case: web::Data<Arc<CreateInvoiceUseCase>>,
) -> Result<HttpResponse, ApiError> {
  let response = use_case.execute(request.into_inner().into()).await?;
  Ok(HttpResponse::Ok().json(response))
}

/// Invoice header plus lines
/// GET /api/invoices/{id}
pub async fn get_invoice_handler(
  path: web::Path<String>,
  use_case: web::Data<Arc<GetInvoiceUseCase>>,
) -> Result<HttpResponse, ApiError> {
  let invoice_id = parse_invoice_id(&path)?;
  let response = use_case.execute(GetInvoiceCommand { invoice_id }).await?;
  Ok(HttpResponse::Ok().json(response))
}

/// Invoice PDF, or the payload behind it with `?debug=1`
/// GET /api/invoices/{id}/pdf
pub async fn invoice_pdf_handler(
  path: web::Path<String>,
  query: web::Query<PdfQuery>,
  use_case: web::Data<Arc<RenderInvoicePdfUseCase>>,
) -> Result<HttpResponse, ApiError> {
  let invoice_id = parse_invoice_id(&path)?;

  if query.debug() {
    let payload = use_case.payload(RenderInvoicePdfCommand { invoice_id }).await?;
    return Ok(HttpResponse::Ok().json(PayloadResponse { payload }));
  }

  let rendered = use_case.execute(RenderInvoicePdfCommand { invoice_id }).await?;
  let disposition = ContentDisposition {
    disposition: if query.download() {
      DispositionType::Attachment
    } else {
      DispositionType::Inline
    },
    parameters: vec![DispositionParam::Filename(format!(
      "Invoice-{}.pdf",
      rendered.invoice_no
    ))],
  };

  Ok(
    HttpResponse::Ok()
      .content_type("application/pdf")
      .insert_header(disposition)
      .insert_header((INVOICE_ENGINE_HEADER, "internal"))
      .body(rendered.bytes),
  )
}

/// E-mail the invoice PDF
/// POST /api/invoices/{id}/email
pub async fn email_invoice_handler(
  path: web::Path<String>,
  request: web::Json<EmailInvoiceRequest>,
  use_case: web::Data<Arc<EmailInvoiceUseCase>>,
) -> Result<HttpResponse, ApiError> {
  let invoice_id = parse_invoice_id(&path)?;
  request.validate()?;

  let response = use_case
    .execute(request.into_inner().into_command(invoice_id))
    .await?;
  Ok(HttpResponse::Ok().json(response))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_invoice_id() {
    assert_eq!(parse_invoice_id("42").unwrap(), 42);
    assert!(parse_invoice_id("0").is_err());
    assert!(parse_invoice_id("-3").is_err());
    assert!(parse_invoice_id("abc").is_err());
    assert!(parse_invoice_id("1.5").is_err());
  }
}
