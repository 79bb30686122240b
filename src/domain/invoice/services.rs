use rust_decimal::Decimal;
use std::sync::Arc;

use super::branding::BrandConfig;
use super::entities::{Invoice, InvoiceLine, LineInput, NewInvoice};
use super::errors::{EmailError, InvoiceError};
use super::payload::{self, DraftSummary, InvoicePayload};
use super::ports::{
  ClientRepository, EmailReceipt, InvoiceEmail, InvoiceEmailMeta, InvoiceMailer,
  InvoiceRepository, PdfRenderer, ServiceRepository,
};
use super::money;
use super::value_objects::Currency;

pub const DEFAULT_EMAIL_MESSAGE: &str = "Please find your invoice attached.";

/// Where the lines of an invoice come from, decided once at the HTTP edge.
#[derive(Debug, Clone, PartialEq)]
pub enum InvoiceSource {
  ByRawLines(Vec<LineInput>),
  ByServiceIds { client_id: i64, ids: Vec<i64> },
}

/// Validated draft/create request with amounts at their stored scale.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceInput {
  pub source: InvoiceSource,
  /// Stored on the header; with service ids this is the owning client.
  pub client_id: Option<i64>,
  pub currency: Currency,
  pub discount: Decimal,
  pub tax_percent: Decimal,
}

impl InvoiceInput {
  pub fn new(
    source: InvoiceSource,
    client_id: Option<i64>,
    currency: Currency,
    discount: Decimal,
    tax_percent: Decimal,
  ) -> Result<Self, InvoiceError> {
    if discount < Decimal::ZERO {
      return Err(InvoiceError::BadRequest("discount must not be negative".to_string()));
    }
    if tax_percent < Decimal::ZERO {
      return Err(InvoiceError::BadRequest("tax must not be negative".to_string()));
    }
    let discount = money::checked_amount(discount)?;
    let tax_percent = money::checked_tax_percent(tax_percent)?;
    if let InvoiceSource::ByRawLines(lines) = &source {
      validate_lines(lines)?;
    }

    let client_id = match &source {
      InvoiceSource::ByServiceIds { client_id, .. } => Some(*client_id),
      InvoiceSource::ByRawLines(_) => client_id,
    };

    Ok(Self {
      source,
      client_id,
      currency,
      discount,
      tax_percent,
    })
  }
}

fn validate_lines(lines: &[LineInput]) -> Result<(), InvoiceError> {
  for line in lines {
    if line.quantity < Decimal::ZERO {
      return Err(InvoiceError::BadRequest(format!(
        "quantity must not be negative: {}",
        line.description
      )));
    }
    if line.unit_price < Decimal::ZERO {
      return Err(InvoiceError::BadRequest(format!(
        "unit_price must not be negative: {}",
        line.description
      )));
    }
    money::checked_quantity(line.quantity)?;
    money::checked_amount(line.unit_price)?;
  }
  Ok(())
}

/// E-mail request for a stored invoice.
#[derive(Debug, Clone, Default)]
pub struct EmailRequest {
  pub to: Option<String>,
  pub cc: Option<String>,
  pub subject: Option<String>,
  pub message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RenderedInvoice {
  pub invoice_id: i64,
  pub invoice_no: String,
  pub bytes: Vec<u8>,
}

pub struct InvoiceServiceDependencies {
  pub invoice_repo: Arc<dyn InvoiceRepository>,
  pub client_repo: Arc<dyn ClientRepository>,
  pub service_repo: Arc<dyn ServiceRepository>,
  pub renderer: Arc<dyn PdfRenderer>,
  pub mailer: Arc<dyn InvoiceMailer>,
  pub brand: BrandConfig,
}

pub struct InvoiceService {
  invoice_repo: Arc<dyn InvoiceRepository>,
  client_repo: Arc<dyn ClientRepository>,
  service_repo: Arc<dyn ServiceRepository>,
  renderer: Arc<dyn PdfRenderer>,
  mailer: Arc<dyn InvoiceMailer>,
  brand: BrandConfig,
}

impl InvoiceService {
  pub fn new(deps: InvoiceServiceDependencies) -> Self {
    Self {
      invoice_repo: deps.invoice_repo,
      client_repo: deps.client_repo,
      service_repo: deps.service_repo,
      renderer: deps.renderer,
      mailer: deps.mailer,
      brand: deps.brand,
    }
  }

  pub fn brand(&self) -> &BrandConfig {
    &self.brand
  }

  /// Normalized billable lines for `source`.
  ///
  /// Fails with `ServicesNotFound` when no service row matches the ids for
  /// that client and with `NoBillableServices` when rows exist but none of
  /// them has a billable status.
  pub async fn resolve_lines(&self, source: &InvoiceSource) -> Result<Vec<LineInput>, InvoiceError> {
    match source {
      InvoiceSource::ByRawLines(lines) => {
        validate_lines(lines)?;
        Ok(lines.clone())
      }
      InvoiceSource::ByServiceIds { client_id, ids } => {
        if ids.is_empty() {
          return Err(InvoiceError::MissingSource);
        }
        let services = self.service_repo.find_for_client(*client_id, ids).await?;
        if services.is_empty() {
          return Err(InvoiceError::ServicesNotFound);
        }

        let lines: Vec<LineInput> = services
          .iter()
          .filter(|s| s.is_billable())
          .map(|s| s.to_line())
          .collect();
        if lines.is_empty() {
          return Err(InvoiceError::NoBillableServices);
        }
        validate_lines(&lines)?;
        Ok(lines)
      }
    }
  }

  pub async fn draft(&self, input: &InvoiceInput) -> Result<DraftSummary, InvoiceError> {
    let lines = match self.resolve_lines(&input.source).await {
      Ok(lines) => lines,
      Err(InvoiceError::ServicesNotFound) => return Err(InvoiceError::NoBillableServices),
      Err(e) => return Err(e),
    };
    if lines.is_empty() {
      return Err(InvoiceError::NoBillableServices);
    }

    let summary = payload::draft_summary(
      input.currency.clone(),
      &lines,
      input.discount,
      input.tax_percent,
    );
    summary.totals().ensure_storable()?;
    Ok(summary)
  }

  pub async fn create(&self, input: &InvoiceInput) -> Result<Invoice, InvoiceError> {
    let lines = self.resolve_lines(&input.source).await?;
    if lines.is_empty() {
      return Err(InvoiceError::NoBillableServices);
    }

    let new_invoice = NewInvoice::new(
      input.client_id,
      input.currency.clone(),
      lines,
      input.discount,
      input.tax_percent,
    );
    new_invoice.totals.ensure_storable()?;
    let (invoice, lines) = self.invoice_repo.create(new_invoice).await?;

    tracing::info!(
      invoice_id = invoice.id,
      invoice_no = %invoice.invoice_no,
      lines = lines.len(),
      total = %invoice.total,
      "Invoice created"
    );
    Ok(invoice)
  }

  pub async fn get_by_id(&self, id: i64) -> Result<(Invoice, Vec<InvoiceLine>), InvoiceError> {
    let invoice = self
      .invoice_repo
      .find_by_id(id)
      .await?
      .ok_or(InvoiceError::InvoiceNotFound(id))?;
    let lines = self.invoice_repo.find_lines(id).await?;
    Ok((invoice, lines))
  }

  pub async fn build_payload(&self, id: i64) -> Result<(Invoice, InvoicePayload), InvoiceError> {
    let (invoice, lines) = self.get_by_id(id).await?;
    let client = match invoice.client_id {
      Some(client_id) => self.client_repo.find_by_id(client_id).await?,
      None => None,
    };
    let payload = InvoicePayload::from_invoice(&invoice, &lines, client.as_ref(), &self.brand);
    Ok((invoice, payload))
  }

  pub async fn render_pdf(&self, id: i64) -> Result<RenderedInvoice, InvoiceError> {
    let (invoice, payload) = self.build_payload(id).await?;
    let bytes = self.renderer.render(&payload)?;

    tracing::debug!(invoice_id = id, bytes = bytes.len(), "Invoice PDF rendered");
    Ok(RenderedInvoice {
      invoice_id: invoice.id,
      invoice_no: payload.number,
      bytes,
    })
  }

  pub async fn email_invoice(
    &self,
    id: i64,
    request: EmailRequest,
  ) -> Result<EmailReceipt, InvoiceError> {
    let to = request
      .to
      .map(|to| to.trim().to_string())
      .filter(|to| !to.is_empty())
      .ok_or(EmailError::MissingRecipient)?;

    let (invoice, payload) = self.build_payload(id).await?;
    let pdf = self.renderer.render(&payload)?;
    let totals = payload.totals();

    let email = InvoiceEmail {
      to: Some(to),
      cc: request.cc.filter(|cc| !cc.trim().is_empty()),
      subject: request.subject.filter(|s| !s.trim().is_empty()),
      message: Some(
        request
          .message
          .filter(|m| !m.trim().is_empty())
          .unwrap_or_else(|| DEFAULT_EMAIL_MESSAGE.to_string()),
      ),
      pdf,
      meta: InvoiceEmailMeta {
        invoice_id: Some(invoice.id),
        invoice_no: Some(payload.number.clone()),
        currency: payload.currency.clone(),
        subtotal: Some(totals.subtotal),
        discount: Some(totals.discount),
        tax_amount: Some(totals.tax_amount),
        total: Some(totals.total),
      },
    };

    let receipt = self.mailer.send(email).await?;
    tracing::info!(
      invoice_id = invoice.id,
      engine = %receipt.engine,
      status = receipt.status,
      "Invoice e-mail sent"
    );
    Ok(receipt)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::invoice::entities::{BillableService, Client};
  use crate::domain::invoice::value_objects::ValueObjectError;
  use crate::infrastructure::email::{BrandedInvoiceMailer, MockEmailProvider};
  use crate::infrastructure::pdf::PrintPdfRenderer;
  use crate::infrastructure::persistence::memory::InMemoryStore;
  use rust_decimal_macros::dec;

  struct Fixture {
    store: Arc<InMemoryStore>,
    provider: Arc<MockEmailProvider>,
    service: InvoiceService,
  }

  fn fixture() -> Fixture {
    let store = Arc::new(InMemoryStore::new());
    store.add_client(Client {
      id: 1,
      name: Some("Ada Lovelace".to_string()),
      email: Some("ada@example.com".to_string()),
      phone: None,
    });
    store.add_service(service(10, 1, "Diagnostics", dec!(1), dec!(50), Some("done")));
    store.add_service(service(11, 1, "Labor hour", dec!(3), dec!(10), Some("Pending")));
    store.add_service(service(12, 1, "Cancelled visit", dec!(1), dec!(99), Some("cancelled")));
    store.add_service(service(20, 2, "Other client", dec!(1), dec!(500), None));

    let brand = BrandConfig::default();
    let provider = Arc::new(MockEmailProvider::new());
    let mailer = Arc::new(BrandedInvoiceMailer::new(provider.clone(), brand.clone(), None).unwrap());
    let service = InvoiceService::new(InvoiceServiceDependencies {
      invoice_repo: store.clone(),
      client_repo: store.clone(),
      service_repo: store.clone(),
      renderer: Arc::new(PrintPdfRenderer::new(brand.clone())),
      mailer,
      brand,
    });

    Fixture {
      store,
      provider,
      service,
    }
  }

  fn service(
    id: i64,
    client_id: i64,
    description: &str,
    quantity: Decimal,
    unit_price: Decimal,
    status: Option<&str>,
  ) -> BillableService {
    BillableService {
      id,
      client_id,
      description: Some(description.to_string()),
      quantity: Some(quantity),
      unit_price: Some(unit_price),
      status: status.map(str::to_string),
    }
  }

  fn by_services(client_id: i64, ids: Vec<i64>, tax: Decimal) -> InvoiceInput {
    InvoiceInput::new(
      InvoiceSource::ByServiceIds { client_id, ids },
      None,
      Currency::usd(),
      dec!(0),
      tax,
    )
    .unwrap()
  }

  #[tokio::test]
  async fn test_draft_from_services_skips_non_billable() {
    let f = fixture();
    let summary = f.service.draft(&by_services(1, vec![10, 11, 12], dec!(10))).await.unwrap();
    assert_eq!(summary.items_count, 2);
    assert_eq!(summary.subtotal.to_string(), "80.00");
    assert_eq!(summary.tax_amount.to_string(), "8.00");
    assert_eq!(summary.total.to_string(), "88.00");
  }

  #[tokio::test]
  async fn test_foreign_service_ids_are_excluded() {
    let f = fixture();
    let summary = f.service.draft(&by_services(1, vec![10, 20], dec!(0))).await.unwrap();
    assert_eq!(summary.items_count, 1);
    assert_eq!(summary.subtotal.to_string(), "50.00");

    let err = f.service.create(&by_services(1, vec![20], dec!(0))).await.unwrap_err();
    assert!(matches!(err, InvoiceError::ServicesNotFound));

    let err = f.service.draft(&by_services(1, vec![20], dec!(0))).await.unwrap_err();
    assert!(matches!(err, InvoiceError::NoBillableServices));
  }

  #[tokio::test]
  async fn test_only_non_billable_services() {
    let f = fixture();
    let err = f.service.create(&by_services(1, vec![12], dec!(0))).await.unwrap_err();
    assert!(matches!(err, InvoiceError::NoBillableServices));
    assert_eq!(f.store.invoice_count(), 0);
  }

  #[tokio::test]
  async fn test_create_and_build_payload() {
    let f = fixture();
    let invoice = f.service.create(&by_services(1, vec![10, 11], dec!(10))).await.unwrap();
    assert_eq!(invoice.client_id, Some(1));
    assert_eq!(invoice.total.to_string(), "88.00");
    assert_eq!(invoice.status, "created");

    let (_, payload) = f.service.build_payload(invoice.id).await.unwrap();
    assert_eq!(payload.to, "Ada Lovelace\nada@example.com");
    assert_eq!(payload.items.len(), 2);
    assert_eq!(payload.totals().subtotal, invoice.subtotal);
    assert_eq!(payload.totals().total, invoice.total);
  }

  #[tokio::test]
  async fn test_missing_invoice() {
    let f = fixture();
    let err = f.service.get_by_id(404).await.unwrap_err();
    assert!(matches!(err, InvoiceError::InvoiceNotFound(404)));
    let err = f.service.render_pdf(404).await.unwrap_err();
    assert!(matches!(err, InvoiceError::InvoiceNotFound(404)));
  }

  #[tokio::test]
  async fn test_failed_line_insert_leaves_nothing_behind() {
    let f = fixture();
    f.store.fail_line_inserts(true);
    let err = f.service.create(&by_services(1, vec![10, 11], dec!(10))).await.unwrap_err();
    assert!(matches!(err, InvoiceError::Repository(_)));
    assert_eq!(f.store.invoice_count(), 0);
    assert_eq!(f.store.line_count(), 0);
  }

  #[tokio::test]
  async fn test_raw_lines_take_client_id_from_request() {
    let f = fixture();
    let input = InvoiceInput::new(
      InvoiceSource::ByRawLines(vec![LineInput::new(None, "Setup", None, Some(dec!(25)))]),
      Some(1),
      Currency::usd(),
      dec!(0),
      dec!(0),
    )
    .unwrap();
    let invoice = f.service.create(&input).await.unwrap();
    assert_eq!(invoice.client_id, Some(1));
    assert_eq!(invoice.subtotal.to_string(), "25.00");
  }

  #[test]
  fn test_negative_inputs_rejected() {
    let source = InvoiceSource::ByRawLines(vec![LineInput::new(None, "x", Some(dec!(-1)), None)]);
    let err = InvoiceInput::new(source, None, Currency::usd(), dec!(0), dec!(0)).unwrap_err();
    assert!(matches!(err, InvoiceError::BadRequest(_)));

    let source = InvoiceSource::ByRawLines(vec![LineInput::new(None, "x", None, None)]);
    let err = InvoiceInput::new(source.clone(), None, Currency::usd(), dec!(-5), dec!(0)).unwrap_err();
    assert!(matches!(err, InvoiceError::BadRequest(_)));
    let err = InvoiceInput::new(source, None, Currency::usd(), dec!(0), dec!(-1)).unwrap_err();
    assert!(matches!(err, InvoiceError::BadRequest(_)));
  }

  #[test]
  fn test_out_of_range_inputs_rejected() {
    let huge_quantity = InvoiceSource::ByRawLines(vec![LineInput::new(
      None,
      "x",
      Some(Decimal::MAX),
      Some(dec!(2)),
    )]);
    let err = InvoiceInput::new(huge_quantity, None, Currency::usd(), dec!(0), dec!(0)).unwrap_err();
    assert!(matches!(
      err,
      InvoiceError::Validation(ValueObjectError::InvalidQuantity(_))
    ));

    let source = InvoiceSource::ByRawLines(vec![LineInput::new(None, "x", None, None)]);
    let discount = dec!(1000000000000);
    let err = InvoiceInput::new(source.clone(), None, Currency::usd(), discount, dec!(0)).unwrap_err();
    assert!(matches!(
      err,
      InvoiceError::Validation(ValueObjectError::InvalidAmount(_))
    ));
    let err = InvoiceInput::new(source, None, Currency::usd(), dec!(0), dec!(12345)).unwrap_err();
    assert!(matches!(
      err,
      InvoiceError::Validation(ValueObjectError::InvalidTaxRate(_))
    ));
  }

  #[tokio::test]
  async fn test_totals_beyond_header_columns_rejected() {
    let f = fixture();
    let lines = (0..2)
      .map(|_| LineInput::new(None, "Fleet", Some(dec!(99999999)), Some(dec!(9999999999))))
      .collect();
    let input = InvoiceInput::new(
      InvoiceSource::ByRawLines(lines),
      None,
      Currency::usd(),
      dec!(0),
      dec!(0),
    )
    .unwrap();

    let err = f.service.draft(&input).await.unwrap_err();
    assert!(matches!(err, InvoiceError::Validation(_)));
    let err = f.service.create(&input).await.unwrap_err();
    assert!(matches!(err, InvoiceError::Validation(_)));
    assert_eq!(f.store.invoice_count(), 0);
  }

  #[tokio::test]
  async fn test_draft_create_and_payload_agree_on_sub_cent_prices() {
    let f = fixture();
    let washer = LineInput::new(None, "Washer", Some(dec!(3)), Some(dec!(0.335)));
    let input = InvoiceInput::new(
      InvoiceSource::ByRawLines(vec![washer]),
      Some(1),
      Currency::usd(),
      dec!(0.004),
      dec!(8.8754),
    )
    .unwrap();
    assert_eq!(input.discount, dec!(0.00));
    assert_eq!(input.tax_percent, dec!(8.875));

    let summary = f.service.draft(&input).await.unwrap();
    let invoice = f.service.create(&input).await.unwrap();
    let (_, payload) = f.service.build_payload(invoice.id).await.unwrap();

    assert_eq!(summary.total.to_string(), "1.11");
    assert_eq!(invoice.total, summary.total);
    assert_eq!(payload.totals().total, invoice.total);
  }

  #[tokio::test]
  async fn test_email_without_recipient_never_reaches_provider() {
    let f = fixture();
    let invoice = f.service.create(&by_services(1, vec![10], dec!(0))).await.unwrap();
    let err = f
      .service
      .email_invoice(invoice.id, EmailRequest::default())
      .await
      .unwrap_err();
    assert!(matches!(err, InvoiceError::Email(EmailError::MissingRecipient)));
    assert_eq!(f.provider.send_count(), 0);
  }

  #[tokio::test]
  async fn test_email_invoice_attaches_pdf() {
    let f = fixture();
    let invoice = f.service.create(&by_services(1, vec![10, 11], dec!(10))).await.unwrap();
    let receipt = f
      .service
      .email_invoice(
        invoice.id,
        EmailRequest {
          to: Some("ada@example.com".to_string()),
          ..Default::default()
        },
      )
      .await
      .unwrap();
    assert!(receipt.ok);
    assert_eq!(receipt.engine, "mock");
    assert_eq!(f.provider.send_count(), 1);

    let sent = f.provider.sent_messages();
    assert_eq!(
      sent[0].subject,
      format!("Invoice #{} from Total Repair Now", invoice.invoice_no)
    );
    assert!(sent[0].text_body.contains(DEFAULT_EMAIL_MESSAGE));
    assert!(sent[0].html_body.contains("$88.00"));
  }
}
