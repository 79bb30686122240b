use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tera::{Context, Tera};

use super::{Attachment, EmailMessage, EmailProvider, Mailbox, PDF_MIME_TYPE, parse_recipients};
use crate::domain::invoice::{
  BrandConfig, Currency,
  errors::EmailError,
  money,
  ports::{EmailReceipt, InvoiceEmail, InvoiceEmailMeta, InvoiceMailer},
};
use crate::infrastructure::config::EmailConfig;

const HTML_TEMPLATE: &str = "invoice_email.html.tera";
const TEXT_TEMPLATE: &str = "invoice_email.txt.tera";
const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Serialize)]
struct TotalsRow {
  label: &'static str,
  value: String,
  emphasis: bool,
}

/// en-US grouping with two decimals: `1234.5` becomes `1,234.50`.
pub fn format_grouped(amount: Decimal) -> String {
  let rounded = money::round2(amount);
  let text = rounded.abs().to_string();
  let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

  let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
  for (index, digit) in whole.chars().enumerate() {
    if index > 0 && (whole.len() - index) % 3 == 0 {
      grouped.push(',');
    }
    grouped.push(digit);
  }

  let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
  format!("{}{}.{}", sign, grouped, fraction)
}

/// `$1,234.50 USD`; codes without a one-character symbol print as `1,234.50 CHF`.
fn format_amount(currency: &Currency, amount: Decimal) -> String {
  let symbol = currency.symbol();
  let prefix = if symbol.ends_with(' ') { "" } else { symbol.as_str() };
  format!("{}{} {}", prefix, format_grouped(amount), currency)
}

fn totals_rows(meta: &InvoiceEmailMeta) -> Vec<TotalsRow> {
  let currency = &meta.currency;
  let mut rows = Vec::new();
  if let Some(subtotal) = meta.subtotal {
    rows.push(TotalsRow {
      label: "Subtotal",
      value: format_amount(currency, subtotal),
      emphasis: false,
    });
  }
  if let Some(discount) = meta.discount {
    rows.push(TotalsRow {
      label: "Discount",
      value: format!("-{}", format_amount(currency, discount)),
      emphasis: false,
    });
  }
  if let Some(tax) = meta.tax_amount {
    rows.push(TotalsRow {
      label: "Tax",
      value: format_amount(currency, tax),
      emphasis: false,
    });
  }
  if let Some(total) = meta.total {
    rows.push(TotalsRow {
      label: "Total",
      value: format_amount(currency, total),
      emphasis: true,
    });
  }
  rows
}

/// Invoice number, else invoice id, as shown in subjects and file names.
fn display_number(meta: &InvoiceEmailMeta) -> Option<String> {
  meta
    .invoice_no
    .as_deref()
    .map(str::trim)
    .filter(|no| !no.is_empty())
    .map(str::to_string)
    .or_else(|| meta.invoice_id.map(|id| id.to_string()))
}

/// Composes branded invoice e-mails and hands them to an [`EmailProvider`].
pub struct BrandedInvoiceMailer {
  provider: Arc<dyn EmailProvider>,
  brand: BrandConfig,
  from: Mailbox,
  templates: Tera,
}

impl BrandedInvoiceMailer {
  /// Sender address and name come from `config` when set, otherwise from
  /// the brand support e-mail and `"<Brand> Billing"`.
  pub fn new(
    provider: Arc<dyn EmailProvider>,
    brand: BrandConfig,
    config: Option<&EmailConfig>,
  ) -> Result<Self, EmailError> {
    let mut templates = Tera::default();
    templates
      .add_raw_templates(vec![
        (
          HTML_TEMPLATE,
          include_str!("../../../templates/email/invoice_email.html.tera"),
        ),
        (
          TEXT_TEMPLATE,
          include_str!("../../../templates/email/invoice_email.txt.tera"),
        ),
      ])
      .map_err(|e| EmailError::Template(e.to_string()))?;
    templates.autoescape_on(vec!["html.tera", ".html"]);

    let from = Mailbox {
      email: config
        .and_then(|c| c.from_email.clone())
        .filter(|email| !email.trim().is_empty())
        .unwrap_or_else(|| brand.email.clone()),
      name: Some(
        config
          .and_then(|c| c.from_name.clone())
          .filter(|name| !name.trim().is_empty())
          .unwrap_or_else(|| format!("{} Billing", brand.name)),
      ),
    };

    Ok(Self {
      provider,
      brand,
      from,
      templates,
    })
  }

  fn default_subject(&self, number: Option<&str>) -> String {
    match number {
      Some(no) => format!("Invoice #{} from {}", no, self.brand.name),
      None => format!("Invoice from {}", self.brand.name),
    }
  }

  fn render_bodies(
    &self,
    subject: &str,
    message: Option<&str>,
    meta: &InvoiceEmailMeta,
    number: Option<&str>,
  ) -> Result<(String, String), EmailError> {
    let optional = |value: &str| {
      let trimmed = value.trim();
      (!trimmed.is_empty()).then(|| trimmed.to_string())
    };

    let mut context = Context::new();
    context.insert("subject", subject);
    context.insert("brand_name", &self.brand.name);
    context.insert("logo_url", &self.brand.logo_url);
    context.insert("site_url", &optional(&self.brand.website));
    context.insert("support_email", &self.brand.email);
    context.insert("phone", &optional(&self.brand.phone));
    context.insert("address", &optional(&self.brand.address));
    context.insert("invoice_no", &number);
    context.insert("message", &message.and_then(optional));
    context.insert("rows", &totals_rows(meta));
    context.insert(
      "total",
      &meta.total.map(|total| format!("{} {}", format_grouped(total), meta.currency)),
    );

    let html = self
      .templates
      .render(HTML_TEMPLATE, &context)
      .map_err(|e| EmailError::Template(e.to_string()))?;
    let text = self
      .templates
      .render(TEXT_TEMPLATE, &context)
      .map_err(|e| EmailError::Template(e.to_string()))?;
    Ok((html, text))
  }
}

#[async_trait]
impl InvoiceMailer for BrandedInvoiceMailer {
  async fn send(&self, email: InvoiceEmail) -> Result<EmailReceipt, EmailError> {
    if !self.provider.is_configured() {
      return Err(EmailError::NotConfigured);
    }
    let to = email.to.as_deref().map(parse_recipients).unwrap_or_default();
    if to.is_empty() {
      return Err(EmailError::MissingRecipient);
    }
    if email.pdf.is_empty() {
      return Err(EmailError::InvalidAttachment("PDF buffer is empty".to_string()));
    }
    if !email.pdf.starts_with(PDF_MAGIC) {
      return Err(EmailError::InvalidAttachment(
        "attachment is not a PDF document".to_string(),
      ));
    }

    let number = display_number(&email.meta);
    let subject = email
      .subject
      .as_deref()
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(str::to_string)
      .unwrap_or_else(|| self.default_subject(number.as_deref()));
    let (html_body, text_body) =
      self.render_bodies(&subject, email.message.as_deref(), &email.meta, number.as_deref())?;

    let filename = format!("Invoice-{}.pdf", number.as_deref().unwrap_or("document"));
    let message = EmailMessage {
      to,
      cc: email.cc.as_deref().map(parse_recipients).unwrap_or_default(),
      from: self.from.clone(),
      reply_to: Some(self.brand.email.clone()).filter(|e| !e.trim().is_empty()),
      subject,
      text_body,
      html_body,
      attachments: vec![Attachment {
        content: STANDARD.encode(&email.pdf),
        filename,
        mime_type: PDF_MIME_TYPE.to_string(),
        disposition: "attachment".to_string(),
      }],
    };

    let response = self.provider.send(&message).await?;
    Ok(EmailReceipt {
      ok: true,
      engine: self.provider.engine().to_string(),
      status: response.status,
    })
  }
}
