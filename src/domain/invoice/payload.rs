use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::branding::BrandConfig;
use super::entities::{Client, Invoice, InvoiceLine, LineInput};
use super::money::{self, InvoiceTotals};
use super::value_objects::Currency;

/// Provider-agnostic invoice document consumed by the PDF renderer and the
/// mailer. Built on demand, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoicePayload {
  pub from: String,
  pub to: String,
  pub number: String,
  pub currency: Currency,
  pub items: Vec<PayloadItem>,
  /// Percentage.
  pub tax: Decimal,
  /// Absolute amount.
  pub discounts: Decimal,
  pub meta: PayloadMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayloadItem {
  pub name: String,
  pub quantity: Decimal,
  pub unit_cost: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PayloadMeta {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub invoice_date: Option<DateTime<Utc>>,
}

impl InvoicePayload {
  pub fn from_invoice(
    invoice: &Invoice,
    lines: &[InvoiceLine],
    client: Option<&Client>,
    brand: &BrandConfig,
  ) -> Self {
    Self {
      from: brand.sender_block(),
      to: bill_to_block(client),
      number: invoice.invoice_no.value().to_string(),
      currency: invoice.currency.clone(),
      items: lines
        .iter()
        .map(|line| PayloadItem {
          name: line.display_name(),
          quantity: line.quantity,
          unit_cost: line.unit_price,
        })
        .collect(),
      tax: invoice.tax,
      discounts: invoice.discount,
      meta: PayloadMeta {
        invoice_date: Some(invoice.created_at),
      },
    }
  }

  /// Totals recomputed from the items, never taken from the header.
  pub fn totals(&self) -> InvoiceTotals {
    money::compute_totals(
      self.items.iter().map(|i| (i.quantity, i.unit_cost)),
      self.discounts,
      self.tax,
    )
  }
}

/// Newline-joined name, e-mail and phone; `"Client"` when nothing usable.
pub fn bill_to_block(client: Option<&Client>) -> String {
  let parts: Vec<&str> = client
    .map(|c| {
      [&c.name, &c.email, &c.phone]
        .into_iter()
        .filter_map(|field| field.as_deref().map(str::trim))
        .filter(|value| !value.is_empty())
        .collect()
    })
    .unwrap_or_default();

  if parts.is_empty() {
    "Client".to_string()
  } else {
    parts.join("\n")
  }
}

/// Totals preview returned by the draft endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DraftSummary {
  pub currency: Currency,
  pub subtotal: Decimal,
  pub discount: Decimal,
  pub tax: Decimal,
  pub tax_amount: Decimal,
  pub total: Decimal,
  pub items_count: usize,
}

impl DraftSummary {
  pub fn totals(&self) -> InvoiceTotals {
    InvoiceTotals {
      subtotal: self.subtotal,
      discount: self.discount,
      tax_percent: self.tax,
      tax_amount: self.tax_amount,
      total: self.total,
    }
  }
}

pub fn draft_summary(
  currency: Currency,
  items: &[LineInput],
  discount: Decimal,
  tax_percent: Decimal,
) -> DraftSummary {
  let totals = money::compute_totals(
    items.iter().map(|i| (i.quantity, i.unit_price)),
    discount,
    tax_percent,
  );
  DraftSummary {
    currency,
    subtotal: totals.subtotal,
    discount: totals.discount,
    tax: tax_percent,
    tax_amount: totals.tax_amount,
    total: totals.total,
    items_count: items.len(),
  }
}
