use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::money::{self, InvoiceTotals};
use super::value_objects::{Currency, InvoiceNumber};

pub const STATUS_CREATED: &str = "created";

// Invoice - persisted header
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invoice {
  pub id: i64,
  pub invoice_no: InvoiceNumber,
  pub client_id: Option<i64>,
  pub currency: Currency,
  pub subtotal: Decimal,
  pub discount: Decimal,
  /// Percentage, not an amount.
  pub tax: Decimal,
  pub total: Decimal,
  pub status: String,
  pub created_at: DateTime<Utc>,
}

// Invoice Line - one billable row of an invoice
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceLine {
  pub id: i64,
  pub invoice_id: i64,
  pub service_id: Option<i64>,
  pub description: String,
  pub quantity: Decimal,
  pub unit_price: Decimal,
  pub line_total: Decimal,
}

impl InvoiceLine {
  /// Label used on documents; never empty.
  pub fn display_name(&self) -> String {
    line_label(&self.description, self.service_id)
  }
}

pub(crate) fn line_label(description: &str, service_id: Option<i64>) -> String {
  let trimmed = description.trim();
  if !trimmed.is_empty() {
    return trimmed.to_string();
  }
  match service_id {
    Some(id) => format!("Service #{}", id),
    None => "Service".to_string(),
  }
}

/// Normalized, not yet persisted invoice line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineInput {
  pub service_id: Option<i64>,
  pub description: String,
  pub quantity: Decimal,
  pub unit_price: Decimal,
}

impl LineInput {
  pub fn new(
    service_id: Option<i64>,
    description: &str,
    quantity: Option<Decimal>,
    unit_price: Option<Decimal>,
  ) -> Self {
    Self {
      service_id,
      description: line_label(description, service_id),
      quantity: money::round_quantity(quantity.unwrap_or(Decimal::ONE)),
      unit_price: money::round2(unit_price.unwrap_or(Decimal::ZERO)),
    }
  }

  pub fn line_total(&self) -> Decimal {
    money::line_total(self.quantity, self.unit_price)
  }
}

/// Everything storage needs to create an invoice; the invoice number and
/// ids are allocated by the repository.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInvoice {
  pub client_id: Option<i64>,
  pub currency: Currency,
  pub totals: InvoiceTotals,
  pub lines: Vec<LineInput>,
}

impl NewInvoice {
  pub fn new(
    client_id: Option<i64>,
    currency: Currency,
    lines: Vec<LineInput>,
    discount: Decimal,
    tax_percent: Decimal,
  ) -> Self {
    let totals = money::compute_totals(
      lines.iter().map(|l| (l.quantity, l.unit_price)),
      discount,
      tax_percent,
    );
    Self {
      client_id,
      currency,
      totals,
      lines,
    }
  }
}

// Client - read-only collaborator supplying the bill-to block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Client {
  pub id: i64,
  pub name: Option<String>,
  pub email: Option<String>,
  pub phone: Option<String>,
}

// Billable Service - read-only work order row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillableService {
  pub id: i64,
  pub client_id: i64,
  pub description: Option<String>,
  pub quantity: Option<Decimal>,
  pub unit_price: Option<Decimal>,
  pub status: Option<String>,
}

impl BillableService {
  pub fn is_billable(&self) -> bool {
    super::value_objects::is_billable_status(self.status.as_deref())
  }

  pub fn to_line(&self) -> LineInput {
    LineInput::new(
      Some(self.id),
      self.description.as_deref().unwrap_or_default(),
      self.quantity,
      self.unit_price,
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rust_decimal_macros::dec;

  #[test]
  fn test_line_input_defaults() {
    let line = LineInput::new(None, "  ", None, None);
    assert_eq!(line.description, "Service");
    assert_eq!(line.quantity, dec!(1));
    assert_eq!(line.unit_price, dec!(0));

    let line = LineInput::new(Some(42), "", Some(dec!(2)), Some(dec!(12.5)));
    assert_eq!(line.description, "Service #42");
    assert_eq!(line.line_total().to_string(), "25.00");
  }

  #[test]
  fn test_line_input_uses_storage_scale() {
    let line = LineInput::new(None, "Filter", Some(dec!(3)), Some(dec!(0.335)));
    assert_eq!(line.unit_price, dec!(0.34));
    assert_eq!(line.line_total().to_string(), "1.02");

    let line = LineInput::new(None, "Cable", Some(dec!(0.33335)), Some(dec!(3)));
    assert_eq!(line.quantity, dec!(0.3334));
  }

  #[test]
  fn test_new_invoice_computes_totals() {
    let invoice = NewInvoice::new(
      Some(7),
      Currency::usd(),
      vec![
        LineInput::new(Some(1), "Diagnostics", Some(dec!(1)), Some(dec!(50))),
        LineInput::new(Some(2), "Labor hour", Some(dec!(3)), Some(dec!(10))),
      ],
      dec!(0),
      dec!(10),
    );
    assert_eq!(invoice.totals.subtotal.to_string(), "80.00");
    assert_eq!(invoice.totals.total.to_string(), "88.00");
  }

  #[test]
  fn test_service_to_line() {
    let service = BillableService {
      id: 9,
      client_id: 3,
      description: None,
      quantity: None,
      unit_price: Some(dec!(75)),
      status: Some("Done".to_string()),
    };
    assert!(service.is_billable());
    let line = service.to_line();
    assert_eq!(line.service_id, Some(9));
    assert_eq!(line.description, "Service #9");
    assert_eq!(line.quantity, dec!(1));
  }

  #[test]
  fn test_invoice_line_display_name() {
    let line = InvoiceLine {
      id: 1,
      invoice_id: 1,
      service_id: Some(5),
      description: String::new(),
      quantity: dec!(1),
      unit_price: dec!(1),
      line_total: dec!(1),
    };
    assert_eq!(line.display_name(), "Service #5");
  }
}
