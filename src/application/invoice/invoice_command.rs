use rust_decimal::Decimal;
use std::str::FromStr;

use crate::domain::invoice::{Currency, InvoiceError, InvoiceInput, InvoiceSource, LineInput};

/// One raw line as supplied by the caller; gaps are filled when normalized.
#[derive(Debug, Clone, Default)]
pub struct LineItemCommand {
  pub service_id: Option<i64>,
  pub description: Option<String>,
  pub quantity: Option<Decimal>,
  pub unit_price: Option<Decimal>,
}

/// Shared input of the draft and create use cases.
///
/// Raw `items` win when present; otherwise both `client_id` and at least one
/// service id are required.
#[derive(Debug, Clone, Default)]
pub struct InvoiceCommand {
  pub client_id: Option<i64>,
  pub service_ids: Vec<i64>,
  pub items: Vec<LineItemCommand>,
  pub discount: Option<Decimal>,
  pub tax: Option<Decimal>,
  pub currency: Option<String>,
}

impl InvoiceCommand {
  pub fn into_input(self) -> Result<InvoiceInput, InvoiceError> {
    let currency = match self.currency.as_deref().map(str::trim) {
      None | Some("") => Currency::default(),
      Some(code) => Currency::from_str(code)?,
    };
    let client_id = self.client_id.filter(|id| *id > 0);

    let source = if !self.items.is_empty() {
      InvoiceSource::ByRawLines(
        self
          .items
          .into_iter()
          .map(|item| {
            LineInput::new(
              item.service_id.filter(|id| *id > 0),
              item.description.as_deref().unwrap_or_default(),
              item.quantity,
              item.unit_price,
            )
          })
          .collect(),
      )
    } else {
      let ids: Vec<i64> = self.service_ids.into_iter().filter(|id| *id > 0).collect();
      match client_id {
        Some(client_id) if !ids.is_empty() => InvoiceSource::ByServiceIds { client_id, ids },
        _ => return Err(InvoiceError::MissingSource),
      }
    };

    InvoiceInput::new(
      source,
      client_id,
      currency,
      self.discount.unwrap_or(Decimal::ZERO),
      self.tax.unwrap_or(Decimal::ZERO),
    )
  }
}
