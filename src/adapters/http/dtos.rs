use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use validator::Validate;

use crate::application::invoice::{EmailInvoiceCommand, InvoiceCommand, LineItemCommand};
use crate::domain::invoice::InvoicePayload;

/// Body of `POST /draft` and `POST /create`.
///
/// Numbers arrive from a loosely typed UI as JSON numbers or strings, so the
/// fields are kept as raw values and coerced when the command is built.
/// Values that do not parse fall back to their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InvoiceRequest {
  pub client_id: Value,
  pub service_ids: Value,
  pub items: Value,
  pub discount: Value,
  pub tax: Value,
  pub currency: Option<String>,
}

impl From<InvoiceRequest> for InvoiceCommand {
  fn from(request: InvoiceRequest) -> Self {
    let items = match &request.items {
      Value::Array(items) => items
        .iter()
        .filter(|item| item.is_object())
        .map(|item| LineItemCommand {
          service_id: item.get("service_id").and_then(positive_id),
          description: item.get("description").and_then(text),
          quantity: item.get("quantity").and_then(decimal),
          unit_price: item.get("unit_price").and_then(decimal),
        })
        .collect(),
      _ => Vec::new(),
    };

    InvoiceCommand {
      client_id: positive_id(&request.client_id),
      service_ids: ids(&request.service_ids),
      items,
      discount: decimal(&request.discount),
      tax: decimal(&request.tax),
      currency: request.currency,
    }
  }
}

fn decimal(value: &Value) -> Option<Decimal> {
  let raw = match value {
    Value::Number(n) => n.to_string(),
    Value::String(s) => s.trim().to_string(),
    _ => return None,
  };
  Decimal::from_str(&raw)
    .or_else(|_| Decimal::from_scientific(&raw))
    .ok()
}

fn positive_id(value: &Value) -> Option<i64> {
  let id = match value {
    Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
    Value::String(s) => {
      let s = s.trim();
      s.parse()
        .ok()
        .or_else(|| s.parse::<f64>().ok().and_then(integral))
    }
    _ => None,
  };
  id.filter(|id| *id > 0)
}

/// `3.0` counts as the integer 3.
fn integral(value: f64) -> Option<i64> {
  (value.fract() == 0.0 && value.abs() < i64::MAX as f64).then(|| value as i64)
}

/// Accepts a single id or an array; drops anything that is not a positive
/// integer.
fn ids(value: &Value) -> Vec<i64> {
  match value {
    Value::Array(values) => values.iter().filter_map(positive_id).collect(),
    Value::Null => Vec::new(),
    single => positive_id(single).into_iter().collect(),
  }
}

fn text(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  }
}

/// Body of `POST /{id}/email`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct EmailInvoiceRequest {
  /// Comma separated recipient list
  pub to: Option<String>,

  pub cc: Option<String>,

  #[validate(length(max = 998, message = "Subject must be at most 998 characters"))]
  pub subject: Option<String>,

  #[validate(length(max = 10000, message = "Message must be at most 10000 characters"))]
  pub message: Option<String>,
}

impl EmailInvoiceRequest {
  pub fn into_command(self, invoice_id: i64) -> EmailInvoiceCommand {
    EmailInvoiceCommand {
      invoice_id,
      to: self.to,
      cc: self.cc,
      subject: self.subject,
      message: self.message,
    }
  }
}

/// Query string of `GET /{id}/pdf`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PdfQuery {
  pub debug: Option<String>,
  pub download: Option<String>,
}

impl PdfQuery {
  pub fn debug(&self) -> bool {
    is_flag_set(self.debug.as_deref())
  }

  pub fn download(&self) -> bool {
    is_flag_set(self.download.as_deref())
  }
}

fn is_flag_set(value: Option<&str>) -> bool {
  matches!(value.map(str::trim), Some("1") | Some("true") | Some("yes"))
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
  pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct PayloadResponse {
  pub payload: InvoicePayload,
}

/// Standard error response
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
  /// Error type/code
  pub error: String,

  /// Human-readable error message
  pub message: String,
}
