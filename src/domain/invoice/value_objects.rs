use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValueObjectError {
  #[error("Invalid currency code: {0}")]
  InvalidCurrency(String),
  #[error("Invalid amount: {0}")]
  InvalidAmount(String),
  #[error("Invalid quantity: {0}")]
  InvalidQuantity(String),
  #[error("Invalid tax rate: {0}")]
  InvalidTaxRate(String),
  #[error("Invalid invoice number: {0}")]
  InvalidInvoiceNumber(String),
}

// Invoice Number - allocated by storage at creation time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceNumber(String);

impl InvoiceNumber {
  pub fn new(value: String) -> Result<Self, ValueObjectError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
      return Err(ValueObjectError::InvalidInvoiceNumber(
        "Invoice number cannot be empty".to_string(),
      ));
    }
    if trimmed.len() > 64 {
      return Err(ValueObjectError::InvalidInvoiceNumber(
        "Invoice number cannot exceed 64 characters".to_string(),
      ));
    }
    Ok(Self(trimmed.to_string()))
  }

  pub fn value(&self) -> &str {
    &self.0
  }

  pub fn into_inner(self) -> String {
    self.0
  }
}

impl fmt::Display for InvoiceNumber {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

// Currency - ISO 4217 alphabetic code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
  pub fn usd() -> Self {
    Self("USD".to_string())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// Prefix used when printing amounts. Codes without a well-known symbol
  /// print as the code followed by a space.
  pub fn symbol(&self) -> String {
    match self.0.as_str() {
      "USD" | "CAD" | "AUD" | "MXN" => "$".to_string(),
      "EUR" => "€".to_string(),
      "GBP" => "£".to_string(),
      "JPY" => "¥".to_string(),
      other => format!("{} ", other),
    }
  }
}

impl Default for Currency {
  fn default() -> Self {
    Self::usd()
  }
}

impl FromStr for Currency {
  type Err = ValueObjectError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let code = s.trim().to_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
      return Err(ValueObjectError::InvalidCurrency(format!(
        "Expected a three-letter ISO code, got '{}'",
        s
      )));
    }
    Ok(Self(code))
  }
}

impl TryFrom<String> for Currency {
  type Error = ValueObjectError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<Currency> for String {
  fn from(value: Currency) -> Self {
    value.0
  }
}

impl fmt::Display for Currency {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Work-order states that may be turned into invoice lines.
pub const BILLABLE_STATUSES: [&str; 5] = ["pending", "approved", "ready", "done", "scheduled"];

/// A service without any recorded status is billable; otherwise the status
/// must be in [`BILLABLE_STATUSES`], compared case-insensitively.
pub fn is_billable_status(status: Option<&str>) -> bool {
  match status.map(str::trim) {
    None | Some("") => true,
    Some(s) => {
      let lowered = s.to_lowercase();
      BILLABLE_STATUSES.contains(&lowered.as_str())
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_invoice_number() {
    assert!(InvoiceNumber::new("1001".to_string()).is_ok());
    assert!(InvoiceNumber::new("   ".to_string()).is_err());
    assert_eq!(
      InvoiceNumber::new(" 20250101120000 ".to_string())
        .unwrap()
        .to_string(),
      "20250101120000"
    );
  }

  #[test]
  fn test_currency() {
    assert_eq!(Currency::from_str("usd").unwrap().as_str(), "USD");
    assert_eq!(Currency::from_str("EUR").unwrap().symbol(), "€");
    assert_eq!(Currency::from_str("dkk").unwrap().symbol(), "DKK ");
    assert!(Currency::from_str("US").is_err());
    assert!(Currency::from_str("U$D").is_err());
    assert_eq!(Currency::default(), Currency::usd());
  }

  #[test]
  fn test_currency_serde() {
    let c: Currency = serde_json::from_str("\"gbp\"").unwrap();
    assert_eq!(c.as_str(), "GBP");
    assert_eq!(serde_json::to_string(&c).unwrap(), "\"GBP\"");
    assert!(serde_json::from_str::<Currency>("\"pounds\"").is_err());
  }

  #[test]
  fn test_billable_filtering() {
    let statuses = ["pending", "invoiced", "canceled", "done"];
    let billable: Vec<_> = statuses
      .iter()
      .filter(|s| is_billable_status(Some(s)))
      .collect();
    assert_eq!(billable, vec![&"pending", &"done"]);

    assert!(is_billable_status(Some("APPROVED")));
    assert!(is_billable_status(Some("Ready")));
    assert!(is_billable_status(Some("scheduled")));
    assert!(is_billable_status(None));
    assert!(is_billable_status(Some("  ")));
    assert!(!is_billable_status(Some("paid")));
  }
}
