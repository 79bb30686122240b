//! Invoice arithmetic shared by the API totals and the PDF layout.
//!
//! Every aggregation step rounds to two decimals (half away from zero) so a
//! total shown in a draft response, stored on the invoice header and printed
//! on the PDF is always the same number.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::Serialize;

use super::value_objects::ValueObjectError;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Exclusive bound of the `NUMERIC(12,2)` money columns.
pub const AMOUNT_LIMIT: Decimal = dec!(10000000000);
/// Exclusive bound of `NUMERIC(12,4)` quantities.
pub const QUANTITY_LIMIT: Decimal = dec!(100000000);
/// Exclusive bound of the `NUMERIC(7,3)` tax percent.
pub const TAX_PERCENT_LIMIT: Decimal = dec!(10000);

const QUANTITY_DP: u32 = 4;
const TAX_PERCENT_DP: u32 = 3;

/// Rounds to two decimals and fixes the scale at two, so `80` becomes `80.00`.
pub fn round2(value: Decimal) -> Decimal {
  let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
  rounded.rescale(2);
  rounded
}

/// Quantity at the scale it is stored with.
pub fn round_quantity(value: Decimal) -> Decimal {
  value.round_dp_with_strategy(QUANTITY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Tax percent at the scale it is stored with.
pub fn round_tax_percent(value: Decimal) -> Decimal {
  value.round_dp_with_strategy(TAX_PERCENT_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounded unit price or discount, rejected when the column cannot hold it.
pub fn checked_amount(value: Decimal) -> Result<Decimal, ValueObjectError> {
  let value = round2(value);
  if value.abs() >= AMOUNT_LIMIT {
    return Err(ValueObjectError::InvalidAmount(format!(
      "{} must be below {}",
      value, AMOUNT_LIMIT
    )));
  }
  Ok(value)
}

pub fn checked_quantity(value: Decimal) -> Result<Decimal, ValueObjectError> {
  let value = round_quantity(value);
  if value.abs() >= QUANTITY_LIMIT {
    return Err(ValueObjectError::InvalidQuantity(format!(
      "{} must be below {}",
      value, QUANTITY_LIMIT
    )));
  }
  Ok(value)
}

pub fn checked_tax_percent(value: Decimal) -> Result<Decimal, ValueObjectError> {
  let value = round_tax_percent(value);
  if value.abs() >= TAX_PERCENT_LIMIT {
    return Err(ValueObjectError::InvalidTaxRate(format!(
      "{}% must be below {}%",
      value, TAX_PERCENT_LIMIT
    )));
  }
  Ok(value)
}

pub fn line_total(quantity: Decimal, unit_price: Decimal) -> Decimal {
  round2(quantity * unit_price)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceTotals {
  pub subtotal: Decimal,
  pub discount: Decimal,
  pub tax_percent: Decimal,
  pub tax_amount: Decimal,
  pub total: Decimal,
}

impl InvoiceTotals {
  /// Subtotal after the discount, clamped at zero.
  pub fn taxable_base(&self) -> Decimal {
    (self.subtotal - self.discount).max(Decimal::ZERO)
  }

  /// Fails when a total does not fit the invoice header columns.
  pub fn ensure_storable(&self) -> Result<(), ValueObjectError> {
    for (label, value) in [
      ("subtotal", self.subtotal),
      ("tax amount", self.tax_amount),
      ("total", self.total),
    ] {
      if value >= AMOUNT_LIMIT {
        return Err(ValueObjectError::InvalidAmount(format!(
          "{} {} must be below {}",
          label, value, AMOUNT_LIMIT
        )));
      }
    }
    Ok(())
  }
}

/// `lines` yields `(quantity, unit_price)` pairs.
///
/// Inputs are expected within the column bounds above; the checked
/// constructors of the invoice request enforce that before totals run.
pub fn compute_totals<I>(lines: I, discount: Decimal, tax_percent: Decimal) -> InvoiceTotals
where
  I: IntoIterator<Item = (Decimal, Decimal)>,
{
  let subtotal = round2(
    lines
      .into_iter()
      .map(|(quantity, unit_price)| line_total(quantity, unit_price))
      .sum(),
  );
  let discount = round2(discount);
  let base = (subtotal - discount).max(Decimal::ZERO);
  let tax_amount = round2(base * tax_percent / HUNDRED);
  let total = round2(base + tax_amount);

  InvoiceTotals {
    subtotal,
    discount,
    tax_percent,
    tax_amount,
    total,
  }
}
