//! Page layout of the invoice document.
//!
//! Positions are in points on a US Letter page, measured from the top-left
//! corner; a text position is the top of its line box. The renderer flips
//! these into PDF space.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use std::path::PathBuf;

use super::font_metrics::{self, FontWeight};
use crate::domain::invoice::{BrandConfig, Currency, InvoicePayload, money};

pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;
pub const MARGIN_X: f32 = 50.0;
pub const MARGIN_Y: f32 = 60.0;

const RIGHT_X: f32 = PAGE_WIDTH - MARGIN_X;
const META_WIDTH: f32 = 220.0;
const LOGO_WIDTH: f32 = 110.0;
const LOGO_OFFSET: f32 = 130.0;

const QTY_RIGHT: f32 = RIGHT_X - 200.0;
const UNIT_RIGHT: f32 = RIGHT_X - 120.0;
const TOTAL_RIGHT: f32 = RIGHT_X - 40.0;
const QTY_COLUMN_WIDTH: f32 = 50.0;
const DESCRIPTION_WIDTH: f32 = QTY_RIGHT - QTY_COLUMN_WIDTH - MARGIN_X - 12.0;

const ROW_HEIGHT: f32 = 16.0;
const WRAPPED_LINE_HEIGHT: f32 = 12.0;
const ROW_LIMIT: f32 = PAGE_HEIGHT - 180.0;
const FOOTER_TOP: f32 = PAGE_HEIGHT - 70.0;

const RULE_GRAY: f32 = 0.8;
const FOOTER_GRAY: f32 = 0.333;
const BLACK: f32 = 0.0;

pub const THANK_YOU: &str = "Thank you for your business!";

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
  Text {
    text: String,
    x: f32,
    y: f32,
    size: f32,
    weight: FontWeight,
    gray: f32,
  },
  Rule {
    x1: f32,
    x2: f32,
    y: f32,
    gray: f32,
  },
  Image {
    path: PathBuf,
    x: f32,
    y: f32,
    width: f32,
  },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
  pub ops: Vec<DrawOp>,
}

impl Page {
  fn text(&mut self, text: impl Into<String>, x: f32, y: f32, size: f32, weight: FontWeight) {
    self.ops.push(DrawOp::Text {
      text: text.into(),
      x,
      y,
      size,
      weight,
      gray: BLACK,
    });
  }

  /// Text whose right edge sits at `right`.
  fn text_right(&mut self, text: impl Into<String>, right: f32, y: f32, size: f32, weight: FontWeight) {
    let text = text.into();
    let x = right - font_metrics::text_width(&text, size, weight);
    self.text(text, x, y, size, weight);
  }

  fn rule(&mut self, y: f32, gray: f32) {
    self.ops.push(DrawOp::Rule {
      x1: MARGIN_X,
      x2: RIGHT_X,
      y,
      gray,
    });
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceLayout {
  pub title: String,
  pub pages: Vec<Page>,
}

impl InvoiceLayout {
  /// Every text run in drawing order.
  pub fn texts(&self) -> impl Iterator<Item = &str> {
    self.pages.iter().flat_map(|page| {
      page.ops.iter().filter_map(|op| match op {
        DrawOp::Text { text, .. } => Some(text.as_str()),
        _ => None,
      })
    })
  }

  fn current(&mut self) -> &mut Page {
    if self.pages.is_empty() {
      self.pages.push(Page::default());
    }
    let last = self.pages.len() - 1;
    &mut self.pages[last]
  }

  fn new_page(&mut self) -> &mut Page {
    self.pages.push(Page::default());
    self.current()
  }
}

pub fn format_money(currency: &Currency, amount: Decimal) -> String {
  format!("{}{}", currency.symbol(), money::round2(amount))
}

fn format_quantity(quantity: Decimal) -> String {
  quantity.normalize().to_string()
}

/// Tax percentage at full stored precision without trailing zeros: `8.00`
/// prints as `8`, `8.875` stays `8.875`.
fn format_percent(percent: Decimal) -> String {
  percent.normalize().to_string()
}

fn format_date(date: NaiveDate) -> String {
  format!("{}/{}/{}", date.month(), date.day(), date.year())
}

/// Lays out `payload`; `today` dates payloads that carry no invoice date.
///
/// Totals are recomputed from the payload items with the shared money
/// rules, so they match the figures returned by the API.
pub fn layout_invoice(payload: &InvoicePayload, brand: &BrandConfig, today: NaiveDate) -> InvoiceLayout {
  let mut layout = InvoiceLayout {
    title: format!("Invoice {}", payload.number),
    pages: vec![Page::default()],
  };

  draw_header(layout.current(), payload, brand, today);
  let y = draw_bill_to(layout.current(), payload);
  let y = draw_items(&mut layout, payload, y);
  draw_totals(&mut layout, payload, y);
  draw_footer(layout.current());

  layout
}

fn draw_header(page: &mut Page, payload: &InvoicePayload, brand: &BrandConfig, today: NaiveDate) {
  let top = MARGIN_Y;

  let company_x = match brand.logo_path() {
    Some(path) => {
      page.ops.push(DrawOp::Image {
        path: path.to_path_buf(),
        x: MARGIN_X,
        y: top - 28.0,
        width: LOGO_WIDTH,
      });
      MARGIN_X + LOGO_OFFSET
    }
    None => MARGIN_X,
  };

  page.text(&brand.name, company_x, top, 16.0, FontWeight::Bold);
  let contact = [&brand.address, &brand.phone, &brand.email, &brand.website];
  for (index, value) in contact.into_iter().enumerate() {
    if !value.trim().is_empty() {
      page.text(value.trim(), company_x, top + 18.0 + 14.0 * index as f32, 10.0, FontWeight::Regular);
    }
  }

  page.text_right("INVOICE", RIGHT_X, top, 24.0, FontWeight::Bold);
  page.text_right(
    format!("Invoice #: {}", payload.number),
    RIGHT_X,
    top + 34.0,
    11.0,
    FontWeight::Regular,
  );
  let date = payload
    .meta
    .invoice_date
    .map(|d| d.date_naive())
    .unwrap_or(today);
  page.text_right(
    format!("Date: {}", format_date(date)),
    RIGHT_X,
    top + 50.0,
    11.0,
    FontWeight::Regular,
  );

  page.rule(top + 90.0, RULE_GRAY);
}

/// Returns the y where the items table may start.
fn draw_bill_to(page: &mut Page, payload: &InvoicePayload) -> f32 {
  let y = MARGIN_Y + 105.0;

  page.text("Bill To", MARGIN_X, y, 12.0, FontWeight::Bold);
  let mut line_y = y + 18.0;
  for line in payload.to.lines().map(str::trim).filter(|l| !l.is_empty()) {
    page.text(line, MARGIN_X, line_y, 11.0, FontWeight::Regular);
    line_y += 14.0;
  }

  page.text_right("Details", RIGHT_X, y, 11.0, FontWeight::Bold);
  page.text_right(
    format!("Currency: {}", payload.currency),
    RIGHT_X,
    y + 18.0,
    11.0,
    FontWeight::Regular,
  );

  line_y.max(y + 40.0)
}

fn draw_items(layout: &mut InvoiceLayout, payload: &InvoicePayload, start_y: f32) -> f32 {
  let mut y = start_y + 20.0;

  {
    let page = layout.current();
    page.text("Description", MARGIN_X, y, 11.0, FontWeight::Bold);
    page.text_right("Qty", QTY_RIGHT, y, 11.0, FontWeight::Bold);
    page.text_right("Unit", UNIT_RIGHT, y, 11.0, FontWeight::Bold);
    page.text_right("Total", TOTAL_RIGHT, y, 11.0, FontWeight::Bold);
  }
  y += 16.0;
  layout.current().rule(y, RULE_GRAY);
  y += 6.0;

  for item in &payload.items {
    let name_lines = font_metrics::wrap_text(&item.name, 10.0, FontWeight::Regular, DESCRIPTION_WIDTH);
    let row_height = ROW_HEIGHT + WRAPPED_LINE_HEIGHT * (name_lines.len() - 1) as f32;

    // Continuation pages carry neither the page header nor the table header.
    if y + row_height > ROW_LIMIT {
      layout.new_page();
      y = MARGIN_Y;
    }

    let page = layout.current();
    for (index, line) in name_lines.into_iter().enumerate() {
      page.text(line, MARGIN_X, y + WRAPPED_LINE_HEIGHT * index as f32, 10.0, FontWeight::Regular);
    }
    let line_total = money::line_total(item.quantity, item.unit_cost);
    page.text_right(format_quantity(item.quantity), QTY_RIGHT, y, 10.0, FontWeight::Regular);
    page.text_right(
      format_money(&payload.currency, item.unit_cost),
      UNIT_RIGHT,
      y,
      10.0,
      FontWeight::Regular,
    );
    page.text_right(
      format_money(&payload.currency, line_total),
      TOTAL_RIGHT,
      y,
      10.0,
      FontWeight::Regular,
    );

    y += row_height;
  }

  layout.current().rule(y + 4.0, RULE_GRAY);
  y + 14.0
}

fn draw_totals(layout: &mut InvoiceLayout, payload: &InvoicePayload, start_y: f32) {
  let totals = payload.totals();
  let currency = &payload.currency;

  let label_right = RIGHT_X - 90.0;
  let mut y = start_y + 10.0;
  if y + 4.0 * ROW_HEIGHT > FOOTER_TOP - 10.0 {
    layout.new_page();
    y = MARGIN_Y;
  }

  let rows = [
    ("Subtotal:".to_string(), format_money(currency, totals.subtotal), FontWeight::Regular, 11.0),
    (
      "Discounts:".to_string(),
      format!("-{}", format_money(currency, totals.discount)),
      FontWeight::Regular,
      11.0,
    ),
    (
      format!("Tax ({}%):", format_percent(totals.tax_percent)),
      format_money(currency, totals.tax_amount),
      FontWeight::Regular,
      11.0,
    ),
    ("Total:".to_string(), format_money(currency, totals.total), FontWeight::Bold, 12.0),
  ];

  let page = layout.current();
  for (label, value, weight, size) in rows {
    page.text_right(label, label_right, y, size, weight);
    page.text_right(value, RIGHT_X, y, size, weight);
    y += ROW_HEIGHT;
  }
}

fn draw_footer(page: &mut Page) {
  page.rule(FOOTER_TOP, RULE_GRAY);
  page.ops.push(DrawOp::Text {
    text: THANK_YOU.to_string(),
    x: MARGIN_X,
    y: PAGE_HEIGHT - 60.0,
    size: 9.0,
    weight: FontWeight::Regular,
    gray: FOOTER_GRAY,
  });
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::invoice::{PayloadItem, PayloadMeta};
  use chrono::{TimeZone, Utc};
  use rust_decimal_macros::dec;

  fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()
  }

  fn item(name: &str, quantity: Decimal, unit_cost: Decimal) -> PayloadItem {
    PayloadItem {
      name: name.to_string(),
      quantity,
      unit_cost,
    }
  }

  fn payload(items: Vec<PayloadItem>, discounts: Decimal, tax: Decimal) -> InvoicePayload {
    InvoicePayload {
      from: "Total Repair Now\nCRM".to_string(),
      to: "Ada Lovelace\n\nada@example.com".to_string(),
      number: "1042".to_string(),
      currency: Currency::usd(),
      items,
      tax,
      discounts,
      meta: PayloadMeta {
        invoice_date: Some(Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap()),
      },
    }
  }

  fn has_text(layout: &InvoiceLayout, needle: &str) -> bool {
    layout.texts().any(|t| t == needle)
  }

  #[test]
  fn test_totals_block_uses_shared_arithmetic() {
    let layout = layout_invoice(
      &payload(vec![item("Cleaning", dec!(2), dec!(10))], dec!(5), dec!(8)),
      &BrandConfig::default(),
      today(),
    );

    assert!(has_text(&layout, "$20.00"));
    assert!(has_text(&layout, "-$5.00"));
    assert!(has_text(&layout, "Tax (8%):"));
    assert!(has_text(&layout, "$1.20"));
    assert!(has_text(&layout, "$16.20"));
  }

  #[test]
  fn test_tax_label_matches_rate_used_for_amount() {
    let layout = layout_invoice(
      &payload(vec![item("Washer", dec!(3), dec!(0.34))], dec!(0), dec!(8.875)),
      &BrandConfig::default(),
      today(),
    );

    assert!(has_text(&layout, "Tax (8.875%):"));
    assert!(has_text(&layout, "$0.09"));
    assert!(has_text(&layout, "$1.11"));
  }

  #[test]
  fn test_header_and_bill_to() {
    let layout = layout_invoice(&payload(vec![], dec!(0), dec!(0)), &BrandConfig::default(), today());

    assert!(has_text(&layout, "INVOICE"));
    assert!(has_text(&layout, "Invoice #: 1042"));
    assert!(has_text(&layout, "Date: 3/14/2025"));
    assert!(has_text(&layout, "Ada Lovelace"));
    assert!(has_text(&layout, "ada@example.com"));
    assert!(has_text(&layout, "Currency: USD"));
    assert!(!layout.texts().any(|t| t.is_empty()));
    assert_eq!(layout.pages.len(), 1);
  }

  #[test]
  fn test_missing_date_uses_today() {
    let mut p = payload(vec![], dec!(0), dec!(0));
    p.meta.invoice_date = None;
    let layout = layout_invoice(&p, &BrandConfig::default(), today());
    assert!(has_text(&layout, "Date: 1/2/2025"));
  }

  #[test]
  fn test_right_aligned_title_ends_at_margin() {
    let layout = layout_invoice(&payload(vec![], dec!(0), dec!(0)), &BrandConfig::default(), today());
    let title = layout.pages[0]
      .ops
      .iter()
      .find_map(|op| match op {
        DrawOp::Text { text, x, size, weight, .. } if text == "INVOICE" => Some((*x, *size, *weight)),
        _ => None,
      })
      .unwrap();
    let right = title.0 + font_metrics::text_width("INVOICE", title.1, title.2);
    assert!((right - RIGHT_X).abs() < 0.01);
  }

  #[test]
  fn test_logo_shifts_company_block() {
    let brand = BrandConfig {
      logo_path: Some(PathBuf::from("/nonexistent/logo.png")),
      ..BrandConfig::default()
    };
    let layout = layout_invoice(&payload(vec![], dec!(0), dec!(0)), &brand, today());
    let ops = &layout.pages[0].ops;
    assert!(matches!(ops[0], DrawOp::Image { width, .. } if width == LOGO_WIDTH));
    let name_x = ops
      .iter()
      .find_map(|op| match op {
        DrawOp::Text { text, x, .. } if text == "Total Repair Now" => Some(*x),
        _ => None,
      })
      .unwrap();
    assert_eq!(name_x, MARGIN_X + LOGO_OFFSET);
  }

  #[test]
  fn test_many_items_paginate_and_footer_on_last_page() {
    let items = (1..=60)
      .map(|i| item(&format!("Service {}", i), dec!(1), dec!(1)))
      .collect();
    let layout = layout_invoice(&payload(items, dec!(0), dec!(0)), &BrandConfig::default(), today());

    assert!(layout.pages.len() > 1);
    for page in &layout.pages {
      for op in &page.ops {
        if let DrawOp::Text { text, y, .. } = op {
          if text.starts_with("Service ") {
            assert!(*y + ROW_HEIGHT <= ROW_LIMIT, "{} at {}", text, y);
          }
        }
      }
    }

    let last = layout.pages.len() - 1;
    for (index, page) in layout.pages.iter().enumerate() {
      let has_footer = page
        .ops
        .iter()
        .any(|op| matches!(op, DrawOp::Text { text, .. } if text == THANK_YOU));
      assert_eq!(has_footer, index == last);
    }
    assert!(has_text(&layout, "$60.00"));
  }

  #[test]
  fn test_long_description_wraps() {
    let name = "Full device teardown including board-level diagnostics, water damage treatment and reassembly with new adhesive";
    let layout = layout_invoice(
      &payload(vec![item(name, dec!(1), dec!(120))], dec!(0), dec!(0)),
      &BrandConfig::default(),
      today(),
    );
    let fragments: Vec<&str> = layout
      .texts()
      .filter(|t| name.contains(*t) && t.len() > 3)
      .collect();
    assert!(fragments.len() > 1);
    assert_eq!(fragments.join(" "), name);
  }

  #[test]
  fn test_format_helpers() {
    assert_eq!(format_percent(dec!(8.00)), "8");
    assert_eq!(format_percent(dec!(7.25)), "7.25");
    assert_eq!(format_percent(dec!(8.875)), "8.875");
    assert_eq!(format_quantity(dec!(3.0000)), "3");
    assert_eq!(format_money(&Currency::usd(), dec!(80)), "$80.00");
    assert_eq!(format_money(&"EUR".parse().unwrap(), dec!(1.5)), "€1.50");
    assert_eq!(format_money(&"CHF".parse().unwrap(), dec!(2)), "CHF 2.00");
  }
}
