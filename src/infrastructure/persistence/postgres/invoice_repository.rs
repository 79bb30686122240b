use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Acquire, FromRow, PgConnection, PgPool, Postgres, QueryBuilder};
use std::str::FromStr;

use crate::domain::invoice::{
  Currency, Invoice, InvoiceLine, InvoiceNumber, NewInvoice, entities::STATUS_CREATED,
  errors::InvoiceError, ports::InvoiceRepository,
};

#[derive(Debug, FromRow)]
struct InvoiceRow {
  id: i64,
  invoice_no: String,
  client_id: Option<i64>,
  currency: String,
  subtotal: Decimal,
  discount: Decimal,
  tax: Decimal,
  total: Decimal,
  status: String,
  created_at: DateTime<Utc>,
}

impl TryFrom<InvoiceRow> for Invoice {
  type Error = InvoiceError;

  fn try_from(row: InvoiceRow) -> Result<Self, Self::Error> {
    let invoice_no = InvoiceNumber::new(row.invoice_no)?;
    let currency = Currency::from_str(&row.currency)?;

    Ok(Invoice {
      id: row.id,
      invoice_no,
      client_id: row.client_id,
      currency,
      subtotal: row.subtotal,
      discount: row.discount,
      tax: row.tax,
      total: row.total,
      status: row.status,
      created_at: row.created_at,
    })
  }
}

#[derive(Debug, FromRow)]
struct InvoiceLineRow {
  id: i64,
  invoice_id: i64,
  service_id: Option<i64>,
  description: String,
  quantity: Decimal,
  unit_price: Decimal,
  line_total: Decimal,
}

impl From<InvoiceLineRow> for InvoiceLine {
  fn from(row: InvoiceLineRow) -> Self {
    InvoiceLine {
      id: row.id,
      invoice_id: row.invoice_id,
      service_id: row.service_id,
      description: row.description,
      quantity: row.quantity,
      unit_price: row.unit_price,
      line_total: row.line_total,
    }
  }
}

/// Number from `invoice_no_seq`, or a `YYYYMMDDHHMMSS` timestamp when the
/// sequence cannot be read. Two creates within the same second can collide
/// on the fallback; the UNIQUE constraint on `invoice_no` turns that into an
/// error instead of a duplicate.
async fn next_invoice_number(conn: &mut PgConnection) -> Result<InvoiceNumber, InvoiceError> {
  // Savepoint: a failed nextval must not abort the surrounding transaction.
  let mut savepoint = conn.begin().await?;
  let value = match sqlx::query_scalar::<_, i64>("SELECT nextval('invoice_no_seq')")
    .fetch_one(&mut *savepoint)
    .await
  {
    Ok(seq) => {
      savepoint.commit().await?;
      seq.to_string()
    }
    Err(e) => {
      savepoint.rollback().await?;
      tracing::warn!(error = %e, "invoice_no_seq unavailable, using timestamp invoice number");
      Utc::now().format("%Y%m%d%H%M%S").to_string()
    }
  };

  Ok(InvoiceNumber::new(value)?)
}

pub struct PostgresInvoiceRepository {
  pool: PgPool,
}

impl PostgresInvoiceRepository {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl InvoiceRepository for PostgresInvoiceRepository {
  async fn create(&self, invoice: NewInvoice) -> Result<(Invoice, Vec<InvoiceLine>), InvoiceError> {
    // Dropping `tx` on any early return rolls everything back.
    let mut tx = self.pool.begin().await?;

    let invoice_no = next_invoice_number(&mut tx).await?;

    let row = sqlx::query_as::<_, InvoiceRow>(
      r#"
            INSERT INTO invoices (
                invoice_no, client_id, currency, subtotal, discount, tax, total, status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
            RETURNING id, invoice_no, client_id, currency, subtotal, discount, tax, total,
                      status, created_at
            "#,
    )
    .bind(invoice_no.value())
    .bind(invoice.client_id)
    .bind(invoice.currency.as_str())
    .bind(invoice.totals.subtotal)
    .bind(invoice.totals.discount)
    .bind(invoice.totals.tax_percent)
    .bind(invoice.totals.total)
    .bind(STATUS_CREATED)
    .fetch_one(&mut *tx)
    .await?;
    let invoice_id = row.id;

    // line_total is a generated column and is never written
    let mut line_rows = if invoice.lines.is_empty() {
      Vec::new()
    } else {
      let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
        "INSERT INTO invoice_lines (invoice_id, service_id, description, quantity, unit_price) ",
      );
      builder.push_values(&invoice.lines, |mut b, line| {
        b.push_bind(invoice_id)
          .push_bind(line.service_id)
          .push_bind(line.description.clone())
          .push_bind(line.quantity)
          .push_bind(line.unit_price);
      });
      builder.push(
        " RETURNING id, invoice_id, service_id, description, quantity, unit_price, line_total",
      );
      builder
        .build_query_as::<InvoiceLineRow>()
        .fetch_all(&mut *tx)
        .await?
    };
    line_rows.sort_by_key(|line| line.id);

    tx.commit().await?;

    let invoice = Invoice::try_from(row)?;
    let lines = line_rows.into_iter().map(InvoiceLine::from).collect();
    Ok((invoice, lines))
  }

  async fn find_by_id(&self, id: i64) -> Result<Option<Invoice>, InvoiceError> {
    let row = sqlx::query_as::<_, InvoiceRow>(
      r#"
            SELECT id, invoice_no, client_id, currency, subtotal, discount, tax, total,
                   status, created_at
            FROM invoices
            WHERE id = $1
            "#,
    )
    .bind(id)
    .fetch_optional(&self.pool)
    .await?;

    row.map(|r| r.try_into()).transpose()
  }

  async fn find_lines(&self, invoice_id: i64) -> Result<Vec<InvoiceLine>, InvoiceError> {
    let rows = sqlx::query_as::<_, InvoiceLineRow>(
      r#"
            SELECT id, invoice_id, service_id, description, quantity, unit_price, line_total
            FROM invoice_lines
            WHERE invoice_id = $1
            ORDER BY id ASC
            "#,
    )
    .bind(invoice_id)
    .fetch_all(&self.pool)
    .await?;

    Ok(rows.into_iter().map(InvoiceLine::from).collect())
  }
}
