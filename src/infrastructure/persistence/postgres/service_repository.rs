use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use crate::domain::invoice::{BillableService, errors::InvoiceError, ports::ServiceRepository};

#[derive(Debug, FromRow)]
struct ServiceRow {
  id: i64,
  client_id: i64,
  description: Option<String>,
  quantity: Option<Decimal>,
  unit_price: Option<Decimal>,
  status: Option<String>,
}

impl From<ServiceRow> for BillableService {
  fn from(row: ServiceRow) -> Self {
    BillableService {
      id: row.id,
      client_id: row.client_id,
      description: row.description,
      quantity: row.quantity,
      unit_price: row.unit_price,
      status: row.status,
    }
  }
}

pub struct PostgresServiceRepository {
  pool: PgPool,
}

impl PostgresServiceRepository {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl ServiceRepository for PostgresServiceRepository {
  async fn find_for_client(
    &self,
    client_id: i64,
    ids: &[i64],
  ) -> Result<Vec<BillableService>, InvoiceError> {
    if ids.is_empty() {
      return Ok(Vec::new());
    }

    // client_id in the WHERE clause keeps other clients' services out
    let rows = sqlx::query_as::<_, ServiceRow>(
      r#"
            SELECT id, client_id,
                   COALESCE(NULLIF(TRIM(description), ''), service_name) AS description,
                   quantity, unit_price, status
            FROM services
            WHERE id = ANY($1) AND client_id = $2
            ORDER BY id ASC
            "#,
    )
    .bind(ids)
    .bind(client_id)
    .fetch_all(&self.pool)
    .await?;

    Ok(rows.into_iter().map(BillableService::from).collect())
  }
}
