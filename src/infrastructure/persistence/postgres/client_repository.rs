use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use crate::domain::invoice::{Client, errors::InvoiceError, ports::ClientRepository};

#[derive(Debug, FromRow)]
struct ClientRow {
  id: i64,
  name: Option<String>,
  email: Option<String>,
  phone: Option<String>,
}

impl From<ClientRow> for Client {
  fn from(row: ClientRow) -> Self {
    Client {
      id: row.id,
      name: row.name,
      email: row.email,
      phone: row.phone,
    }
  }
}

pub struct PostgresClientRepository {
  pool: PgPool,
}

impl PostgresClientRepository {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl ClientRepository for PostgresClientRepository {
  async fn find_by_id(&self, id: i64) -> Result<Option<Client>, InvoiceError> {
    let row = sqlx::query_as::<_, ClientRow>(
      r#"
            SELECT id,
                   NULLIF(TRIM(name), '') AS name,
                   NULLIF(TRIM(email), '') AS email,
                   NULLIF(TRIM(phone), '') AS phone
            FROM clients
            WHERE id = $1
            "#,
    )
    .bind(id)
    .fetch_optional(&self.pool)
    .await?;

    Ok(row.map(Client::from))
  }
}
