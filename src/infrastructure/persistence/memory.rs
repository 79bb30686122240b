//! Process-local implementation of the invoice ports.
//!
//! Used by the handler tests and for running the API without Postgres. A
//! create is applied under a single write lock, so a reader never observes
//! a header without its lines.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::invoice::{
  BillableService, Client, Invoice, InvoiceLine, InvoiceNumber, NewInvoice,
  entities::STATUS_CREATED,
  errors::InvoiceError,
  ports::{ClientRepository, InvoiceRepository, ServiceRepository},
};

const FIRST_INVOICE_NO: i64 = 1000;

#[derive(Default)]
struct State {
  clients: BTreeMap<i64, Client>,
  services: BTreeMap<i64, BillableService>,
  invoices: BTreeMap<i64, Invoice>,
  lines: Vec<InvoiceLine>,
  next_invoice_id: i64,
  next_line_id: i64,
  next_invoice_no: i64,
}

pub struct InMemoryStore {
  state: RwLock<State>,
  fail_line_inserts: AtomicBool,
}

impl Default for InMemoryStore {
  fn default() -> Self {
    Self::new()
  }
}

impl InMemoryStore {
  pub fn new() -> Self {
    Self {
      state: RwLock::new(State {
        next_invoice_id: 1,
        next_line_id: 1,
        next_invoice_no: FIRST_INVOICE_NO,
        ..Default::default()
      }),
      fail_line_inserts: AtomicBool::new(false),
    }
  }

  fn read(&self) -> RwLockReadGuard<'_, State> {
    self.state.read().unwrap_or_else(|e| e.into_inner())
  }

  fn write(&self) -> RwLockWriteGuard<'_, State> {
    self.state.write().unwrap_or_else(|e| e.into_inner())
  }

  pub fn add_client(&self, client: Client) {
    self.write().clients.insert(client.id, client);
  }

  pub fn add_service(&self, service: BillableService) {
    self.write().services.insert(service.id, service);
  }

  /// Makes every following create fail after the header was staged.
  pub fn fail_line_inserts(&self, fail: bool) {
    self.fail_line_inserts.store(fail, Ordering::SeqCst);
  }

  pub fn invoice_count(&self) -> usize {
    self.read().invoices.len()
  }

  pub fn line_count(&self) -> usize {
    self.read().lines.len()
  }
}

#[async_trait]
impl InvoiceRepository for InMemoryStore {
  async fn create(&self, invoice: NewInvoice) -> Result<(Invoice, Vec<InvoiceLine>), InvoiceError> {
    let mut state = self.write();

    let id = state.next_invoice_id;
    let invoice_no = InvoiceNumber::new(state.next_invoice_no.to_string())?;
    let header = Invoice {
      id,
      invoice_no,
      client_id: invoice.client_id,
      currency: invoice.currency,
      subtotal: invoice.totals.subtotal,
      discount: invoice.totals.discount,
      tax: invoice.totals.tax_percent,
      total: invoice.totals.total,
      status: STATUS_CREATED.to_string(),
      created_at: Utc::now(),
    };

    // Staged lines are discarded together with the header on failure.
    if self.fail_line_inserts.load(Ordering::SeqCst) {
      return Err(InvoiceError::Repository(
        "failed to insert invoice lines".to_string(),
      ));
    }

    let first_line_id = state.next_line_id;
    let lines: Vec<InvoiceLine> = invoice
      .lines
      .iter()
      .enumerate()
      .map(|(offset, line)| InvoiceLine {
        id: first_line_id + offset as i64,
        invoice_id: id,
        service_id: line.service_id,
        description: line.description.clone(),
        quantity: line.quantity,
        unit_price: line.unit_price,
        line_total: line.line_total(),
      })
      .collect();

    state.next_invoice_id += 1;
    state.next_invoice_no += 1;
    state.next_line_id += lines.len() as i64;
    state.invoices.insert(id, header.clone());
    state.lines.extend(lines.iter().cloned());

    Ok((header, lines))
  }

  async fn find_by_id(&self, id: i64) -> Result<Option<Invoice>, InvoiceError> {
    Ok(self.read().invoices.get(&id).cloned())
  }

  async fn find_lines(&self, invoice_id: i64) -> Result<Vec<InvoiceLine>, InvoiceError> {
    let mut lines: Vec<InvoiceLine> = self
      .read()
      .lines
      .iter()
      .filter(|line| line.invoice_id == invoice_id)
      .cloned()
      .collect();
    lines.sort_by_key(|line| line.id);
    Ok(lines)
  }
}

#[async_trait]
impl ClientRepository for InMemoryStore {
  async fn find_by_id(&self, id: i64) -> Result<Option<Client>, InvoiceError> {
    Ok(self.read().clients.get(&id).cloned())
  }
}

#[async_trait]
impl ServiceRepository for InMemoryStore {
  async fn find_for_client(
    &self,
    client_id: i64,
    ids: &[i64],
  ) -> Result<Vec<BillableService>, InvoiceError> {
    Ok(
      self
        .read()
        .services
        .values()
        .filter(|s| s.client_id == client_id && ids.contains(&s.id))
        .cloned()
        .collect(),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::invoice::{Currency, LineInput};
  use rust_decimal_macros::dec;

  fn new_invoice() -> NewInvoice {
    NewInvoice::new(
      None,
      Currency::usd(),
      vec![
        LineInput::new(None, "First", Some(dec!(1)), Some(dec!(10))),
        LineInput::new(None, "Second", Some(dec!(2)), Some(dec!(5))),
      ],
      dec!(0),
      dec!(0),
    )
  }

  #[tokio::test]
  async fn test_create_allocates_sequential_numbers() {
    let store = InMemoryStore::new();
    let (first, first_lines) = store.create(new_invoice()).await.unwrap();
    let (second, _) = store.create(new_invoice()).await.unwrap();

    assert_eq!(first.invoice_no.value(), "1000");
    assert_eq!(second.invoice_no.value(), "1001");
    assert_eq!(first_lines[1].line_total.to_string(), "10.00");

    let lines = store.find_lines(second.id).await.unwrap();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].id < lines[1].id);
    assert_eq!(lines[0].description, "First");
  }

  #[tokio::test]
  async fn test_failed_create_is_invisible() {
    let store = InMemoryStore::new();
    store.fail_line_inserts(true);
    assert!(store.create(new_invoice()).await.is_err());
    assert_eq!(store.invoice_count(), 0);
    assert_eq!(store.line_count(), 0);

    store.fail_line_inserts(false);
    let (invoice, _) = store.create(new_invoice()).await.unwrap();
    assert_eq!(invoice.id, 1);
    assert_eq!(invoice.invoice_no.value(), "1000");
  }
}
