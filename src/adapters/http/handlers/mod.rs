pub mod invoices;
pub mod metrics;
