pub mod client_repository;
pub mod invoice_repository;
pub mod service_repository;

pub use client_repository::PostgresClientRepository;
pub use invoice_repository::PostgresInvoiceRepository;
pub use service_repository::PostgresServiceRepository;
