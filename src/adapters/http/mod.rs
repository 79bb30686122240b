pub mod dtos;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod routes;

// Re-export commonly used types
pub use dtos::{EmailInvoiceRequest, ErrorResponse, InvoiceRequest};
pub use errors::ApiError;
pub use middleware::{RequestId, RequestIdExt, RequestIdMiddleware};
pub use routes::{InvoiceRouteDependencies, configure_invoice_routes, configure_metrics_routes};
