pub mod branding;
pub mod entities;
pub mod errors;
pub mod money;
pub mod payload;
pub mod ports;
pub mod services;
pub mod value_objects;

pub use branding::BrandConfig;
pub use entities::{BillableService, Client, Invoice, InvoiceLine, LineInput, NewInvoice};
pub use errors::{EmailError, InvoiceError};
pub use money::InvoiceTotals;
pub use payload::{DraftSummary, InvoicePayload, PayloadItem, PayloadMeta};
pub use ports::{
  ClientRepository, EmailReceipt, InvoiceEmail, InvoiceEmailMeta, InvoiceMailer,
  InvoiceRepository, PdfRenderer, ServiceRepository,
};
pub use services::{
  EmailRequest, InvoiceInput, InvoiceService, InvoiceServiceDependencies, InvoiceSource,
  RenderedInvoice,
};
pub use value_objects::{Currency, InvoiceNumber, ValueObjectError};
