//! Invoice use cases driven by the HTTP adapter.

mod create_invoice;
mod draft_invoice;
mod email_invoice;
mod get_invoice;
mod invoice_command;
mod render_invoice_pdf;

pub use create_invoice::{CreateInvoiceResponse, CreateInvoiceUseCase};
pub use draft_invoice::{DraftInvoiceResponse, DraftInvoiceUseCase};
pub use email_invoice::{EmailInvoiceCommand, EmailInvoiceResponse, EmailInvoiceUseCase};
pub use get_invoice::{GetInvoiceCommand, GetInvoiceResponse, GetInvoiceUseCase};
pub use invoice_command::{InvoiceCommand, LineItemCommand};
pub use render_invoice_pdf::{RenderInvoicePdfCommand, RenderInvoicePdfUseCase};
