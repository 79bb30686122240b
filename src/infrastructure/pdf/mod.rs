pub mod font_metrics;
pub mod layout;
pub mod printpdf_renderer;

pub use layout::{InvoiceLayout, layout_invoice};
pub use printpdf_renderer::PrintPdfRenderer;
