use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Sender identity printed on invoices and used in invoice e-mails.
///
/// Built once at start-up from configuration and handed to the renderer and
/// the mailer; nothing in the pipeline reads branding from the environment.
/// Fields missing from configuration take their value from `Default`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BrandConfig {
  pub name: String,
  pub tagline: String,
  pub address: String,
  pub phone: String,
  pub email: String,
  pub website: String,
  /// Local image drawn in the PDF header.
  pub logo_path: Option<PathBuf>,
  /// Public image URL used in the e-mail header.
  pub logo_url: Option<String>,
}

impl BrandConfig {
  /// Multi-line sender block of the invoice payload.
  pub fn sender_block(&self) -> String {
    format!("{}\n{}", self.name, self.tagline)
  }

  pub fn logo_path(&self) -> Option<&Path> {
    self.logo_path.as_deref()
  }
}

impl Default for BrandConfig {
  fn default() -> Self {
    Self {
      name: "Total Repair Now".to_string(),
      tagline: "CRM".to_string(),
      address: "123 Main St, Austin, TX 78701".to_string(),
      phone: "+1 512-555-0000".to_string(),
      email: "info@totalrepairnow.com".to_string(),
      website: "https://totalrepairnow.com".to_string(),
      logo_path: None,
      logo_url: None,
    }
  }
}
