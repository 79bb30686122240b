//! Invoice drafting, persistence, PDF rendering and e-mail delivery for the
//! CRM backend.

pub mod adapters;
pub mod application;
pub mod domain;
pub mod infrastructure;
