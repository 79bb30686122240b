//! Application layer
//!
//! Use cases that orchestrate the invoice domain service for the HTTP
//! adapter and record pipeline metrics.

pub mod invoice;
