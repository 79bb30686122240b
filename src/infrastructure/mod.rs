pub mod config;
pub mod email;
pub mod metrics;
pub mod pdf;
pub mod persistence;
