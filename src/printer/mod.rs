//! # Printer Module
//!
//! Printer-specific configuration.
//!
//! ## Modules
//!
//! - [`config`]: Paper width and resolution profiles

pub mod config;

pub use config::PrinterProfile;
