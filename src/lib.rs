//! # blepos - Bluetooth LE Receipt Printing
//!
//! blepos finds receipt printers over Bluetooth Low Energy, works out which
//! GATT characteristic accepts print data, and sends ESC/POS jobs to it.
//! It provides:
//!
//! - **Discovery**: time-bounded scans with an optional name/address filter
//! - **Capability resolution**: list characteristics or pick a writable one
//! - **Transmission**: encode, write, finalize and disconnect in one call
//! - **Protocol implementation**: ESC/POS command builders
//!
//! ## Quick Start
//!
//! ```no_run
//! use blepos::{
//!     config::RadioConfig,
//!     discovery,
//!     job::demo_job,
//!     resolver::FirstWithCapability,
//!     transmit::transmit,
//!     BtleRadio, EscPosCodec,
//! };
//!
//! # async fn run() -> Result<(), blepos::BlePosError> {
//! let radio = BtleRadio::new(RadioConfig::default())
//!     .await
//!     .map_err(blepos::BlePosError::TransportUnavailable)?;
//!
//! let printers = discovery::scan(&radio, Some("PT-210")).await?;
//! if let Some(printer) = printers.first() {
//!     let sent = transmit(
//!         &radio,
//!         &EscPosCodec::default(),
//!         printer,
//!         None,
//!         &demo_job(),
//!         &FirstWithCapability::default(),
//!     )
//!     .await?;
//!     println!("{} bytes to handle {}", sent.bytes, sent.endpoint);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`discovery`] | Scanning and filtering |
//! | [`resolver`] | Characteristic enumeration and selection |
//! | [`transmit`] | Job delivery |
//! | [`job`] | Print job model |
//! | [`codec`] | Job to ESC/POS frames |
//! | [`protocol`] | ESC/POS command builders |
//! | [`transport`] | Radio seam, btleplug and mock stacks |
//! | [`printer`] | Paper profiles |
//! | [`config`] | Run and radio configuration |
//! | [`error`] | Error types |

pub mod codec;
pub mod config;
pub mod discovery;
pub mod error;
pub mod job;
pub mod printer;
pub mod protocol;
pub mod resolver;
pub mod transmit;
pub mod transport;

// Re-exports for convenience
pub use codec::{EscPosCodec, PrintCodec};
pub use error::BlePosError;
pub use job::PrintJob;
pub use printer::PrinterProfile;
pub use transport::{BtleRadio, MockRadio};
