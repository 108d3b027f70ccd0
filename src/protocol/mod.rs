//! # ESC/POS Protocol Implementation
//!
//! Low-level command builders for the ESC/POS command set spoken by most
//! Bluetooth LE receipt printers.
//!
//! ## Module Structure
//!
//! - [`commands`]: init, feed, cut
//! - [`text`]: alignment, emphasis, character size
//! - [`graphics`]: raster bit images
//! - [`barcode`]: QR codes (rasterized or native)
//!
//! ## Usage Example
//!
//! ```
//! use blepos::protocol::{commands, text};
//!
//! let mut data = Vec::new();
//! data.extend(commands::init());
//! data.extend(text::align(text::Alignment::Center));
//! data.extend(text::bold(true));
//! data.extend(b"RECEIPT\n");
//! data.extend(commands::feed_lines(3));
//! data.extend(commands::cut(false));
//! ```

pub mod barcode;
pub mod commands;
pub mod graphics;
pub mod text;
