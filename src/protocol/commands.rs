//! # ESC/POS Printer Commands
//!
//! Basic control commands understood by ESC/POS receipt printers, which is
//! the command set nearly every cheap BLE thermal printer speaks.
//!
//! ## Escape Sequence Structure
//!
//! - Single byte: `LF`
//! - Two bytes: `ESC @`
//! - With parameters: `ESC d n`, `GS V m`
//!
//! ## Byte Order
//!
//! Multi-byte integers are **little-endian**: `u16` value 0x1234 is sent as
//! `[0x34, 0x12]`.

// ============================================================================
// ESCAPE SEQUENCE CONSTANTS
// ============================================================================

/// ESC (Escape) - Command prefix byte
pub const ESC: u8 = 0x1B;

/// GS (Group Separator) - Extended command prefix
///
/// Used for character size, cutter, raster graphics and 2D codes.
pub const GS: u8 = 0x1D;

/// LF (Line Feed) - Print the line buffer and advance one line
pub const LF: u8 = 0x0A;

// ============================================================================
// INITIALIZATION
// ============================================================================

/// # Initialize Printer (ESC @)
///
/// Clears the print buffer and resets every mode (alignment, emphasis,
/// character size) to its power-on value. Sent at the start of each job.
///
/// | Format | Bytes |
/// |--------|-------|
/// | ASCII  | ESC @ |
/// | Hex    | 1B 40 |
///
/// ```
/// use blepos::protocol::commands;
///
/// assert_eq!(commands::init(), vec![0x1B, 0x40]);
/// ```
#[inline]
pub fn init() -> Vec<u8> {
    vec![ESC, b'@']
}

// ============================================================================
// PAPER FEED
// ============================================================================

/// # Print and Feed n Lines (ESC d n)
///
/// Prints the line buffer, then feeds `n` lines at the current line spacing.
///
/// | Format | Bytes |
/// |--------|-------|
/// | ASCII  | ESC d n |
/// | Hex    | 1B 64 n |
#[inline]
pub fn feed_lines(n: u8) -> Vec<u8> {
    vec![ESC, b'd', n]
}

// ============================================================================
// CUTTER
// ============================================================================

/// # Cut Paper (GS V m)
///
/// - `m = 0`: full cut
/// - `m = 1`: partial cut (leaves a small hinge)
///
/// Printers without a cutter ignore the command.
///
/// | Format | Bytes |
/// |--------|-------|
/// | ASCII  | GS V m |
/// | Hex    | 1D 56 m |
#[inline]
pub fn cut(partial: bool) -> Vec<u8> {
    vec![GS, b'V', u8::from(partial)]
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Encode a u16 value as little-endian bytes [low, high]
///
/// ```
/// use blepos::protocol::commands::u16_le;
///
/// assert_eq!(u16_le(0x1234), [0x34, 0x12]);
/// assert_eq!(u16_le(384), [0x80, 0x01]);
/// ```
#[inline]
pub const fn u16_le(value: u16) -> [u8; 2] {
    [value as u8, (value >> 8) as u8]
}
