//! # ESC/POS Text Styling Commands
//!
//! | Style | Command | Effect |
//! |-------|---------|--------|
//! | Alignment | ESC a n | left / center / right |
//! | Bold | ESC E n | **Emphasized** text |
//! | Underline | ESC - n | 1 or 2 dot underline |
//! | Font | ESC M n | Font A (12×24) or Font B (9×17) |
//! | Size | GS ! n | 1-8x width and height |

use serde::{Deserialize, Serialize};

use super::commands::{ESC, GS};

// ============================================================================
// TEXT ALIGNMENT
// ============================================================================

/// Text alignment options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left = 0,
    Center = 1,
    Right = 2,
}

/// # Set Justification (ESC a n)
///
/// Takes effect at the start of the next line. Also applies to raster
/// images on most printers.
///
/// | Format | Bytes |
/// |--------|-------|
/// | ASCII  | ESC a n |
/// | Hex    | 1B 61 n |
///
/// ```
/// use blepos::protocol::text::{align, Alignment};
///
/// assert_eq!(align(Alignment::Center), vec![0x1B, 0x61, 0x01]);
/// ```
pub fn align(alignment: Alignment) -> Vec<u8> {
    vec![ESC, b'a', alignment as u8]
}

// ============================================================================
// FONT SELECTION
// ============================================================================

/// Available fonts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Font {
    /// Font A: 12×24 dots, 32 columns on 58mm paper
    #[default]
    A = 0,
    /// Font B: 9×17 dots, 42 columns on 58mm paper
    B = 1,
}

/// # Select Character Font (ESC M n)
pub fn font(f: Font) -> Vec<u8> {
    vec![ESC, b'M', f as u8]
}

// ============================================================================
// EMPHASIS
// ============================================================================

/// # Turn Emphasized Mode On/Off (ESC E n)
pub fn bold(enabled: bool) -> Vec<u8> {
    vec![ESC, b'E', u8::from(enabled)]
}

/// # Underline Mode (ESC - n)
///
/// - `n = 0`: off
/// - `n = 1`: 1-dot underline
/// - `n = 2`: 2-dot underline
pub fn underline(thickness: u8) -> Vec<u8> {
    vec![ESC, b'-', thickness.min(2)]
}

// ============================================================================
// CHARACTER SIZE
// ============================================================================

/// # Select Character Size (GS ! n)
///
/// `width` and `height` are multipliers from 1 to 8; values outside that
/// range are clamped.
///
/// ```text
/// n = (width - 1) << 4 | (height - 1)
/// ```
///
/// | Format | Bytes |
/// |--------|-------|
/// | ASCII  | GS ! n |
/// | Hex    | 1D 21 n |
///
/// ```
/// use blepos::protocol::text::size;
///
/// // Double width, double height
/// assert_eq!(size(2, 2), vec![0x1D, 0x21, 0x11]);
/// ```
pub fn size(width: u8, height: u8) -> Vec<u8> {
    let w = width.clamp(1, 8) - 1;
    let h = height.clamp(1, 8) - 1;
    vec![GS, b'!', (w << 4) | h]
}

/// Normal size (1x1)
#[inline]
pub fn size_normal() -> Vec<u8> {
    size(1, 1)
}

// ============================================================================
// COMBINED STYLE
// ============================================================================

/// A complete text style, applied in one go.
///
/// Every field is explicit: applying a style resets whatever the previous
/// style set, so styles never leak from one block of text into the next.
///
/// ```
/// use blepos::protocol::text::{TextStyle, Alignment};
///
/// let style = TextStyle::new()
///     .alignment(Alignment::Center)
///     .double_width()
///     .double_height();
///
/// let commands = style.to_commands();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    pub alignment: Alignment,
    pub font: Font,
    pub bold: bool,
    pub underline: u8,
    pub width: u8,
    pub height: u8,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            alignment: Alignment::Left,
            font: Font::A,
            bold: false,
            underline: 0,
            width: 1,
            height: 1,
        }
    }
}

impl TextStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alignment(mut self, a: Alignment) -> Self {
        self.alignment = a;
        self
    }

    pub fn center(self) -> Self {
        self.alignment(Alignment::Center)
    }

    pub fn font(mut self, f: Font) -> Self {
        self.font = f;
        self
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn underline(mut self) -> Self {
        self.underline = 1;
        self
    }

    pub fn double_width(mut self) -> Self {
        self.width = 2;
        self
    }

    pub fn double_height(mut self) -> Self {
        self.height = 2;
        self
    }

    /// Width and height multipliers (1-8)
    pub fn size(mut self, width: u8, height: u8) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Generate command bytes for this style
    pub fn to_commands(&self) -> Vec<u8> {
        let mut cmds = Vec::new();
        cmds.extend(align(self.alignment));
        cmds.extend(font(self.font));
        cmds.extend(bold(self.bold));
        cmds.extend(underline(self.underline));
        cmds.extend(size(self.width, self.height));
        cmds
    }
}
