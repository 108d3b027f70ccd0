//! # Printer Profiles
//!
//! Hardware characteristics of the BLE receipt printers the codec targets.
//!
//! ## Common Printers
//!
//! | Paper | Width (dots) | Resolution | Typical devices |
//! |-------|--------------|------------|-----------------|
//! | 58mm | 384 | 203 DPI | PT-210, MTP-II, GOOJPRT |
//! | 80mm | 576 | 203 DPI | MTP-3, Rongta RPP300 |
//!
//! ## Usage
//!
//! ```
//! use blepos::printer::PrinterProfile;
//!
//! let profile = PrinterProfile::MM58;
//! println!("Print width: {} dots ({} bytes)",
//!          profile.width_dots,
//!          profile.width_bytes());
//! ```

/// # Printer Profile
///
/// Defines what the codec needs to know about the paper.
///
/// ```text
/// dots_per_mm = dpi / 25.4
///
/// For a 58mm printer:
///   dots_per_mm = 203 / 25.4 ≈ 8
///   width_mm = 384 / 8 = 48mm printable
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrinterProfile {
    /// Profile name
    pub name: &'static str,

    /// Maximum print width in dots
    pub width_dots: u16,

    /// Resolution in dots per inch
    pub dpi: u16,
}

impl PrinterProfile {
    /// 58mm paper, 48mm printable.
    pub const MM58: Self = Self {
        name: "58mm",
        width_dots: 384,
        dpi: 203,
    };

    /// 80mm paper, 72mm printable.
    pub const MM80: Self = Self {
        name: "80mm",
        width_dots: 576,
        dpi: 203,
    };

    /// A profile for an arbitrary width, at the usual 203 DPI.
    pub fn with_width(width_dots: u16) -> Self {
        Self {
            name: "custom",
            width_dots,
            dpi: 203,
        }
    }

    /// Width in bytes of one raster row (8 dots per byte)
    #[inline]
    pub fn width_bytes(&self) -> u16 {
        self.width_dots.div_ceil(8)
    }

    /// Calculate dots per millimeter
    ///
    /// ## Example
    ///
    /// ```
    /// use blepos::printer::PrinterProfile;
    ///
    /// let profile = PrinterProfile::MM58;
    /// assert!((profile.dots_per_mm() - 8.0).abs() < 0.1);
    /// ```
    #[inline]
    pub fn dots_per_mm(&self) -> f32 {
        self.dpi as f32 / 25.4
    }

    /// Calculate print width in millimeters
    #[inline]
    pub fn width_mm(&self) -> f32 {
        self.width_dots as f32 / self.dots_per_mm()
    }
}

impl Default for PrinterProfile {
    fn default() -> Self {
        Self::MM58
    }
}
