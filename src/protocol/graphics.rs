//! # ESC/POS Raster Graphics
//!
//! Monochrome bitmaps are sent with the raster bit image command
//! (`GS v 0`). Cheap BLE printers have small receive buffers, so tall images
//! are split into bands with [`raster_bands`], each band being a complete
//! command of its own.
//!
//! ## Bit Packing
//!
//! Each byte carries 8 horizontal dots:
//! - Bit 7 (MSB) = leftmost dot
//! - 1 = black (print), 0 = white
//!
//! ```text
//! Byte value 0xF0 = 11110000 = ████░░░░
//! Byte value 0xAA = 10101010 = █░█░█░█░
//! ```

use super::commands::{GS, u16_le};

/// Rows per raster band
pub const BAND_ROWS: u16 = 128;

/// A packed 1-bit bitmap, rows of `width_bytes` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width_dots: u16,
    pub height: u16,
    pub data: Vec<u8>,
}

impl Bitmap {
    /// All-white bitmap.
    pub fn blank(width_dots: u16, height: u16) -> Self {
        let len = usize::from(width_dots.div_ceil(8)) * usize::from(height);
        Self {
            width_dots,
            height,
            data: vec![0; len],
        }
    }

    #[inline]
    pub fn width_bytes(&self) -> u16 {
        self.width_dots.div_ceil(8)
    }

    /// Turn the dot at (x, y) black. Out-of-range dots are ignored.
    pub fn set(&mut self, x: u16, y: u16) {
        if x >= self.width_dots || y >= self.height {
            return;
        }
        let idx = usize::from(y) * usize::from(self.width_bytes()) + usize::from(x / 8);
        self.data[idx] |= 0x80 >> (x % 8);
    }

    pub fn get(&self, x: u16, y: u16) -> bool {
        if x >= self.width_dots || y >= self.height {
            return false;
        }
        let idx = usize::from(y) * usize::from(self.width_bytes()) + usize::from(x / 8);
        self.data[idx] & (0x80 >> (x % 8)) != 0
    }
}

// ============================================================================
// RASTER BIT IMAGE (GS v 0)
// ============================================================================

/// # Print Raster Bit Image (GS v 0 m xL xH yL yH d1...dk)
///
/// | Format | Bytes |
/// |--------|-------|
/// | ASCII  | GS v 0 m xL xH yL yH data |
/// | Hex    | 1D 76 30 m xL xH yL yH data |
///
/// - `m = 0`: normal density
/// - `xL xH`: width in **bytes**
/// - `yL yH`: height in dots
///
/// ```
/// use blepos::protocol::graphics;
///
/// let data = vec![0xFF; 48 * 10];
/// let cmd = graphics::raster(384, 10, &data);
/// assert_eq!(&cmd[0..8], &[0x1D, 0x76, 0x30, 0x00, 48, 0, 10, 0]);
/// ```
pub fn raster(width_dots: u16, height: u16, data: &[u8]) -> Vec<u8> {
    let width_bytes = width_dots.div_ceil(8);
    debug_assert!(
        data.len() == usize::from(width_bytes) * usize::from(height),
        "Raster data length mismatch. Expected {} ({} bytes × {} rows), got {}",
        usize::from(width_bytes) * usize::from(height),
        width_bytes,
        height,
        data.len()
    );

    let [xl, xh] = u16_le(width_bytes);
    let [yl, yh] = u16_le(height);

    let mut cmd = Vec::with_capacity(8 + data.len());
    cmd.extend_from_slice(&[GS, b'v', b'0', 0, xl, xh, yl, yh]);
    cmd.extend_from_slice(data);
    cmd
}

/// Split a bitmap into raster commands of at most `band_rows` rows each.
pub fn raster_bands(bitmap: &Bitmap, band_rows: u16) -> Vec<Vec<u8>> {
    let band_rows = band_rows.max(1);
    let row_len = usize::from(bitmap.width_bytes());
    let mut bands = Vec::new();
    let mut y = 0u16;
    while y < bitmap.height {
        let rows = band_rows.min(bitmap.height - y);
        let start = usize::from(y) * row_len;
        let end = start + usize::from(rows) * row_len;
        bands.push(raster(bitmap.width_dots, rows, &bitmap.data[start..end]));
        y += rows;
    }
    bands
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raster_header() {
        let data = vec![0xFF; 72 * 100];
        let cmd = raster(576, 100, &data);
        assert_eq!(&cmd[0..4], &[0x1D, 0x76, 0x30, 0x00]);
        assert_eq!(cmd[4], 72); // xL
        assert_eq!(cmd[5], 0); // xH
        assert_eq!(cmd[6], 100); // yL
        assert_eq!(cmd[7], 0); // yH
        assert_eq!(cmd.len(), 8 + 72 * 100);
    }

    #[test]
    fn test_raster_large_height() {
        let data = vec![0x00; 48 * 500];
        let cmd = raster(384, 500, &data);
        // 500 = 0x01F4
        assert_eq!(cmd[6], 0xF4);
        assert_eq!(cmd[7], 0x01);
    }

    #[test]
    fn test_bitmap_set_get() {
        let mut bmp = Bitmap::blank(16, 2);
        bmp.set(0, 0);
        bmp.set(9, 1);
        bmp.set(99, 99); // ignored
        assert_eq!(bmp.data, vec![0x80, 0x00, 0x00, 0x40]);
        assert!(bmp.get(9, 1));
        assert!(!bmp.get(8, 1));
    }

    #[test]
    fn test_raster_bands_split() {
        let bmp = Bitmap::blank(8, 300);
        let bands = raster_bands(&bmp, 128);
        assert_eq!(bands.len(), 3);
        // Heights 128, 128, 44
        assert_eq!(bands[0][6], 128);
        assert_eq!(bands[2][6], 44);
        let total: usize = bands.iter().map(|b| b.len() - 8).sum();
        assert_eq!(total, 300);
    }

    #[test]
    fn test_raster_bands_empty_bitmap() {
        let bmp = Bitmap::blank(8, 0);
        assert!(raster_bands(&bmp, BAND_ROWS).is_empty());
    }
}
