//! # QR Codes
//!
//! Two ways to put a QR code on paper:
//!
//! - [`qr::rasterize`] renders the code with the `qrcode` crate and returns a
//!   [`Bitmap`] for `GS v 0`. Works on every printer that prints images.
//! - [`qr::native`] sends the `GS ( k` function set and lets the printer
//!   render it. Smaller on the wire, but many budget printers ignore it.
//!
//! ```
//! use blepos::protocol::barcode::qr::{self, QrErrorLevel};
//!
//! let bitmap = qr::rasterize(b"https://example.com", 4, QrErrorLevel::M, true, 384).unwrap();
//! assert_eq!(bitmap.width_dots, 384);
//!
//! let cmds = qr::native(b"https://example.com", 4, QrErrorLevel::M);
//! assert_eq!(&cmds[0..3], &[0x1D, 0x28, 0x6B]);
//! ```

use super::commands::{GS, u16_le};
use super::graphics::Bitmap;

pub mod qr {
    use qrcode::{Color, EcLevel, QrCode};
    use serde::{Deserialize, Serialize};

    use super::{Bitmap, GS, u16_le};

    /// Modules of white border around a rasterized code
    pub const QUIET_ZONE: usize = 2;

    /// QR Code error correction level
    ///
    /// | Level | Recovery |
    /// |-------|----------|
    /// | L | ~7% |
    /// | M | ~15% (default) |
    /// | Q | ~25% |
    /// | H | ~30% |
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub enum QrErrorLevel {
        L = 0,
        #[default]
        M = 1,
        Q = 2,
        H = 3,
    }

    impl From<QrErrorLevel> for EcLevel {
        fn from(level: QrErrorLevel) -> Self {
            match level {
                QrErrorLevel::L => EcLevel::L,
                QrErrorLevel::M => EcLevel::M,
                QrErrorLevel::Q => EcLevel::Q,
                QrErrorLevel::H => EcLevel::H,
            }
        }
    }

    /// Render `data` as a bitmap.
    ///
    /// Each module is `module_size` dots square. If the code would not fit in
    /// `width_dots`, the module size shrinks until it does. With `center`, the
    /// bitmap is padded to the full paper width so the code lands in the
    /// middle regardless of the printer's alignment handling.
    ///
    /// ## Errors
    ///
    /// Data too long for any QR version, or a code that does not fit even at
    /// one dot per module.
    pub fn rasterize(
        data: &[u8],
        module_size: u8,
        level: QrErrorLevel,
        center: bool,
        width_dots: u16,
    ) -> Result<Bitmap, String> {
        let code = QrCode::with_error_correction_level(data, level.into())
            .map_err(|e| format!("cannot encode QR code: {}", e))?;
        let modules = code.width() + 2 * QUIET_ZONE;

        let max_module = usize::from(width_dots) / modules;
        if max_module == 0 {
            return Err(format!(
                "QR code needs {} dots, paper is {} dots wide",
                modules, width_dots
            ));
        }
        let scale = usize::from(module_size.max(1)).min(max_module);
        let side = modules * scale;

        let (bitmap_width, offset) = if center {
            (usize::from(width_dots), (usize::from(width_dots) - side) / 2)
        } else {
            (side, 0)
        };
        // side and bitmap_width are bounded by width_dots
        let mut bitmap = Bitmap::blank(bitmap_width as u16, side as u16);

        let colors = code.to_colors();
        for (i, color) in colors.iter().enumerate() {
            if *color != Color::Dark {
                continue;
            }
            let mx = i % code.width() + QUIET_ZONE;
            let my = i / code.width() + QUIET_ZONE;
            for dy in 0..scale {
                for dx in 0..scale {
                    let x = offset + mx * scale + dx;
                    let y = my * scale + dy;
                    bitmap.set(x as u16, y as u16);
                }
            }
        }
        Ok(bitmap)
    }

    /// `GS ( k pL pH cn fn [params]` with `cn = 49` (QR Code).
    fn function(fn_code: u8, params: &[u8]) -> Vec<u8> {
        let len = (params.len() + 2).min(usize::from(u16::MAX)) as u16;
        let [pl, ph] = u16_le(len);
        let mut cmd = vec![GS, b'(', b'k', pl, ph, 49, fn_code];
        cmd.extend_from_slice(params);
        cmd
    }

    /// # Select Model (function 165): Model 2
    pub fn set_model2() -> Vec<u8> {
        function(65, &[50, 0])
    }

    /// # Set Module Size (function 167), 1-16 dots
    pub fn set_module_size(size: u8) -> Vec<u8> {
        function(67, &[size.clamp(1, 16)])
    }

    /// # Set Error Correction Level (function 169)
    pub fn set_error_correction(level: QrErrorLevel) -> Vec<u8> {
        function(69, &[48 + level as u8])
    }

    /// # Store Data (function 180)
    pub fn store(data: &[u8]) -> Vec<u8> {
        let mut params = Vec::with_capacity(data.len() + 1);
        params.push(48);
        params.extend_from_slice(data);
        function(80, &params)
    }

    /// # Print Stored Symbol (function 181)
    pub fn print() -> Vec<u8> {
        function(81, &[48])
    }

    /// Complete native QR sequence.
    pub fn native(data: &[u8], module_size: u8, level: QrErrorLevel) -> Vec<u8> {
        let mut cmd = Vec::new();
        cmd.extend(set_model2());
        cmd.extend(set_module_size(module_size));
        cmd.extend(set_error_correction(level));
        cmd.extend(store(data));
        cmd.extend(print());
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::qr::*;

    #[test]
    fn test_native_function_headers() {
        assert_eq!(
            set_model2(),
            vec![0x1D, 0x28, 0x6B, 0x04, 0x00, 0x31, 0x41, 0x32, 0x00]
        );
        assert_eq!(
            set_module_size(6),
            vec![0x1D, 0x28, 0x6B, 0x03, 0x00, 0x31, 0x43, 0x06]
        );
        assert_eq!(
            set_error_correction(QrErrorLevel::M),
            vec![0x1D, 0x28, 0x6B, 0x03, 0x00, 0x31, 0x45, 0x31]
        );
        assert_eq!(print(), vec![0x1D, 0x28, 0x6B, 0x03, 0x00, 0x31, 0x51, 0x30]);
    }

    #[test]
    fn test_store_length_includes_header() {
        let cmd = store(b"abc");
        // pL = 3 data + 3 (cn, fn, m)
        assert_eq!(cmd[3], 6);
        assert_eq!(cmd[4], 0);
        assert_eq!(&cmd[8..], b"abc");
    }

    #[test]
    fn test_rasterize_uncentered_is_square() {
        let bmp = rasterize(b"hello", 3, QrErrorLevel::M, false, 384).unwrap();
        // Version 1: 21 modules + 2 * quiet zone
        assert_eq!(bmp.width_dots, (21 + 2 * QUIET_ZONE as u16) * 3);
        assert_eq!(bmp.height, bmp.width_dots);
        // Top-left finder pattern starts after the quiet zone
        let q = QUIET_ZONE as u16 * 3;
        assert!(bmp.get(q, q));
        assert!(!bmp.get(0, 0));
    }

    #[test]
    fn test_rasterize_centered_spans_paper() {
        let bmp = rasterize(b"hello", 4, QrErrorLevel::M, true, 384).unwrap();
        assert_eq!(bmp.width_dots, 384);
        let side = (21 + 2 * QUIET_ZONE as u16) * 4;
        let offset = (384 - side) / 2;
        let q = QUIET_ZONE as u16 * 4;
        assert!(bmp.get(offset + q, q));
        assert!(!bmp.get(offset + q - 1, q));
    }

    #[test]
    fn test_rasterize_shrinks_to_fit() {
        // 25 modules at 20 dots would be 500 dots
        let bmp = rasterize(b"hello", 20, QrErrorLevel::M, false, 384).unwrap();
        assert!(bmp.width_dots <= 384);
    }

    #[test]
    fn test_rasterize_too_narrow() {
        assert!(rasterize(b"hello", 1, QrErrorLevel::M, false, 10).is_err());
    }
}
