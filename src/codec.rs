//! # Print Codec
//!
//! Turns a [`PrintJob`] into the frames written to the printer.
//!
//! ```text
//! ┌──────────┐     ┌───────────┐     ┌────────────┐     ┌──────────────┐
//! │ PrintJob │ ──► │ PrintCodec│ ──► │ EncodedJob │ ──► │ Link::write  │
//! │ (struct) │     │ (encode)  │     │  (frames)  │     │ (one / frame)│
//! └──────────┘     └───────────┘     └────────────┘     └──────────────┘
//! ```
//!
//! The codec owns framing: each frame becomes one [`crate::transport::Link::write`]
//! call, and the link splits frames further to its payload limit.

use crate::error::BlePosError;
use crate::job::{Instruction, PrintJob};
use crate::printer::PrinterProfile;
use crate::protocol::barcode::qr;
use crate::protocol::commands::{self, LF};
use crate::protocol::graphics::{self, BAND_ROWS};
use crate::protocol::text::{self, Alignment};

/// A job encoded into transport frames.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedJob {
    pub frames: Vec<Vec<u8>>,
}

impl EncodedJob {
    /// Total payload size.
    pub fn len(&self) -> usize {
        self.frames.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.iter().all(Vec::is_empty)
    }

    /// All frames concatenated.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.frames.concat()
    }
}

/// Printer command language encoder.
pub trait PrintCodec: Send + Sync {
    fn encode(&self, job: &PrintJob) -> Result<EncodedJob, BlePosError>;

    /// Bytes written during finalize, right before the flush. Empty by
    /// default.
    fn trailer(&self) -> Vec<u8> {
        Vec::new()
    }
}

/// ESC/POS encoder.
#[derive(Debug, Clone, Default)]
pub struct EscPosCodec {
    profile: PrinterProfile,
    cut_on_close: bool,
}

impl EscPosCodec {
    pub fn new(profile: PrinterProfile) -> Self {
        Self {
            profile,
            cut_on_close: false,
        }
    }

    /// Feed past the cutter and cut as part of finalize.
    pub fn cut_on_close(mut self, enabled: bool) -> Self {
        self.cut_on_close = enabled;
        self
    }

    pub fn profile(&self) -> &PrinterProfile {
        &self.profile
    }

    /// `alignment` is the one in effect, restored after a centered native
    /// code.
    fn encode_qr(
        &self,
        data: &str,
        size: u8,
        center: bool,
        native: bool,
        level: qr::QrErrorLevel,
        alignment: Alignment,
    ) -> Result<Vec<Vec<u8>>, BlePosError> {
        if native {
            let mut bytes = Vec::new();
            if center {
                bytes.extend(text::align(Alignment::Center));
            }
            bytes.extend(qr::native(data.as_bytes(), size, level));
            if center {
                bytes.extend(text::align(alignment));
            }
            return Ok(vec![bytes]);
        }
        let bitmap = qr::rasterize(data.as_bytes(), size, level, center, self.profile.width_dots)
            .map_err(BlePosError::InvalidJob)?;
        let mut frames = graphics::raster_bands(&bitmap, BAND_ROWS);
        // Images leave the print position mid-line on some printers
        frames.push(vec![LF]);
        Ok(frames)
    }
}

impl PrintCodec for EscPosCodec {
    fn encode(&self, job: &PrintJob) -> Result<EncodedJob, BlePosError> {
        let mut frames = vec![commands::init()];
        // init resets alignment to left
        let mut alignment = Alignment::Left;

        for instruction in &job.instructions {
            match instruction {
                Instruction::Style(style) => {
                    alignment = style.alignment;
                    frames.push(style.to_commands());
                }
                Instruction::Text { content } => frames.push(encode_text(content)),
                Instruction::Line { content } => {
                    let mut bytes = encode_text(content);
                    bytes.push(LF);
                    frames.push(bytes);
                }
                Instruction::Feed { lines } => frames.push(commands::feed_lines(*lines)),
                Instruction::Qr {
                    data,
                    size,
                    center,
                    native,
                    error_level,
                } => frames.extend(self.encode_qr(
                    data,
                    *size,
                    *center,
                    *native,
                    *error_level,
                    alignment,
                )?),
                Instruction::Cut { partial } => {
                    let mut bytes = commands::feed_lines(4);
                    bytes.extend(commands::cut(*partial));
                    frames.push(bytes);
                }
                Instruction::Raw { bytes } => frames.push(bytes.clone()),
            }
        }

        frames.retain(|f| !f.is_empty());
        Ok(EncodedJob { frames })
    }

    fn trailer(&self) -> Vec<u8> {
        if self.cut_on_close {
            let mut bytes = commands::feed_lines(4);
            bytes.extend(commands::cut(false));
            bytes
        } else {
            Vec::new()
        }
    }
}

/// Printers without a configured code page only print ASCII reliably.
fn encode_text(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::demo_job;
    use crate::protocol::text::TextStyle;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_every_job_starts_with_init() {
        let encoded = EscPosCodec::default().encode(&PrintJob::new()).unwrap();
        assert_eq!(encoded.frames, vec![vec![0x1B, 0x40]]);
    }

    #[test]
    fn test_text_line_frame() {
        let job = PrintJob::new().textln("Hi").text("x");
        let encoded = EscPosCodec::default().encode(&job).unwrap();
        assert_eq!(encoded.frames[1], b"Hi\n".to_vec());
        assert_eq!(encoded.frames[2], b"x".to_vec());
    }

    #[test]
    fn test_non_ascii_is_replaced() {
        assert_eq!(encode_text("café"), b"caf?".to_vec());
    }

    #[test]
    fn test_demo_job_encodes() {
        let encoded = EscPosCodec::new(PrinterProfile::MM58)
            .encode(&demo_job())
            .unwrap();
        let bytes = encoded.to_bytes();

        // Double width + height before the title
        assert!(bytes.windows(3).any(|w| w == [0x1D, 0x21, 0x11]));
        assert!(bytes.windows(13).any(|w| w == b"E S C   P O S"));
        // Raster image for the QR code
        assert!(bytes.windows(3).any(|w| w == [0x1D, 0x76, 0x30]));
        // Ends with two line feeds
        assert!(bytes.ends_with(&[0x1B, 0x64, 0x02]));
        assert_eq!(encoded.len(), bytes.len());
    }

    #[test]
    fn test_qr_raster_is_split_into_bands() {
        // Version 1 at 6 dots/module: (21 + 4) * 6 = 150 rows -> 2 bands
        let job = PrintJob::new().qr("hello", 6, true);
        let encoded = EscPosCodec::new(PrinterProfile::MM58).encode(&job).unwrap();
        let rasters = encoded
            .frames
            .iter()
            .filter(|f| f.starts_with(&[0x1D, 0x76, 0x30]))
            .count();
        assert_eq!(rasters, 2);
    }

    #[test]
    fn test_native_qr_is_one_frame() {
        let job = PrintJob::new().native_qr("hello", 4);
        let encoded = EscPosCodec::default().encode(&job).unwrap();
        assert_eq!(encoded.frames.len(), 2);
        assert!(encoded.frames[1].starts_with(&[0x1D, 0x28, 0x6B]));
    }

    #[test]
    fn test_centered_native_qr_restores_alignment() {
        let job = PrintJob::new()
            .style(TextStyle::new().alignment(Alignment::Right))
            .push(Instruction::Qr {
                data: "hello".into(),
                size: 4,
                center: true,
                native: true,
                error_level: qr::QrErrorLevel::M,
            });
        let encoded = EscPosCodec::default().encode(&job).unwrap();
        let frame = &encoded.frames[2];

        assert!(frame.starts_with(&[0x1B, 0x61, 0x01, 0x1D, 0x28, 0x6B]));
        assert!(frame.ends_with(&[0x1B, 0x61, 0x02]));
    }

    #[test]
    fn test_uncentered_native_qr_leaves_alignment() {
        let encoded = EscPosCodec::default()
            .encode(&PrintJob::new().native_qr("hello", 4))
            .unwrap();
        assert!(!encoded.frames[1].windows(2).any(|w| w == [0x1B, 0x61]));
    }

    #[test]
    fn test_qr_too_wide_is_invalid_job() {
        let codec = EscPosCodec::new(PrinterProfile::with_width(16));
        let err = codec.encode(&PrintJob::new().qr("hello", 1, false)).unwrap_err();
        assert!(matches!(err, BlePosError::InvalidJob(_)));
    }

    #[test]
    fn test_trailer() {
        assert!(EscPosCodec::default().trailer().is_empty());
        let trailer = EscPosCodec::default().cut_on_close(true).trailer();
        assert!(trailer.ends_with(&[0x1D, 0x56, 0x00]));
    }

    #[test]
    fn test_style_frame() {
        let job = PrintJob::new().style(TextStyle::new().bold());
        let encoded = EscPosCodec::default().encode(&job).unwrap();
        assert!(encoded.frames[1].windows(3).any(|w| w == [0x1B, 0x45, 0x01]));
    }
}
