//! # Print Jobs
//!
//! A [`PrintJob`] is an ordered list of [`Instruction`]s, built either with
//! the fluent builder or loaded from JSON. It describes *what* to print; the
//! [`crate::codec`] turns it into printer bytes.
//!
//! ```
//! use blepos::job::PrintJob;
//! use blepos::protocol::text::TextStyle;
//!
//! let job = PrintJob::new()
//!     .style(TextStyle::new().center().bold())
//!     .textln("HELLO")
//!     .qr("https://example.com", 4, true)
//!     .ln(2);
//!
//! assert_eq!(job.len(), 4);
//! ```
//!
//! ## JSON Format
//!
//! ```json
//! {
//!   "instructions": [
//!     { "type": "style", "alignment": "center", "width": 2, "height": 2 },
//!     { "type": "line", "content": "E S C   P O S" },
//!     { "type": "qr", "data": "https://example.com", "size": 6, "center": true },
//!     { "type": "feed", "lines": 2 }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::BlePosError;
use crate::protocol::barcode::qr::QrErrorLevel;
use crate::protocol::text::TextStyle;

fn default_qr_size() -> u8 {
    3
}

/// One printer instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Instruction {
    /// Replace the current text style.
    Style(TextStyle),

    /// Text without a trailing newline.
    Text { content: String },

    /// Text followed by a newline.
    Line { content: String },

    /// Print and feed blank lines.
    Feed { lines: u8 },

    /// QR code. `size` is the module size in dots.
    Qr {
        data: String,
        #[serde(default = "default_qr_size")]
        size: u8,
        #[serde(default)]
        center: bool,
        #[serde(default)]
        native: bool,
        #[serde(default)]
        error_level: QrErrorLevel,
    },

    /// Cut the paper. `partial: true` leaves a small hinge.
    Cut {
        #[serde(default)]
        partial: bool,
    },

    /// Bytes passed through untouched.
    Raw { bytes: Vec<u8> },
}

/// A structured, codec-ready print job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintJob {
    pub instructions: Vec<Instruction>,
}

impl PrintJob {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a job from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, BlePosError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn push(mut self, instruction: Instruction) -> Self {
        self.instructions.push(instruction);
        self
    }

    pub fn style(self, style: TextStyle) -> Self {
        self.push(Instruction::Style(style))
    }

    pub fn text(self, content: impl Into<String>) -> Self {
        self.push(Instruction::Text {
            content: content.into(),
        })
    }

    pub fn textln(self, content: impl Into<String>) -> Self {
        self.push(Instruction::Line {
            content: content.into(),
        })
    }

    /// Feed `lines` blank lines.
    pub fn ln(self, lines: u8) -> Self {
        self.push(Instruction::Feed { lines })
    }

    /// Rasterized QR code.
    pub fn qr(self, data: impl Into<String>, size: u8, center: bool) -> Self {
        self.push(Instruction::Qr {
            data: data.into(),
            size,
            center,
            native: false,
            error_level: QrErrorLevel::default(),
        })
    }

    /// QR code rendered by the printer itself.
    pub fn native_qr(self, data: impl Into<String>, size: u8) -> Self {
        self.push(Instruction::Qr {
            data: data.into(),
            size,
            center: false,
            native: true,
            error_level: QrErrorLevel::default(),
        })
    }

    pub fn cut(self, partial: bool) -> Self {
        self.push(Instruction::Cut { partial })
    }

    pub fn raw(self, bytes: impl Into<Vec<u8>>) -> Self {
        self.push(Instruction::Raw {
            bytes: bytes.into(),
        })
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

/// The fixed demonstration job printed when no job file is given.
///
/// Shows scaled centered text, a QR code and normal text.
pub fn demo_job() -> PrintJob {
    PrintJob::new()
        .style(TextStyle::new().center().double_width().double_height())
        .textln("E S C   P O S")
        .qr("https://github.com/python-escpos", 6, true)
        .style(TextStyle::new().center())
        .textln("Testing Bluetooth printer")
        .ln(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::text::Alignment;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_demo_job_shape() {
        let job = demo_job();
        assert_eq!(job.len(), 6);
        assert!(matches!(
            &job.instructions[2],
            Instruction::Qr { size: 6, center: true, native: false, .. }
        ));
        assert_eq!(job.instructions[5], Instruction::Feed { lines: 2 });
    }

    #[test]
    fn test_job_from_json() {
        let json = r#"{
            "instructions": [
                { "type": "style", "alignment": "center", "width": 2, "height": 2 },
                { "type": "line", "content": "HI" },
                { "type": "qr", "data": "x" },
                { "type": "cut" }
            ]
        }"#;
        let job = PrintJob::from_json(json).unwrap();

        let expected = PrintJob::new()
            .style(TextStyle::new().alignment(Alignment::Center).size(2, 2))
            .textln("HI")
            .push(Instruction::Qr {
                data: "x".into(),
                size: 3,
                center: false,
                native: false,
                error_level: QrErrorLevel::M,
            })
            .cut(false);
        assert_eq!(job, expected);
    }

    #[test]
    fn test_job_from_bad_json() {
        let err = PrintJob::from_json(r#"{"instructions":[{"type":"dance"}]}"#).unwrap_err();
        assert!(matches!(err, BlePosError::Json(_)));
    }

    #[test]
    fn test_empty_job() {
        assert!(PrintJob::new().is_empty());
    }
}
