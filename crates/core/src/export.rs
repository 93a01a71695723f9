//! Export artifacts: the shareable rendition of a card.
//!
//! An [`Artifact`] carries the same card twice, as plain text and as an
//! ANSI-colored block with the background filled in, plus the file stem the
//! share sink should use. Rendering is total; everything that can actually
//! fail (filesystem, clipboard, external command) reports an
//! [`ExportError`] from the share side.

use std::io;
use std::path::PathBuf;

use chrono::Local;
use thiserror::Error;

use crate::card::{self, CARD_WIDTH};
use crate::document::{CalculatorNote, ReceiptData, TransactionType};

/// File stem prefix for every shared artifact.
pub const ARTIFACT_STEM: &str = "moneychanger";

/// Background painted behind the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Background {
    /// Pale yellow paper used for sell receipts.
    SellPaper,
    /// Pale blue paper used for buy receipts.
    BuyPaper,
    /// Near-black slate used for calculator notes.
    Slate,
}

impl Background {
    fn sgr(self) -> &'static str {
        match self {
            // background;foreground pairs
            Background::SellPaper => "48;5;230;30",
            Background::BuyPaper => "48;5;153;30",
            Background::Slate => "48;5;234;97",
        }
    }
}

/// Capture options: background and the width multiplier.
#[derive(Debug, Clone, Copy)]
pub struct ExportOptions {
    /// Background fill for the artifact.
    pub background: Background,
    /// Card width multiplier; the capture is `CARD_WIDTH * scale` columns.
    pub scale: u16,
}

impl ExportOptions {
    /// Options for a receipt capture, paper color following the
    /// transaction type.
    pub fn receipt(kind: TransactionType) -> Self {
        Self {
            background: match kind {
                TransactionType::Sell => Background::SellPaper,
                TransactionType::Buy => Background::BuyPaper,
            },
            scale: 1,
        }
    }

    /// Options for a calculator capture.
    pub fn calculator() -> Self {
        Self {
            background: Background::Slate,
            scale: 1,
        }
    }

    fn width(self) -> usize {
        CARD_WIDTH * usize::from(self.scale.max(1))
    }
}

/// A rendered, shareable capture.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Timestamped file stem, extension left to the sink.
    pub stem: String,
    /// The card as plain text.
    pub plain: String,
    /// The card with ANSI background fill.
    pub ansi: String,
}

/// Everything the share pipeline can fail with.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The export directory could not be created.
    #[error("could not create export directory {path}: {source}")]
    Directory {
        /// Directory that failed to materialize.
        path: PathBuf,
        /// Underlying filesystem error.
        source: io::Error,
    },
    /// An artifact file could not be written.
    #[error("could not write {path}: {source}")]
    Write {
        /// File that failed to write.
        path: PathBuf,
        /// Underlying filesystem error.
        source: io::Error,
    },
    /// The configured share command could not be spawned.
    #[error("share command {command:?} could not run: {source}")]
    ShareSpawn {
        /// The configured command line.
        command: String,
        /// Underlying spawn error.
        source: io::Error,
    },
    /// The configured share command ran and reported failure.
    #[error("share command {command:?} exited with {status}")]
    ShareCommand {
        /// The configured command line.
        command: String,
        /// Exit status text.
        status: String,
    },
    /// The clipboard escape sequence could not be flushed to the terminal.
    #[error("clipboard write failed: {source}")]
    Clipboard {
        /// Underlying terminal write error.
        source: io::Error,
    },
}

/// Render the receipt into an artifact.
pub fn render_receipt(data: &ReceiptData, options: ExportOptions) -> Artifact {
    assemble(card::receipt_card(data, options.width()), options)
}

/// Render the calculator note into an artifact.
pub fn render_calculator(note: &CalculatorNote, options: ExportOptions) -> Artifact {
    assemble(card::calculator_card(note, options.width()), options)
}

fn assemble(lines: Vec<String>, options: ExportOptions) -> Artifact {
    let sgr = options.background.sgr();
    let mut plain = String::new();
    let mut ansi = String::new();
    for line in &lines {
        plain.push_str(line);
        plain.push('\n');
        ansi.push_str(&format!("\x1b[{sgr}m{line}\x1b[0m\n"));
    }
    Artifact {
        stem: format!("{ARTIFACT_STEM}_{}", Local::now().format("%Y%m%d%H%M%S")),
        plain,
        ansi,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::CompanyProfile;

    #[test]
    fn artifact_stem_is_timestamped() {
        let data = ReceiptData::new(CompanyProfile::default());
        let artifact = render_receipt(&data, ExportOptions::receipt(data.kind));
        assert!(artifact.stem.starts_with("moneychanger_"));
        assert_eq!(artifact.stem.len(), ARTIFACT_STEM.len() + 1 + 14);
    }

    #[test]
    fn ansi_wraps_every_plain_line() {
        let data = ReceiptData::new(CompanyProfile::default());
        let artifact = render_receipt(&data, ExportOptions::receipt(data.kind));
        let plain_lines = artifact.plain.lines().count();
        assert_eq!(artifact.ansi.matches("\x1b[0m").count(), plain_lines);
        assert!(artifact.ansi.contains("48;5;230"));
    }

    #[test]
    fn backgrounds_follow_kind_and_mode() {
        assert_eq!(
            ExportOptions::receipt(TransactionType::Buy).background,
            Background::BuyPaper
        );
        assert_eq!(
            ExportOptions::calculator().background,
            Background::Slate
        );
    }

    #[test]
    fn scale_widens_the_capture() {
        let note = CalculatorNote::new();
        let narrow = render_calculator(
            &note,
            ExportOptions {
                background: Background::Slate,
                scale: 1,
            },
        );
        let wide = render_calculator(
            &note,
            ExportOptions {
                background: Background::Slate,
                scale: 2,
            },
        );
        let narrow_width = narrow.plain.lines().next().unwrap().chars().count();
        let wide_width = wide.plain.lines().next().unwrap().chars().count();
        assert_eq!(narrow_width, CARD_WIDTH);
        assert_eq!(wide_width, CARD_WIDTH * 2);
    }
}
