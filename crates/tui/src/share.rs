//! The share pipeline.
//!
//! Runs off the UI task: writes the plain and ANSI renditions of a card
//! into the export directory, pushes the plain text to the terminal
//! clipboard via OSC 52, and optionally hands the file to a configured
//! external command. The caller keeps editing suspended until the outcome
//! comes back.

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use kurspad_core::export::{Artifact, ExportError};
use tokio::{fs, io::AsyncWriteExt, process::Command};
use tracing::{debug, info};

/// One share job.
pub struct ShareRequest {
    /// The rendered capture.
    pub artifact: Artifact,
    /// Directory the files land in.
    pub export_dir: PathBuf,
    /// Optional external command; the text file path is appended to it.
    pub share_command: Option<String>,
}

/// What a completed share did.
pub struct ShareOutcome {
    /// Path of the plain-text file.
    pub text_path: PathBuf,
    /// Whether the external command ran.
    pub shared: bool,
}

impl ShareOutcome {
    /// Status-line text for the outcome.
    pub fn message(&self) -> String {
        if self.shared {
            format!("Copied to clipboard! Sent {}", self.text_path.display())
        } else {
            "Copied to clipboard!".to_string()
        }
    }
}

/// Run one share job to completion.
pub async fn run(request: ShareRequest) -> Result<ShareOutcome, ExportError> {
    fs::create_dir_all(&request.export_dir)
        .await
        .map_err(|source| ExportError::Directory {
            path: request.export_dir.clone(),
            source,
        })?;

    let text_path = request.export_dir.join(format!("{}.txt", request.artifact.stem));
    write_file(&text_path, &request.artifact.plain).await?;
    let ansi_path = request.export_dir.join(format!("{}.ans", request.artifact.stem));
    write_file(&ansi_path, &request.artifact.ansi).await?;
    debug!(path = %text_path.display(), "artifact written");

    copy_to_clipboard(&request.artifact.plain).await?;

    let mut shared = false;
    if let Some(command) = request.share_command.as_deref() {
        run_share_command(command, &text_path).await?;
        shared = true;
    }

    info!(path = %text_path.display(), shared, "share complete");
    Ok(ShareOutcome { text_path, shared })
}

async fn write_file(path: &Path, content: &str) -> Result<(), ExportError> {
    fs::write(path, content.as_bytes())
        .await
        .map_err(|source| ExportError::Write {
            path: path.to_path_buf(),
            source,
        })
}

/// OSC 52 clipboard write. The sequence is consumed by the terminal and
/// never reaches the visible screen.
async fn copy_to_clipboard(text: &str) -> Result<(), ExportError> {
    let encoded = STANDARD.encode(text.as_bytes());
    let sequence = format!("\x1b]52;c;{encoded}\x07");
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(sequence.as_bytes())
        .await
        .map_err(|source| ExportError::Clipboard { source })?;
    stdout
        .flush()
        .await
        .map_err(|source| ExportError::Clipboard { source })
}

async fn run_share_command(command: &str, path: &Path) -> Result<(), ExportError> {
    let mut parts = command.split_whitespace();
    let Some(program) = parts.next() else {
        return Ok(());
    };
    let status = Command::new(program)
        .args(parts)
        .arg(path)
        .status()
        .await
        .map_err(|source| ExportError::ShareSpawn {
            command: command.to_string(),
            source,
        })?;
    if !status.success() {
        return Err(ExportError::ShareCommand {
            command: command.to_string(),
            status: status.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    fn artifact() -> Artifact {
        Artifact {
            stem: "moneychanger_test".to_string(),
            plain: "CARD\n".to_string(),
            ansi: "\x1b[48;5;230;30mCARD\x1b[0m\n".to_string(),
        }
    }

    #[tokio::test]
    async fn writes_both_renditions() -> Result<()> {
        let dir = tempdir()?;
        let outcome = run(ShareRequest {
            artifact: artifact(),
            export_dir: dir.path().to_path_buf(),
            share_command: None,
        })
        .await?;

        assert_eq!(outcome.text_path, dir.path().join("moneychanger_test.txt"));
        assert!(!outcome.shared);
        assert_eq!(std::fs::read_to_string(&outcome.text_path)?, "CARD\n");
        let ansi = std::fs::read_to_string(dir.path().join("moneychanger_test.ans"))?;
        assert!(ansi.contains("48;5;230"));
        Ok(())
    }

    #[tokio::test]
    async fn creates_missing_export_directory() -> Result<()> {
        let dir = tempdir()?;
        let nested = dir.path().join("exports").join("today");
        let outcome = run(ShareRequest {
            artifact: artifact(),
            export_dir: nested.clone(),
            share_command: None,
        })
        .await?;
        assert!(outcome.text_path.starts_with(&nested));
        Ok(())
    }

    #[tokio::test]
    async fn successful_share_command_is_reported() -> Result<()> {
        let dir = tempdir()?;
        let outcome = run(ShareRequest {
            artifact: artifact(),
            export_dir: dir.path().to_path_buf(),
            share_command: Some("true".to_string()),
        })
        .await?;
        assert!(outcome.shared);
        assert!(outcome.message().starts_with("Copied to clipboard!"));
        Ok(())
    }

    #[tokio::test]
    async fn failing_share_command_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        let result = run(ShareRequest {
            artifact: artifact(),
            export_dir: dir.path().to_path_buf(),
            share_command: Some("false".to_string()),
        })
        .await;
        assert!(matches!(result, Err(ExportError::ShareCommand { .. })));
        Ok(())
    }
}
