use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info, warn};

use crate::config::MediaConfig;
use crate::error::{Result, SubverseError};
use super::{CommandOutput, MediaCommandBuilder, MediaProcessorTrait};

/// ffmpeg's message when the requested subtitle stream does not exist
pub const STREAM_NOT_FOUND: &str = "Subtitle stream not found";

/// Concrete implementation of media processor (FFmpeg-based)
pub struct MediaProcessorImpl {
    command_builder: MediaCommandBuilder,
}

impl MediaProcessorImpl {
    /// Create a new media processor implementation
    pub fn new(config: MediaConfig) -> Self {
        Self {
            command_builder: MediaCommandBuilder::new(&config.binary_path),
        }
    }
}

/// Size of the file at `path`, or `None` if it does not exist
async fn file_size(path: &Path) -> Option<u64> {
    fs::metadata(path).await.ok().map(|m| m.len())
}

/// Remove a zero-byte leftover; larger files are not touched
async fn remove_if_empty(path: &Path) {
    if file_size(path).await == Some(0) {
        match fs::remove_file(path).await {
            Ok(()) => debug!("Removed empty output {}", path.display()),
            Err(e) => warn!("Failed to remove empty output {}: {}", path.display(), e),
        }
    }
}

/// Decide whether an extraction run produced a usable subtitle file
fn extraction_succeeded(output: &CommandOutput, size: Option<u64>) -> bool {
    !output.stderr.contains(STREAM_NOT_FOUND) && size.is_some_and(|s| s > 0)
}

#[async_trait]
impl MediaProcessorTrait for MediaProcessorImpl {
    async fn extract_subtitles(&self, video_path: &Path, subtitle_path: &Path) -> Result<PathBuf> {
        info!("Extracting subtitles from {} to {}", video_path.display(), subtitle_path.display());

        let command = self.command_builder.extract_subtitles(video_path, subtitle_path);
        info!("Running: {}", command.display());

        let output = match command.run().await {
            Ok(output) => output,
            Err(SubverseError::MediaToolMissing(binary)) => {
                error!("{} not found; install ffmpeg and make sure it is on PATH", binary);
                return Err(SubverseError::MediaToolMissing(binary));
            }
            Err(e) => return Err(e),
        };

        let size = file_size(subtitle_path).await;

        if !output.success {
            warn!(
                "{} exited with code {:?}: {}",
                command.description,
                output.code,
                output.stderr.trim()
            );
        }

        if !extraction_succeeded(&output, size) {
            warn!("No embedded subtitles found or they could not be extracted");
            remove_if_empty(subtitle_path).await;
            return Err(SubverseError::NoSubtitleTrack(video_path.display().to_string()));
        }

        info!("Subtitles extracted to: {}", subtitle_path.display());
        Ok(subtitle_path.to_path_buf())
    }

    /// Check if media processor is available
    async fn check_availability(&self) -> Result<()> {
        let output = self.command_builder.version_check().run().await?;

        if output.success {
            let version = output.stdout.lines().next().unwrap_or("Unknown version");
            info!("Media processor is available: {}", version);
            Ok(())
        } else {
            Err(SubverseError::Media(format!("Media processor version check failed: {}", output.stderr)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(success: bool, stderr: &str) -> CommandOutput {
        CommandOutput {
            success,
            code: Some(if success { 0 } else { 1 }),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    #[test]
    fn test_success_rule() {
        assert!(extraction_succeeded(&output(true, ""), Some(120)));
        // Non-zero exit with a usable file is still accepted
        assert!(extraction_succeeded(&output(false, "some warning"), Some(120)));
        assert!(!extraction_succeeded(&output(true, ""), Some(0)));
        assert!(!extraction_succeeded(&output(true, ""), None));
        assert!(!extraction_succeeded(
            &output(false, "Stream map '0:s:0' matches no streams.\nSubtitle stream not found"),
            Some(120)
        ));
    }

    #[tokio::test]
    async fn test_remove_if_empty() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.srt");
        let full = dir.path().join("full.srt");
        std::fs::write(&empty, "").unwrap();
        std::fs::write(&full, "1\n").unwrap();

        remove_if_empty(&empty).await;
        remove_if_empty(&full).await;

        assert!(!empty.exists());
        assert!(full.exists());
    }

    #[tokio::test]
    async fn test_missing_tool() {
        let processor = MediaProcessorImpl::new(MediaConfig {
            binary_path: "/nonexistent/ffmpeg-subverse".to_string(),
            ..MediaConfig::default()
        });
        let dir = tempfile::tempdir().unwrap();

        let result = processor
            .extract_subtitles(&dir.path().join("song.mkv"), &dir.path().join("song_original.srt"))
            .await;
        assert!(matches!(result, Err(SubverseError::MediaToolMissing(_))));
        assert!(processor.check_availability().await.is_err());
    }
}
