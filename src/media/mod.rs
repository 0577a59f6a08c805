// Subtitle extraction from video containers
//
// - Commands: command builders around the external media tool
// - Processor: ffmpeg-backed implementation of the extraction rules

pub mod commands;
pub mod processor;

use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub use commands::*;
pub use processor::*;

use crate::config::MediaConfig;
use crate::error::Result;

/// Main trait for media processing operations
#[async_trait]
pub trait MediaProcessorTrait: Send + Sync {
    /// Copy the first embedded subtitle track of `video_path` to `subtitle_path`.
    ///
    /// Fails with `MediaToolMissing` when the tool cannot be run and with
    /// `NoSubtitleTrack` when it ran but produced nothing usable. No
    /// zero-byte output is left behind on failure.
    async fn extract_subtitles(&self, video_path: &Path, subtitle_path: &Path) -> Result<PathBuf>;

    /// Check if media processor is available
    async fn check_availability(&self) -> Result<()>;
}

/// Factory for creating media processor instances
pub struct MediaProcessorFactory;

impl MediaProcessorFactory {
    /// Create the default media processor implementation (FFmpeg-based)
    pub fn create_processor(config: MediaConfig) -> Box<dyn MediaProcessorTrait> {
        Box::new(processor::MediaProcessorImpl::new(config))
    }
}
