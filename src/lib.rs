//! Subverse - Song Subtitle Translation
//!
//! Translates SRT subtitles (optionally extracted from a video with ffmpeg)
//! through a hosted LLM in deduplicated batches, keeping every timestamp.

pub mod align;
pub mod cli;
pub mod config;
pub mod error;
pub mod media;
pub mod shell;
pub mod subtitle;
pub mod translate;
pub mod workflow;
