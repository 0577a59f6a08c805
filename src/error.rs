use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubverseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing API credential: set the {0} environment variable")]
    MissingCredential(String),

    #[error("Subtitle parse error at line {line}: {message}")]
    Subtitle { line: usize, message: String },

    #[error("Media processing error: {0}")]
    Media(String),

    #[error("Media tool not found: {0}")]
    MediaToolMissing(String),

    #[error("No subtitle track could be extracted from {0}")]
    NoSubtitleTrack(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Input error: {0}")]
    Input(String),

    #[error("Operation cancelled: {0}")]
    Cancelled(String),
}

pub type Result<T> = std::result::Result<T, SubverseError>;
