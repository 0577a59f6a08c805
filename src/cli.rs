use clap::Parser;
use std::path::PathBuf;

/// Translate song subtitles with Gemini while keeping the original timing.
///
/// Anything not given on the command line is asked for interactively.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Video or SRT file to translate (skips the file selection menu)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Source language code, e.g. EN
    #[arg(short, long)]
    pub source_lang: Option<String>,

    /// Target language code, e.g. ES
    #[arg(short, long)]
    pub target_lang: Option<String>,

    /// Unique subtitle texts per request
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Maximum number of requests in flight
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Model name, e.g. gemini-2.0-flash-lite
    #[arg(short, long)]
    pub model: Option<String>,

    /// Use an external SRT file without asking when extraction fails
    #[arg(short, long)]
    pub yes: bool,

    /// Write the default configuration to this path and exit
    #[arg(long, value_name = "PATH")]
    pub init_config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_interactive() {
        let args = Args::parse_from(["subverse"]);
        assert!(args.input.is_none());
        assert!(args.source_lang.is_none());
        assert!(args.target_lang.is_none());
        assert!(!args.yes);
    }

    #[test]
    fn test_flags() {
        let args = Args::parse_from([
            "subverse", "-i", "song.srt", "-s", "en", "-t", "es", "-b", "10", "--concurrency", "2", "-y",
        ]);
        assert_eq!(args.input, Some(PathBuf::from("song.srt")));
        assert_eq!(args.source_lang.as_deref(), Some("en"));
        assert_eq!(args.target_lang.as_deref(), Some("es"));
        assert_eq!(args.batch_size, Some(10));
        assert_eq!(args.concurrency, Some(2));
        assert!(args.yes);
    }
}
