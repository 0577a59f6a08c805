//! Interactive file and language selection

use std::fmt;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::MediaConfig;
use crate::error::{Result, SubverseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    Video,
    Subtitle,
}

impl fmt::Display for CandidateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video => write!(f, "[VIDEO]"),
            Self::Subtitle => write!(f, "[SRT]  "),
        }
    }
}

/// A file offered for selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    pub kind: CandidateKind,
}

impl Candidate {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

/// Video files then subtitle files directly inside `dir`, each group sorted by name
pub fn list_candidates<P: AsRef<Path>>(dir: P, config: &MediaConfig) -> Result<Vec<Candidate>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(SubverseError::FileNotFound(dir.display().to_string()));
    }

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect();
    files.sort();

    let videos = files
        .iter()
        .filter(|p| has_extension(p, &config.video_extensions))
        .map(|p| Candidate { path: p.clone(), kind: CandidateKind::Video });
    let subtitles = files
        .iter()
        .filter(|p| has_extension(p, &config.subtitle_extensions))
        .map(|p| Candidate { path: p.clone(), kind: CandidateKind::Subtitle });

    Ok(videos.chain(subtitles).collect())
}

/// `<dir>/<stem>_<suffix><ext>` with the suffix lowercased
pub fn derive_output_path<P: AsRef<Path>>(input: P, suffix: &str, ext: &str) -> PathBuf {
    let input = input.as_ref();
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = format!("{}_{}{}", stem, suffix.to_lowercase(), ext);

    match input.parent() {
        Some(parent) => parent.join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// Subtitle file shipped next to a video under the same name
pub fn external_subtitle_for<P: AsRef<Path>>(video: P) -> PathBuf {
    video.as_ref().with_extension("srt")
}

/// Line-oriented prompts over any reader/writer pair
pub struct Prompter<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.writer, "{}", question)?;
        self.writer.flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(SubverseError::Input("input closed".to_string()));
        }
        Ok(line.trim().to_string())
    }

    pub fn say(&mut self, message: &str) -> Result<()> {
        writeln!(self.writer, "{}", message)?;
        Ok(())
    }

    /// Print the numbered list and read a choice until it is valid
    pub fn select_candidate(&mut self, candidates: &[Candidate]) -> Result<Candidate> {
        if candidates.is_empty() {
            return Err(SubverseError::Input("no compatible video or subtitle files found".to_string()));
        }

        writeln!(self.writer, "\nAvailable files in the current directory:")?;
        for (idx, candidate) in candidates.iter().enumerate() {
            writeln!(self.writer, "{}. {} {}", idx + 1, candidate.kind, candidate.file_name())?;
        }

        loop {
            let answer = self.ask("Select the number of the file to translate: ")?;
            match answer.parse::<usize>() {
                Ok(n) if (1..=candidates.len()).contains(&n) => return Ok(candidates[n - 1].clone()),
                Ok(_) => writeln!(self.writer, "Selection out of range.")?,
                Err(_) => writeln!(self.writer, "Invalid input. Please enter a number.")?,
            }
        }
    }

    /// Ask for a language code; blank input takes the default. Codes are upper-cased.
    pub fn ask_language(&mut self, question: &str, default: &str) -> Result<String> {
        let answer = self.ask(&format!("{} [{}]: ", question, default))?;
        if answer.is_empty() {
            Ok(default.to_uppercase())
        } else {
            Ok(answer.to_uppercase())
        }
    }

    /// Yes/no question, defaulting to no
    pub fn confirm(&mut self, question: &str) -> Result<bool> {
        let answer = self.ask(&format!("{} (y/N): ", question))?;
        Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes" | "s" | "si" | "sí"))
    }
}
