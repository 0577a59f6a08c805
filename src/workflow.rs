use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::align::{AlignmentEngine, TranslationReport};
use crate::config::Config;
use crate::error::{Result, SubverseError};
use crate::media::{MediaProcessorFactory, MediaProcessorTrait};
use crate::shell::{self, Candidate, CandidateKind, Prompter};
use crate::subtitle::SubtitleDocument;
use crate::translate::{BatchTranslator, TranslatorFactory};

pub const DEFAULT_SOURCE_LANGUAGE: &str = "EN";
pub const DEFAULT_TARGET_LANGUAGE: &str = "ES";

/// Choices that can be made up front instead of interactively
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Directory scanned for candidate files
    pub work_dir: PathBuf,
    pub input: Option<PathBuf>,
    pub source_language: Option<String>,
    pub target_language: Option<String>,
    /// Answer yes to the external subtitle fallback question
    pub assume_yes: bool,
    pub show_progress: bool,
}

impl RunOptions {
    pub fn new<P: Into<PathBuf>>(work_dir: P) -> Self {
        Self {
            work_dir: work_dir.into(),
            input: None,
            source_language: None,
            target_language: None,
            assume_yes: false,
            show_progress: false,
        }
    }
}

/// What a completed run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub subtitle_path: PathBuf,
    pub output_path: PathBuf,
    pub source_language: String,
    pub target_language: String,
    pub report: TranslationReport,
}

pub struct Workflow {
    config: Config,
    translator: Box<dyn BatchTranslator>,
    media: Box<dyn MediaProcessorTrait>,
}

impl Workflow {
    /// Build the workflow with the Gemini translator and ffmpeg.
    ///
    /// The API key is resolved here so a missing credential stops the run
    /// before any file is touched.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let api_key = config.translate.resolve_api_key()?;

        let translator = TranslatorFactory::create_translator(config.translate.clone(), api_key)?;
        let media = MediaProcessorFactory::create_processor(config.media.clone());
        info!("Using model {} with batch size {}", config.translate.model, config.translate.batch_size);

        Ok(Self::with_components(config, translator, media))
    }

    pub fn with_components(
        config: Config,
        translator: Box<dyn BatchTranslator>,
        media: Box<dyn MediaProcessorTrait>,
    ) -> Self {
        Self {
            config,
            translator,
            media,
        }
    }

    /// Select a file, obtain its subtitles, ask for languages and translate
    pub async fn run<R: BufRead, W: Write>(
        &self,
        options: RunOptions,
        prompter: &mut Prompter<R, W>,
    ) -> Result<RunSummary> {
        let candidate = match &options.input {
            Some(path) => self.candidate_from_path(path)?,
            None => {
                let candidates = shell::list_candidates(&options.work_dir, &self.config.media)?;
                info!("Found {} candidate files in {}", candidates.len(), options.work_dir.display());
                prompter.select_candidate(&candidates)?
            }
        };

        let subtitle_path = self.resolve_subtitle_source(&candidate, prompter, options.assume_yes).await?;

        let file_name = subtitle_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let source_language = match options.source_language {
            Some(lang) => lang.to_uppercase(),
            None => prompter.ask_language(
                &format!("Source language of '{}' (e.g. EN, FR)", file_name),
                DEFAULT_SOURCE_LANGUAGE,
            )?,
        };
        let target_language = match options.target_language {
            Some(lang) => lang.to_uppercase(),
            None => prompter.ask_language("Target language (e.g. ES, FR)", DEFAULT_TARGET_LANGUAGE)?,
        };

        let output_path = shell::derive_output_path(&subtitle_path, &target_language, ".srt");
        prompter.say(&format!("\nTranslating: {} ({})", file_name, source_language))?;
        prompter.say(&format!(
            "      -> to: {} ({})",
            output_path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default(),
            target_language
        ))?;

        let report = self
            .translate_file(&subtitle_path, &output_path, &source_language, &target_language, options.show_progress)
            .await?;

        prompter.say(&format!("Translated subtitles saved to: {}", output_path.display()))?;

        Ok(RunSummary {
            subtitle_path,
            output_path,
            source_language,
            target_language,
            report,
        })
    }

    fn candidate_from_path(&self, path: &Path) -> Result<Candidate> {
        if !path.is_file() {
            return Err(SubverseError::FileNotFound(path.display().to_string()));
        }

        let is_video = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.config.media.video_extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)));

        Ok(Candidate {
            path: path.to_path_buf(),
            kind: if is_video { CandidateKind::Video } else { CandidateKind::Subtitle },
        })
    }

    /// Path of the SRT file to translate for the selected candidate.
    ///
    /// Videos go through extraction first; when that fails an SRT with the
    /// same name next to the video is offered instead.
    pub async fn resolve_subtitle_source<R: BufRead, W: Write>(
        &self,
        candidate: &Candidate,
        prompter: &mut Prompter<R, W>,
        assume_yes: bool,
    ) -> Result<PathBuf> {
        if candidate.kind == CandidateKind::Subtitle {
            return Ok(candidate.path.clone());
        }

        let extracted_path = shell::derive_output_path(&candidate.path, "original", ".srt");
        let extraction = match self.media.check_availability().await {
            Ok(()) => self.media.extract_subtitles(&candidate.path, &extracted_path).await,
            Err(e) => Err(e),
        };
        let extraction_error = match extraction {
            Ok(path) => return Ok(path),
            Err(e) => e,
        };

        warn!("Could not extract subtitles from {}: {}", candidate.path.display(), extraction_error);

        let external = shell::external_subtitle_for(&candidate.path);
        if !external.is_file() {
            prompter.say("No external SRT file with the same name was found.")?;
            return Err(extraction_error);
        }

        let external_name = external
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let use_external = assume_yes
            || prompter.confirm(&format!("Found external SRT file '{}'. Use it?", external_name))?;

        if use_external {
            info!("Using external subtitle file {}", external.display());
            Ok(external)
        } else {
            Err(SubverseError::Cancelled("external subtitle file declined".to_string()))
        }
    }

    /// Translate one SRT file into another, keeping all timings
    pub async fn translate_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_path: P,
        output_path: Q,
        source_language: &str,
        target_language: &str,
        show_progress: bool,
    ) -> Result<TranslationReport> {
        let mut document = SubtitleDocument::load(input_path.as_ref()).await?;

        let engine = AlignmentEngine::from_config(&self.config.translate).with_progress(show_progress);
        let report = engine
            .translate_document(&mut document, self.translator.as_ref(), source_language, target_language)
            .await;

        if report.merge_anomaly {
            warn!("Translation finished with misaligned blocks; review {}", output_path.as_ref().display());
        }

        document.save(output_path.as_ref()).await?;
        Ok(report)
    }
}
