//! Batch alignment engine
//!
//! Translates a subtitle document in four steps: collect the unique texts,
//! translate them in fixed-size batches, merge the results into a
//! text-to-translation map, and apply the map to every event. Misaligned
//! replies are reconciled per batch so a bad answer only costs the
//! translation of that batch, never the run.

use std::collections::{HashMap, HashSet};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};

use crate::config::TranslateConfig;
use crate::subtitle::SubtitleDocument;
use crate::translate::BatchTranslator;

/// Texts that are never sent for translation
pub const PLACEHOLDERS: [&str; 2] = ["♪ ♪", "♪"];

/// Two-character stand-in for a line break inside a prompt block
pub const ESCAPED_BREAK: &str = "\\n";

pub fn escape_breaks(text: &str) -> String {
    text.replace('\n', ESCAPED_BREAK)
}

pub fn unescape_breaks(text: &str) -> String {
    text.replace(ESCAPED_BREAK, "\n")
}

/// Whether a trimmed subtitle text should be translated at all
pub fn is_translatable(text: &str) -> bool {
    !text.is_empty() && !PLACEHOLDERS.contains(&text)
}

/// Unique translatable texts in order of first appearance
pub fn collect_unique(doc: &SubtitleDocument) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();

    for event in &doc.events {
        let plaintext = event.plaintext();
        let text = plaintext.trim();
        if is_translatable(text) && seen.insert(text.to_string()) {
            unique.push(text.to_string());
        }
    }

    unique
}

/// Restore positional alignment between a batch and its reply.
///
/// When the counts differ the result is rebuilt slot by slot: a returned
/// entry is kept if it is non-blank, otherwise the escaped original takes
/// its place. The result always has exactly `originals.len()` entries.
///
/// This assumes the model kept block order even when it merged or split
/// blocks, which is not guaranteed.
pub fn reconcile(originals: &[String], returned: Vec<String>) -> Vec<String> {
    if returned.len() == originals.len() {
        return returned;
    }

    originals
        .iter()
        .enumerate()
        .map(|(k, original)| match returned.get(k) {
            Some(entry) if !entry.trim().is_empty() => entry.clone(),
            _ => original.clone(),
        })
        .collect()
}

/// Mapping from unique subtitle text to its translation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationMap {
    entries: HashMap<String, String>,
}

impl TranslationMap {
    pub fn get(&self, text: &str) -> Option<&str> {
        self.entries.get(text).map(|s| s.as_str())
    }

    pub fn insert(&mut self, text: String, translation: String) {
        self.entries.insert(text, translation);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Result of merging processed translations into the map
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub map: TranslationMap,
    /// Counts disagreed and a best-effort positional mapping was used
    pub anomaly: bool,
}

/// Zip unique texts with their processed translations.
///
/// Blank translations keep the original text. A count mismatch cannot come
/// out of [`reconcile`]; if it happens anyway it is reported loudly and the
/// texts without a translation keep their original.
pub fn merge(unique: &[String], processed: &[String]) -> MergeOutcome {
    let mut map = TranslationMap::default();
    let anomaly = unique.len() != processed.len();

    if anomaly {
        error!(
            "Translated block count ({}) does not match unique text count ({}); translations may be misaligned",
            processed.len(),
            unique.len()
        );
    }

    for (idx, original) in unique.iter().enumerate() {
        match processed.get(idx) {
            Some(translated) if !translated.is_empty() => {
                map.insert(original.clone(), translated.clone());
            }
            Some(_) => {
                warn!("Empty translation received for '{}', keeping the original", escape_breaks(original));
                map.insert(original.clone(), original.clone());
            }
            None => {
                map.insert(original.clone(), original.clone());
            }
        }
    }

    MergeOutcome { map, anomaly }
}

/// Replace event texts using the map; returns the number of events updated
pub fn apply(doc: &mut SubtitleDocument, map: &TranslationMap) -> usize {
    let mut applied = 0;

    for event in &mut doc.events {
        let plaintext = event.plaintext();
        if let Some(translation) = map.get(plaintext.trim()) {
            if !translation.is_empty() {
                event.text = translation.to_string();
                applied += 1;
            }
        }
    }

    applied
}

/// Statistics of one document translation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationReport {
    pub events: usize,
    pub unique_texts: usize,
    pub batches: usize,
    /// Batches whose reply count differed from the request
    pub reconciled_batches: usize,
    /// Batches where the provider gave no usable reply at all
    pub failed_batches: usize,
    pub applied: usize,
    pub merge_anomaly: bool,
}

struct BatchResult {
    translations: Vec<String>,
    reconciled: bool,
    failed: bool,
}

/// Drives the translator over a document batch by batch
pub struct AlignmentEngine {
    batch_size: usize,
    concurrency: usize,
    show_progress: bool,
}

impl AlignmentEngine {
    pub fn new(batch_size: usize, concurrency: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            concurrency: concurrency.max(1),
            show_progress: false,
        }
    }

    pub fn from_config(config: &TranslateConfig) -> Self {
        Self::new(config.batch_size, config.concurrency)
    }

    /// Draw a progress bar while batches are in flight
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Translate every event of `doc` in place
    pub async fn translate_document(
        &self,
        doc: &mut SubtitleDocument,
        translator: &dyn BatchTranslator,
        source_language: &str,
        target_language: &str,
    ) -> TranslationReport {
        let unique = collect_unique(doc);
        let total_batches = unique.len().div_ceil(self.batch_size);
        info!("Found {} unique text blocks to translate in {} batches", unique.len(), total_batches);

        let progress = self.progress_bar(total_batches as u64);

        // Batches are owned so the stream future does not borrow per-item data.
        // buffered() yields in submission order, so results stay positional.
        let batches: Vec<Vec<String>> = unique.chunks(self.batch_size).map(<[String]>::to_vec).collect();
        let results: Vec<BatchResult> = stream::iter(batches.into_iter().enumerate())
            .map(move |(idx, batch)| {
                self.translate_chunk(translator, idx + 1, total_batches, batch, source_language, target_language)
            })
            .buffered(self.concurrency)
            .inspect(|_| progress.inc(1))
            .collect()
            .await;

        progress.finish_and_clear();

        let mut report = TranslationReport {
            events: doc.len(),
            unique_texts: unique.len(),
            batches: total_batches,
            ..Default::default()
        };

        let mut processed = Vec::with_capacity(unique.len());
        for result in results {
            report.reconciled_batches += result.reconciled as usize;
            report.failed_batches += result.failed as usize;
            processed.extend(result.translations);
        }

        let outcome = merge(&unique, &processed);
        report.merge_anomaly = outcome.anomaly;
        report.applied = apply(doc, &outcome.map);

        info!(
            "Applied translations to {}/{} events ({} batches reconciled, {} failed)",
            report.applied, report.events, report.reconciled_batches, report.failed_batches
        );
        report
    }

    async fn translate_chunk(
        &self,
        translator: &dyn BatchTranslator,
        number: usize,
        total: usize,
        originals: Vec<String>,
        source_language: &str,
        target_language: &str,
    ) -> BatchResult {
        let escaped: Vec<String> = originals.iter().map(|text| escape_breaks(text)).collect();
        info!("Translating batch {}/{} ({} blocks)...", number, total, escaped.len());

        let reply = translator.translate_batch(&escaped, source_language, target_language).await;
        let failed = !reply.is_success();
        let returned = reply.into_blocks();

        let reconciled = returned.len() != escaped.len();
        if reconciled {
            warn!(
                "Batch {}/{}: expected {} translations, received {}; keeping originals for missing blocks",
                number,
                total,
                escaped.len(),
                returned.len()
            );
        }

        let translations = reconcile(&escaped, returned)
            .iter()
            .map(|entry| unescape_breaks(entry).trim().to_string())
            .collect();

        BatchResult {
            translations,
            reconciled,
            failed,
        }
    }

    fn progress_bar(&self, total: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] batch {pos}/{len}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}
