use std::path::Path;
use std::sync::{Arc, Mutex};

use assert_fs::prelude::*;
use async_trait::async_trait;

use subverse::align::AlignmentEngine;
use subverse::config::{Config, MediaConfig};
use subverse::error::SubverseError;
use subverse::media::{MediaProcessorFactory, MediaProcessorTrait};
use subverse::subtitle::{SubtitleDocument, Timestamp};
use subverse::translate::{BatchTranslator, TranslationReply};
use subverse::workflow::Workflow;

/// Replays canned replies in order and records every request
struct ScriptedTranslator {
    replies: Mutex<Vec<TranslationReply>>,
    requests: Arc<Mutex<Vec<Vec<String>>>>,
}

impl ScriptedTranslator {
    fn new(replies: Vec<TranslationReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().rev().collect()),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn requests(&self) -> Vec<Vec<String>> {
        self.requests.lock().unwrap().clone()
    }

    /// Shared view of the request log that outlives a boxed translator
    fn request_log(&self) -> Arc<Mutex<Vec<Vec<String>>>> {
        Arc::clone(&self.requests)
    }
}

#[async_trait]
impl BatchTranslator for ScriptedTranslator {
    async fn translate_batch(&self, blocks: &[String], _source: &str, _target: &str) -> TranslationReply {
        self.requests.lock().unwrap().push(blocks.to_vec());
        self.replies.lock().unwrap().pop().unwrap_or(TranslationReply::Empty)
    }
}

fn blocks(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

const HELLO_GOODBYE: &str = "1\n00:00:01,000 --> 00:00:02,500\nHello\n\n\
2\n00:00:03,000 --> 00:00:04,250\nHello\n\n\
3\n00:00:05,100 --> 00:00:07,900\nGoodbye\n\n";

#[tokio::test]
async fn hello_goodbye_end_to_end() {
    let temp = assert_fs::TempDir::new().unwrap();
    let input = temp.child("song.srt");
    input.write_str(HELLO_GOODBYE).unwrap();
    let output = temp.path().join("song_es.srt");

    let translator = ScriptedTranslator::new(vec![TranslationReply::Blocks(blocks(&["Hola", "Adiós"]))]);
    let request_log = translator.request_log();
    let workflow = Workflow::with_components(
        Config::default(),
        Box::new(translator),
        MediaProcessorFactory::create_processor(MediaConfig::default()),
    );

    let report = workflow.translate_file(input.path(), &output, "EN", "ES", false).await.unwrap();

    assert_eq!(*request_log.lock().unwrap(), vec![blocks(&["Hello", "Goodbye"])]);
    assert_eq!(report.unique_texts, 2);
    assert_eq!(report.applied, 3);

    let translated = SubtitleDocument::load(&output).await.unwrap();
    let texts: Vec<&str> = translated.events.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(texts, vec!["Hola", "Hola", "Adiós"]);

    let original = SubtitleDocument::parse(HELLO_GOODBYE).unwrap();
    for (after, before) in translated.events.iter().zip(&original.events) {
        assert_eq!(after.start, before.start);
        assert_eq!(after.end, before.end);
    }
    assert_eq!(translated.events[2].end, Timestamp::from_millis(7_900));
}

#[tokio::test]
async fn repeated_chorus_is_sent_once() {
    let chorus = "We will\nrock you";
    let mut doc = SubtitleDocument::parse(&format!(
        "1\n00:00:01,000 --> 00:00:02,000\n{c}\n\n2\n00:00:03,000 --> 00:00:04,000\nVerse\n\n\
         3\n00:00:05,000 --> 00:00:06,000\n {c} \n\n4\n00:00:07,000 --> 00:00:08,000\n{c}\n\n",
        c = chorus
    ))
    .unwrap();

    let translator = ScriptedTranslator::new(vec![TranslationReply::Blocks(blocks(&[
        "Te vamos a\\nsacudir",
        "Verso",
    ]))]);

    AlignmentEngine::new(20, 1)
        .translate_document(&mut doc, &translator, "EN", "ES")
        .await;

    assert_eq!(translator.requests(), vec![blocks(&["We will\\nrock you", "Verse"])]);
    for idx in [0, 2, 3] {
        assert_eq!(doc.events[idx].text, "Te vamos a\nsacudir");
    }
    assert_eq!(doc.events[1].text, "Verso");
}

#[tokio::test]
async fn blocked_batch_keeps_original_text() {
    let mut doc = SubtitleDocument::parse(HELLO_GOODBYE).unwrap();
    let translator = ScriptedTranslator::new(vec![TranslationReply::Blocked("SAFETY".to_string())]);

    let report = AlignmentEngine::new(20, 1)
        .translate_document(&mut doc, &translator, "EN", "ES")
        .await;

    let texts: Vec<&str> = doc.events.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(texts, vec!["Hello", "Hello", "Goodbye"]);
    assert_eq!(report.failed_batches, 1);
    assert!(!report.merge_anomaly);
}

#[cfg(unix)]
mod extraction {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// Write an executable shell script standing in for ffmpeg
    fn fake_ffmpeg(dir: &Path, body: &str) -> String {
        let path = dir.join("fake-ffmpeg");
        std::fs::write(&path, format!("#!/bin/sh\nfor last; do :; done\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn processor(binary_path: String) -> Box<dyn MediaProcessorTrait> {
        MediaProcessorFactory::create_processor(MediaConfig {
            binary_path,
            ..MediaConfig::default()
        })
    }

    #[tokio::test]
    async fn failing_tool_leaves_no_output() {
        let temp = assert_fs::TempDir::new().unwrap();
        let video = temp.child("clip.mkv");
        video.touch().unwrap();
        let out = temp.path().join("clip_original.srt");

        let binary = fake_ffmpeg(temp.path(), "echo 'Subtitle stream not found' >&2\nexit 1");
        let result = processor(binary).extract_subtitles(video.path(), &out).await;

        assert!(matches!(result, Err(SubverseError::NoSubtitleTrack(_))));
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn zero_byte_output_is_removed() {
        let temp = assert_fs::TempDir::new().unwrap();
        let video = temp.child("clip.mkv");
        video.touch().unwrap();
        let out = temp.path().join("clip_original.srt");

        let binary = fake_ffmpeg(temp.path(), ": > \"$last\"\nexit 1");
        let result = processor(binary).extract_subtitles(video.path(), &out).await;

        assert!(matches!(result, Err(SubverseError::NoSubtitleTrack(_))));
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn extracted_track_is_returned() {
        let temp = assert_fs::TempDir::new().unwrap();
        let video = temp.child("clip.mkv");
        video.touch().unwrap();
        let out = temp.path().join("clip_original.srt");

        let binary = fake_ffmpeg(
            temp.path(),
            "printf '1\\n00:00:01,000 --> 00:00:02,000\\nHello\\n\\n' > \"$last\"\nexit 0",
        );
        let path = processor(binary).extract_subtitles(video.path(), &out).await.unwrap();

        assert_eq!(path, out);
        let doc = SubtitleDocument::load(&path).await.unwrap();
        assert_eq!(doc.events[0].text, "Hello");
    }
}
