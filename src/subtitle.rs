use std::fmt;
use std::path::Path;
use std::sync::LazyLock;
use regex::Regex;
use tokio::fs;
use tracing::{debug, info};

use crate::error::{Result, SubverseError};

/// Inline markup that is not part of the spoken text: `<i>`, `</font>`, `{\an8}`
static MARKUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<[^>]*>|\{\\[^}]*\}").expect("markup pattern is valid")
});

/// Point in time inside a subtitle track, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Parse `HH:MM:SS,mmm` (a `.` before the milliseconds is accepted too)
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let (clock, millis) = s.split_once([',', '.'])?;
        let mut parts = clock.split(':');
        let hours: u64 = parts.next()?.trim().parse().ok()?;
        let minutes: u64 = parts.next()?.parse().ok()?;
        let seconds: u64 = parts.next()?.parse().ok()?;
        if parts.next().is_some() || minutes >= 60 || seconds >= 60 {
            return None;
        }
        if millis.is_empty() || millis.len() > 3 || !millis.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        // "5" after the separator means 500 ms
        let millis: u64 = format!("{:0<3}", millis).parse().ok()?;

        let total_seconds = hours.checked_mul(3600)?.checked_add(minutes * 60 + seconds)?;
        Some(Self(total_seconds.checked_mul(1000)?.checked_add(millis)?))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.0;
        let hours = total / 3_600_000;
        let minutes = (total % 3_600_000) / 60_000;
        let secs = (total % 60_000) / 1_000;
        let millis = total % 1_000;

        write!(f, "{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
    }
}

/// A single timed subtitle entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleEvent {
    /// Index as read from the file (1-based)
    pub index: usize,
    pub start: Timestamp,
    pub end: Timestamp,
    /// Subtitle text, lines separated by `\n`
    pub text: String,
}

impl SubtitleEvent {
    pub fn new(index: usize, start: Timestamp, end: Timestamp, text: impl Into<String>) -> Self {
        Self {
            index,
            start,
            end,
            text: text.into(),
        }
    }

    /// Text with inline formatting tags removed
    pub fn plaintext(&self) -> String {
        MARKUP.replace_all(&self.text, "").into_owned()
    }
}

/// Ordered list of subtitle events making up one SRT file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubtitleDocument {
    pub events: Vec<SubtitleEvent>,
}

impl SubtitleDocument {
    pub fn new(events: Vec<SubtitleEvent>) -> Self {
        Self { events }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Parse SRT content
    pub fn parse(content: &str) -> Result<Self> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let content = content.replace("\r\n", "\n").replace('\r', "\n");
        let lines: Vec<&str> = content.lines().collect();

        let mut events: Vec<SubtitleEvent> = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            if lines[i].trim().is_empty() {
                i += 1;
                continue;
            }

            // The numeric counter is optional; some extractors drop it
            let mut index = events.len() + 1;
            if !lines[i].contains("-->") {
                let starts_event = lines.get(i + 1).is_some_and(|next| next.contains("-->"));
                let counter = lines[i].trim().parse::<usize>();

                match (starts_event, counter, events.last_mut()) {
                    (true, Ok(counter), _) => index = counter,
                    // Text after a blank line inside an event belongs to that event
                    (_, _, Some(previous)) => {
                        if !previous.text.is_empty() {
                            previous.text.push('\n');
                        }
                        previous.text.push_str(lines[i]);
                        i += 1;
                        continue;
                    }
                    (false, Ok(counter), None) => index = counter,
                    (_, Err(_), None) => {
                        return Err(SubverseError::Subtitle {
                            line: i + 1,
                            message: format!("expected subtitle index, found '{}'", lines[i].trim()),
                        });
                    }
                }
                i += 1;
            }

            let timing_line = lines.get(i).ok_or_else(|| SubverseError::Subtitle {
                line: i + 1,
                message: "unexpected end of file (expected timestamp)".to_string(),
            })?;
            let (start, end) = parse_timing_line(timing_line).ok_or_else(|| SubverseError::Subtitle {
                line: i + 1,
                message: format!("invalid timestamp line '{}'", timing_line.trim()),
            })?;
            i += 1;

            let mut text_lines = Vec::new();
            while i < lines.len() && !lines[i].trim().is_empty() {
                text_lines.push(lines[i]);
                i += 1;
            }

            events.push(SubtitleEvent::new(index, start, end, text_lines.join("\n")));
        }

        debug!("Parsed {} subtitle events", events.len());
        Ok(Self { events })
    }

    /// Serialize as SRT, renumbering events from 1
    pub fn to_srt(&self) -> String {
        let mut srt_content = String::new();

        for (index, event) in self.events.iter().enumerate() {
            srt_content.push_str(&format!(
                "{}\n{} --> {}\n{}\n\n",
                index + 1,
                event.start,
                event.end,
                event.text.trim_end_matches('\n')
            ));
        }

        srt_content
    }

    /// Load an SRT file (UTF-8)
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading subtitles from {}", path.display());

        if !path.exists() {
            return Err(SubverseError::FileNotFound(path.display().to_string()));
        }

        let content = fs::read_to_string(path).await?;
        Self::parse(&content)
    }

    /// Write the document as an SRT file (UTF-8)
    pub async fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        info!("Writing SRT file: {}", path.display());

        fs::write(path, self.to_srt()).await?;
        Ok(())
    }
}

fn parse_timing_line(line: &str) -> Option<(Timestamp, Timestamp)> {
    let (start, rest) = line.split_once("-->")?;
    // Anything after the end time (position hints) is ignored
    let end = rest.split_whitespace().next()?;
    Some((Timestamp::parse(start)?, Timestamp::parse(end)?))
}
