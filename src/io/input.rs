use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, warn};

use crate::models::{NormalizedLine, RawLine, SpeakerCode};

/// `[speaker] [time] message`
static EXPORT_LINE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\[([^\]]+)\]\s*\[[^\]]+\]\s*(.+)$").ok());

/// `u<n>: message`
static NORMALIZED_LINE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(u\d+):\s*(.*)$").ok());

/// Minimum dash run that marks a date separator line
const SEPARATOR_DASHES: &str = "---";

/// Read an exported chat file
pub fn read_transcript_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {:?}", path))
}

/// Parse exported chat text into ordered speaker/message events.
///
/// Blank lines, dash separator lines and lines not matching
/// `[name] [field] message` are dropped.
pub fn parse_transcript(text: &str) -> Vec<RawLine> {
    let Some(pattern) = EXPORT_LINE.as_ref() else {
        warn!("Export line pattern failed to compile");
        return Vec::new();
    };

    let mut lines = Vec::new();
    let mut dropped = 0usize;

    for line in text.lines().map(str::trim) {
        // Date separators ("------ 2024년 3월 1일 ------")
        if line.is_empty() || line.starts_with(SEPARATOR_DASHES) {
            continue;
        }
        match pattern.captures(line) {
            Some(caps) => lines.push(RawLine {
                speaker: caps[1].to_string(),
                message: caps[2].to_string(),
                order: lines.len(),
            }),
            // System notices, multi-line continuations
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!("Dropped {} unparseable transcript lines", dropped);
    }
    lines
}

/// Parse `"<code>: <message>"` text back into anonymized lines.
///
/// Accepts `\n` and `\r\n` line breaks; other lines are ignored.
pub fn parse_normalized_text(text: &str) -> Vec<NormalizedLine> {
    let Some(pattern) = NORMALIZED_LINE.as_ref() else {
        warn!("Normalized line pattern failed to compile");
        return Vec::new();
    };

    text.lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let caps = pattern.captures(line)?;
            let speaker: SpeakerCode = caps[1].parse().ok()?;
            Some(NormalizedLine {
                speaker,
                message: caps[2].to_string(),
            })
        })
        .collect()
}

/// Owns an uploaded file and deletes it when dropped.
///
/// Removal happens on every exit path of the scope holding the guard.
#[derive(Debug)]
pub struct UploadGuard {
    path: PathBuf,
}

impl UploadGuard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the upload as UTF-8 text
    pub fn read_to_string(&self) -> Result<String> {
        read_transcript_file(&self.path)
    }
}

impl Drop for UploadGuard {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed upload {:?}", self.path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove upload {:?}: {}", self.path, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_parse_transcript() {
        let text = "--------------- Monday, 1 January 2024 ---------------\n\
                    [Alice] [12:00] hi\n\
                    \n\
                    Saved on 2024-01-02\n\
                    [Bob] [12:01]   hello there  \n\
                    [Alice] [12:02] bye";

        let lines = parse_transcript(text);

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].speaker, "Alice");
        assert_eq!(lines[0].message, "hi");
        assert_eq!(lines[1].speaker, "Bob");
        assert_eq!(lines[1].message, "hello there");
        assert_eq!(lines[2].order, 2);
    }

    #[test]
    fn test_parse_transcript_empty() {
        assert!(parse_transcript("").is_empty());
        assert!(parse_transcript("no brackets here\n-----").is_empty());
    }

    #[test]
    fn test_parse_transcript_keeps_brackets_in_message() {
        let lines = parse_transcript("[Kim Min] [PM 3:15] look at [this]");
        assert_eq!(lines[0].speaker, "Kim Min");
        assert_eq!(lines[0].message, "look at [this]");
    }

    #[test]
    fn test_parse_normalized_text() {
        let text = "u1: hi\r\nu2: hello\n\ncontinued line\nu10:   spaced";
        let lines = parse_normalized_text(text);

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].speaker, SpeakerCode::new(1));
        assert_eq!(lines[0].message, "hi");
        assert_eq!(lines[1].message, "hello");
        assert_eq!(lines[2].speaker, SpeakerCode::new(10));
        assert_eq!(lines[2].message, "spaced");
    }

    #[test]
    fn test_upload_guard_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[A] [1] hi").unwrap();

        {
            let guard = UploadGuard::new(&path);
            assert!(guard.read_to_string().unwrap().contains("hi"));
        }

        assert!(!path.exists());
    }

    #[test]
    fn test_upload_guard_removes_file_on_error_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.txt");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();

        let result = {
            let guard = UploadGuard::new(&path);
            guard.read_to_string()
        };

        assert!(result.is_err());
        assert!(!path.exists());
    }
}
