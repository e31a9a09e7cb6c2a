//! Archive loading: locate `messages.json` and deserialize it.
//!
//! The whole document is deserialized in one streaming pass through a
//! buffered reader, so the raw JSON text is never held in memory alongside
//! the parsed [`History`].

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Result, SkypeError};
use crate::model::conversation::Conversation;
use crate::model::history::History;

/// File name looked up when a directory is given.
pub const ARCHIVE_FILE_NAME: &str = "messages.json";

/// Size of the read buffer feeding the JSON deserializer.
const READ_BUFFER_SIZE: usize = 1024 * 1024;

/// Resolve a user-supplied path to the JSON file to read.
///
/// A directory resolves to `<dir>/messages.json`, which must exist.
pub fn resolve_archive_path(path: &Path) -> Result<PathBuf> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            SkypeError::FileNotFound(path.to_path_buf())
        } else {
            SkypeError::io(path, e)
        }
    })?;

    if metadata.is_dir() {
        let json_path = path.join(ARCHIVE_FILE_NAME);
        if !json_path.is_file() {
            return Err(SkypeError::ArchiveNotFound(path.to_path_buf()));
        }
        return Ok(json_path);
    }
    Ok(path.to_path_buf())
}

/// Load an export from a file or a directory containing `messages.json`.
///
/// The progress callback receives `(bytes_read, total_bytes)`.
pub fn load_history(path: &Path, progress: Option<&dyn Fn(u64, u64)>) -> Result<History> {
    let json_path = resolve_archive_path(path)?;
    let file = File::open(&json_path).map_err(|e| SkypeError::io(&json_path, e))?;
    let total = file
        .metadata()
        .map_err(|e| SkypeError::io(&json_path, e))?
        .len();

    info!(path = %json_path.display(), bytes = total, "Loading archive");

    let reader = ProgressReader::new(file, total, progress);
    let history: History =
        serde_json::from_reader(BufReader::with_capacity(READ_BUFFER_SIZE, reader))
            .map_err(|e| SkypeError::json(&json_path, e))?;

    if let Some(cb) = progress {
        cb(total, total);
    }

    info!(
        conversations = history.conversations.len(),
        messages = history.total_messages(),
        "Archive loaded"
    );
    Ok(history)
}

/// Older single-conversation export shape: `{exportDate, conversation}`.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyExport {
    #[serde(rename = "exportDate", default)]
    pub export_date: String,
    pub conversation: Conversation,
}

/// What a JSON document on disk turned out to be.
#[derive(Debug)]
pub enum ArchiveFormat {
    /// Already `{userId, exportDate, conversations}`.
    Current,
    /// The legacy `{exportDate, conversation}` shape.
    Legacy(Box<LegacyExport>),
}

/// Detect whether a file is a legacy export or already in the current format.
pub fn detect_format(path: &Path) -> Result<ArchiveFormat> {
    let data = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            SkypeError::FileNotFound(path.to_path_buf())
        } else {
            SkypeError::io(path, e)
        }
    })?;

    match serde_json::from_slice::<LegacyExport>(&data) {
        Ok(legacy) => Ok(ArchiveFormat::Legacy(Box::new(legacy))),
        Err(legacy_err) => {
            debug!(error = %legacy_err, "Not a legacy export, trying current format");
            serde_json::from_slice::<History>(&data)
                .map(|_| ArchiveFormat::Current)
                .map_err(|_| SkypeError::json(path, legacy_err))
        }
    }
}

/// Reader adapter that reports cumulative bytes read.
struct ProgressReader<'a, R> {
    inner: R,
    read: u64,
    total: u64,
    progress: Option<&'a dyn Fn(u64, u64)>,
}

impl<'a, R: Read> ProgressReader<'a, R> {
    fn new(inner: R, total: u64, progress: Option<&'a dyn Fn(u64, u64)>) -> Self {
        Self {
            inner,
            read: 0,
            total,
            progress,
        }
    }
}

impl<R: Read> Read for ProgressReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.read += n as u64;
        if let Some(cb) = self.progress {
            cb(self.read, self.total);
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    const SAMPLE: &str = r#"{
        "userId": "8:live:me",
        "exportDate": "2024-02-01T00:00:00Z",
        "conversations": [
            {"id": "8:live:bob", "displayName": "Bob", "MessageList": [
                {"id": "1", "content": "hi", "from": "8:live:bob",
                 "messagetype": "RichText", "originalarrivaltime": "2024-01-01T10:00:00Z"}
            ]}
        ]
    }"#;

    #[test]
    fn test_load_from_file_reports_progress() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");
        std::fs::write(&path, SAMPLE).unwrap();

        let last = Cell::new((0u64, 0u64));
        let history = load_history(&path, Some(&|done, total| last.set((done, total)))).unwrap();

        assert_eq!(history.user_id, "8:live:me");
        assert_eq!(history.conversations.len(), 1);
        assert_eq!(history.total_messages(), 1);
        let (done, total) = last.get();
        assert_eq!(done, total);
        assert_eq!(total, SAMPLE.len() as u64);
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(ARCHIVE_FILE_NAME), SAMPLE).unwrap();
        let history = load_history(dir.path(), None).unwrap();
        assert_eq!(history.conversations[0].display_name(), "Bob");
    }

    #[test]
    fn test_directory_without_archive() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_history(dir.path(), None).unwrap_err();
        assert!(matches!(err, SkypeError::ArchiveNotFound(_)));
    }

    #[test]
    fn test_missing_path() {
        let err = load_history(Path::new("/definitely/not/here.json"), None).unwrap_err();
        assert!(matches!(err, SkypeError::FileNotFound(_)));
    }

    #[test]
    fn test_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load_history(&path, None).unwrap_err();
        assert!(matches!(err, SkypeError::Json { .. }));
    }

    #[test]
    fn test_detect_formats() {
        let dir = tempfile::tempdir().unwrap();
        let current = dir.path().join("current.json");
        std::fs::write(&current, SAMPLE).unwrap();
        assert!(matches!(detect_format(&current).unwrap(), ArchiveFormat::Current));

        let legacy = dir.path().join("legacy.json");
        std::fs::write(
            &legacy,
            r#"{"exportDate": "2020-05-01", "conversation": {"id": "x", "MessageList": []}}"#,
        )
        .unwrap();
        match detect_format(&legacy).unwrap() {
            ArchiveFormat::Legacy(l) => {
                assert_eq!(l.export_date, "2020-05-01");
                assert_eq!(l.conversation.id, "x");
            }
            ArchiveFormat::Current => panic!("expected legacy format"),
        }

        let junk = dir.path().join("junk.json");
        std::fs::write(&junk, "[1, 2").unwrap();
        assert!(matches!(detect_format(&junk), Err(SkypeError::Json { .. })));
    }
}
