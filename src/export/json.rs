//! JSON export of a single conversation, and conversion of legacy
//! single-conversation exports to the current archive layout.
//!
//! Both outputs are ordinary archives (`{userId, exportDate, conversations}`)
//! that every command can open again.

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use tracing::info;

use super::{ensure_json_extension, sanitize_filename_part, JSON_EXTENSION};
use crate::error::{Result, SkypeError};
use crate::model::conversation::Conversation;
use crate::model::history::History;
use crate::parser::archive::{detect_format, ArchiveFormat};

/// Owner id written into converted legacy exports.
pub const CONVERTED_USER_ID: &str = "converted_user";

const MAX_NAME_LEN: usize = 80;

/// Default output file name for a conversation: `conversation_<name>.json`.
pub fn default_export_name(conversation: &Conversation) -> String {
    format!(
        "conversation_{}.{JSON_EXTENSION}",
        sanitize_filename_part(conversation.display_name(), MAX_NAME_LEN)
    )
}

/// Write `history` as pretty-printed JSON, creating parent directories.
///
/// Returns the number of bytes written.
fn write_history(history: &History, path: &Path) -> Result<u64> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| SkypeError::io(parent, e))?;
    }
    let data = serde_json::to_vec_pretty(history)
        .map_err(|e| SkypeError::ExportError(format!("cannot serialize archive: {e}")))?;
    std::fs::write(path, &data).map_err(|e| SkypeError::io(path, e))?;
    Ok(data.len() as u64)
}

/// Export one conversation as a standalone archive.
///
/// `.json` is appended to `output` if missing. Returns the final path and
/// the number of bytes written.
pub fn export_conversation(
    conversation: &Conversation,
    user_id: &str,
    output: &Path,
) -> Result<(PathBuf, u64)> {
    let path = ensure_json_extension(output);
    let archive = History {
        user_id: user_id.to_string(),
        export_date: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        conversations: vec![conversation.clone()],
    };
    let size = write_history(&archive, &path)?;
    info!(
        path = %path.display(),
        conversation = conversation.display_name(),
        messages = conversation.messages.len(),
        bytes = size,
        "Exported conversation"
    );
    Ok((path, size))
}

/// Where a converted file goes by default: `<stem>_converted.json` next to the input.
pub fn converted_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{stem}_converted.{JSON_EXTENSION}"))
}

/// What [`convert_legacy`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertOutcome {
    /// The input already uses the current layout; nothing was written.
    AlreadyCurrent,
    Converted {
        output: PathBuf,
        input_size: u64,
        output_size: u64,
    },
}

/// Convert a legacy `{exportDate, conversation}` file to the current layout.
///
/// Writes to `output`, or to [`converted_path`] of the input when `None`.
pub fn convert_legacy(input: &Path, output: Option<&Path>) -> Result<ConvertOutcome> {
    let legacy = match detect_format(input)? {
        ArchiveFormat::Current => {
            info!(path = %input.display(), "Already in current format");
            return Ok(ConvertOutcome::AlreadyCurrent);
        }
        ArchiveFormat::Legacy(legacy) => *legacy,
    };

    let output = match output {
        Some(path) => ensure_json_extension(path),
        None => converted_path(input),
    };
    if output == input {
        return Err(SkypeError::ExportError(format!(
            "refusing to overwrite input file {}",
            input.display()
        )));
    }

    let input_size = std::fs::metadata(input)
        .map_err(|e| SkypeError::io(input, e))?
        .len();
    let archive = History {
        user_id: CONVERTED_USER_ID.to_string(),
        export_date: legacy.export_date,
        conversations: vec![legacy.conversation],
    };
    let output_size = write_history(&archive, &output)?;
    info!(
        input = %input.display(),
        output = %output.display(),
        "Converted legacy export"
    );

    Ok(ConvertOutcome::Converted {
        output,
        input_size,
        output_size,
    })
}
