//! Export functionality: single-conversation JSON export and legacy conversion.

pub mod json;

use std::path::{Path, PathBuf};

/// Extension given to every exported file.
pub const JSON_EXTENSION: &str = "json";

/// Replace anything but alphanumerics and `-._@` with `_`, keep at most
/// `max_len` characters, and fall back to `unknown` when nothing is left.
pub fn sanitize_filename_part(s: &str, max_len: usize) -> String {
    let sanitized: String = s
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '.' | '_' | '@') {
                c
            } else {
                '_'
            }
        })
        .take(max_len)
        .collect();

    if sanitized.is_empty() {
        "unknown".to_string()
    } else {
        sanitized
    }
}

/// Append `.json` unless the path already ends with it.
pub fn ensure_json_extension(path: &Path) -> PathBuf {
    let has_ext = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case(JSON_EXTENSION));
    if has_ext {
        path.to_path_buf()
    } else {
        let mut raw = path.as_os_str().to_os_string();
        raw.push(".");
        raw.push(JSON_EXTENSION);
        PathBuf::from(raw)
    }
}
