pub mod check;
pub mod completions;
pub mod diff;
pub mod digest;
pub mod fmt;
pub mod init;
pub mod man_pages;
pub mod satisfies;
pub mod show;
pub mod verify_lock;

use pipspec_core::Severity;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_MANIFEST_ERROR: u8 = 2;
pub const EXIT_LOCK_ERROR: u8 = 3;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

/// Replace `dest` with `content` via a temp file in the same directory.
pub fn write_atomic(dest: &Path, content: &str) -> Result<(), String> {
    let dir = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| format!("write temp file: {e}"))?;
    use std::io::Write;
    tmp.write_all(content.as_bytes())
        .map_err(|e| format!("write temp file: {e}"))?;
    // NamedTempFile is created 0600; keep the mode of the file being replaced.
    if let Ok(meta) = std::fs::metadata(dest) {
        tmp.as_file()
            .set_permissions(meta.permissions())
            .map_err(|e| format!("set permissions on temp file: {e}"))?;
    }
    tmp.as_file()
        .sync_all()
        .map_err(|e| format!("fsync temp file: {e}"))?;
    tmp.persist(dest)
        .map_err(|e| format!("persist {}: {}", dest.display(), e.error))?;
    Ok(())
}

pub fn colorize_severity(severity: Severity) -> String {
    use console::Style;
    let text = severity.to_string();
    match severity {
        Severity::Error => Style::new().red().bold().apply_to(text).to_string(),
        Severity::Warning => Style::new().yellow().apply_to(text).to_string(),
    }
}
