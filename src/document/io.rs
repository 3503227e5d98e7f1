//! Document file I/O: load/save, versioned output paths, and the changelog.

use crate::document::WorkflowDocument;
use crate::error::DocumentError;
use chrono::Local;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Load a workflow document from a JSON file.
pub fn load(path: impl AsRef<Path>) -> Result<WorkflowDocument, DocumentError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Save a workflow document as pretty-printed JSON.
pub fn save(doc: &WorkflowDocument, path: impl AsRef<Path>) -> Result<(), DocumentError> {
    let json = serde_json::to_string_pretty(doc)?;
    fs::write(path, json)?;
    Ok(())
}

/// Pick the next free versioned path for `base_path`.
///
/// If `output.json` exists, returns `output_v2.json`; if `output_v5.json`
/// exists, returns `output_v6.json`; probes upward until a free path is found.
pub fn versioned_output(base_path: impl AsRef<Path>) -> PathBuf {
    let path = base_path.as_ref();
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let suffix = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| format!(".{}", s))
        .unwrap_or_default();
    let parent = path.parent().unwrap_or_else(|| Path::new(""));

    let (base, mut next_version) = match split_version_suffix(stem) {
        Some((base, version)) => (base, version + 1),
        None => (stem, 2),
    };

    loop {
        let candidate = parent.join(format!("{}_v{}{}", base, next_version, suffix));
        if !candidate.exists() {
            return candidate;
        }
        next_version += 1;
    }
}

/// Append an operation record to the changelog kept alongside `output_file`.
///
/// The changelog is named after the output file with any `_vN` suffix
/// stripped, so every version of the same document shares one log.
pub fn append_changelog(
    input_file: impl AsRef<Path>,
    output_file: impl AsRef<Path>,
    operation: &str,
    details: &str,
) -> Result<(), DocumentError> {
    let output_path = output_file.as_ref();
    let stem = output_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let base_stem = split_version_suffix(stem).map(|(b, _)| b).unwrap_or(stem);
    let changelog = output_path
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(format!("{}.changelog", base_stem));

    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    let input_name = file_name(input_file.as_ref());
    let output_name = file_name(output_path);

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(changelog)?;
    writeln!(
        file,
        "{} | {} | {} -> {}",
        timestamp, operation, input_name, output_name
    )?;
    for line in details.trim().lines() {
        writeln!(file, "  {}", line)?;
    }
    writeln!(file)?;
    Ok(())
}

/// Split a `name_vN` stem into `(name, N)`, or `None` when no version suffix.
fn split_version_suffix(stem: &str) -> Option<(&str, u32)> {
    let (base, version) = stem.rsplit_once("_v")?;
    if base.is_empty() || version.is_empty() {
        return None;
    }
    let version: u32 = version.parse().ok()?;
    Some((base, version))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}
