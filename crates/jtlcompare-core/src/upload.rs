use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::analysis::ApdexThresholds;
use crate::error::JtlError;
use crate::processor::{process_jtl, ProcessedResult};

/// Largest file accepted for processing (50 MB).
pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Accepted file extensions, compared case-insensitively.
pub const ACCEPTED_EXTENSIONS: [&str; 2] = ["jtl", "csv"];

/// Raw contents of a result file that passed upload checks.
#[derive(Debug, Clone)]
pub struct JtlFile {
    pub name: String,
    pub size_bytes: u64,
    pub contents: String,
}

/// A file name together with its processed result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedFile {
    pub name: String,
    pub size_bytes: u64,
    pub result: ProcessedResult,
}

/// Reject files that are not `.jtl`/`.csv` or are larger than
/// [`MAX_UPLOAD_BYTES`].
pub fn validate_upload(file_name: &str, size_bytes: u64) -> Result<(), JtlError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension {
        Some(ext) if ACCEPTED_EXTENSIONS.contains(&ext.as_str()) => {}
        _ => {
            return Err(JtlError::Validation(format!(
                "'{file_name}' is not a JTL or CSV file"
            )))
        }
    }

    if size_bytes > MAX_UPLOAD_BYTES {
        return Err(JtlError::Validation(format!(
            "'{file_name}' is {size_bytes} bytes, larger than the {MAX_UPLOAD_BYTES} byte limit"
        )));
    }
    Ok(())
}

/// Validate and read a result file as UTF-8 text.
///
/// Invalid UTF-8 sequences are replaced with U+FFFD rather than rejected.
pub async fn read_jtl_file(path: impl AsRef<Path>) -> Result<JtlFile, JtlError> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let size_bytes = tokio::fs::metadata(path).await?.len();
    validate_upload(&name, size_bytes)?;
    let contents = decode_lossy(&name, tokio::fs::read(path).await?);

    Ok(JtlFile {
        name,
        size_bytes,
        contents,
    })
}

fn decode_lossy(name: &str, bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(file = %name, "file is not valid UTF-8, invalid bytes replaced");
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    }
}

/// Read and process one file. Parsing runs on the blocking pool.
pub async fn process_file(
    path: impl AsRef<Path>,
    thresholds: ApdexThresholds,
) -> Result<ProcessedFile, JtlError> {
    let file = read_jtl_file(path).await?;
    let JtlFile {
        name,
        size_bytes,
        contents,
    } = file;

    let result = tokio::task::spawn_blocking(move || process_jtl(&contents, &thresholds))
        .await
        .map_err(|e| JtlError::Internal(format!("processing task failed: {e}")))??;

    Ok(ProcessedFile {
        name,
        size_bytes,
        result,
    })
}

/// Process several files concurrently.
///
/// Returns one result per path, in input order. A failing file does not
/// affect the others.
pub async fn process_files(
    paths: Vec<PathBuf>,
    thresholds: ApdexThresholds,
) -> Vec<Result<ProcessedFile, JtlError>> {
    let handles: Vec<_> = paths
        .into_iter()
        .map(|path| tokio::spawn(async move { process_file(&path, thresholds).await }))
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for handle in handles {
        let outcome = handle
            .await
            .unwrap_or_else(|e| Err(JtlError::Internal(format!("processing task failed: {e}"))));
        if let Err(err) = &outcome {
            tracing::warn!(error = %err, "file could not be processed");
        }
        results.push(outcome);
    }
    results
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
