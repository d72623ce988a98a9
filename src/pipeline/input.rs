//! Input resolution: turn a user-supplied path or URL into a [`RawDocument`].
//!
//! Local paths are not opened here. The returned document points at the
//! file and is only read once format detection has accepted it, so a
//! rejected upload costs no I/O.
//!
//! URLs are downloaded into memory. The response's `Content-Type` becomes
//! the declared media type and the last path segment the file name, so
//! detection works the same way it does for an uploaded file.

use crate::config::IngestConfig;
use crate::document::RawDocument;
use crate::error::IngestError;
use std::path::PathBuf;
use tracing::{debug, info};

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to a document.
pub async fn resolve_input(input: &str, config: &IngestConfig) -> Result<RawDocument, IngestError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(IngestError::MissingInput { field: "document" });
    }
    if is_url(input) {
        download_url(input, config).await
    } else {
        let path = PathBuf::from(input);
        debug!("Resolved local document: {}", path.display());
        Ok(RawDocument::from_path(path))
    }
}

async fn download_url(url: &str, config: &IngestConfig) -> Result<RawDocument, IngestError> {
    info!("Downloading document from: {}", url);
    let timeout_secs = config.download_timeout_secs;
    let failed = |reason: String| IngestError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            IngestError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let file_name = file_name_from_url(url);
    if let Some(len) = response.content_length() {
        if len > config.max_file_bytes {
            return Err(IngestError::FileTooLarge {
                file_name,
                size: len,
                limit: config.max_file_bytes,
            });
        }
    }

    let media_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let bytes = response.bytes().await.map_err(|e| {
        if e.is_timeout() {
            IngestError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    })?;

    info!(
        "Downloaded '{}' ({} bytes, type {})",
        file_name,
        bytes.len(),
        media_type.as_deref().unwrap_or("unknown")
    );

    Ok(RawDocument::from_bytes(
        file_name,
        media_type.as_deref(),
        bytes.to_vec(),
    ))
}

/// Last non-empty path segment of `url`, or `"download"`.
fn file_name_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|last| !last.is_empty())
        .unwrap_or_else(|| "download".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentSource;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/cv.pdf"));
        assert!(is_url("http://example.com/cv.pdf"));
        assert!(!is_url("/tmp/cv.pdf"));
        assert!(!is_url("cv.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn test_file_name_from_url() {
        assert_eq!(file_name_from_url("https://x.io/files/cv.docx"), "cv.docx");
        assert_eq!(file_name_from_url("https://x.io/files/cv.pdf?dl=1"), "cv.pdf");
        assert_eq!(file_name_from_url("https://x.io/"), "download");
        assert_eq!(file_name_from_url("not a url"), "download");
    }

    #[tokio::test]
    async fn local_paths_are_not_opened() {
        let doc = resolve_input("/does/not/exist/cv.pdf", &IngestConfig::default())
            .await
            .unwrap();
        assert_eq!(doc.file_name, "cv.pdf");
        assert!(matches!(doc.source, DocumentSource::File(_)));
    }

    #[tokio::test]
    async fn blank_input_is_validation_error() {
        let err = resolve_input("   ", &IngestConfig::default()).await.unwrap_err();
        assert_eq!(err.category(), crate::error::ErrorCategory::Validation);
    }
}
