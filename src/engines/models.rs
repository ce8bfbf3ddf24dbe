//! Download-once cache for engine model files.

use crate::error::OcrError;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

// Recognition models are larger than ureq's default 10 MB body limit
const MAX_DOWNLOAD_BYTES: u64 = 200 * 1024 * 1024;

/// Root cache directory for downloaded models and tessdata
pub fn cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("text-extractor")
}

/// Return `dir/filename`, downloading it from `url` first if it is missing.
pub fn ensure_downloaded(url: &str, dir: &Path, filename: &str) -> Result<PathBuf, OcrError> {
    std::fs::create_dir_all(dir).map_err(|e| {
        OcrError::InitializationError(format!("Failed to create cache directory: {}", e))
    })?;

    let path = dir.join(filename);

    if !path.exists() {
        tracing::info!("Downloading {} (this may take a moment)...", filename);
        download_file(url, &path)?;
        tracing::info!("Downloaded {} to {:?}", filename, path);
    } else {
        tracing::debug!("Using cached {:?}", path);
    }

    Ok(path)
}

/// Download a file from URL to path using ureq
///
/// The body is written to a sibling `.part` file and renamed into place, so
/// an interrupted download is never mistaken for a cached model.
fn download_file(url: &str, path: &Path) -> Result<(), OcrError> {
    let response = ureq::get(url)
        .call()
        .map_err(|e| OcrError::InitializationError(format!("Failed to download {}: {}", url, e)))?;

    let mut body = response.into_body();
    let buffer = body.with_config().limit(MAX_DOWNLOAD_BYTES).read_to_vec().map_err(|e| {
        OcrError::InitializationError(format!("Failed to read response body: {}", e))
    })?;

    let partial = path.with_extension("part");
    let mut file = File::create(&partial).map_err(|e| {
        OcrError::InitializationError(format!("Failed to create {:?}: {}", partial, e))
    })?;
    file.write_all(&buffer).map_err(|e| {
        OcrError::InitializationError(format!("Failed to write {:?}: {}", partial, e))
    })?;
    std::fs::rename(&partial, path).map_err(|e| {
        OcrError::InitializationError(format!("Failed to move {:?} into place: {}", partial, e))
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cached_file_is_not_downloaded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("model.rten"), b"cached").unwrap();

        // An unroutable URL proves no request is made for a cached file
        let path = ensure_downloaded("http://127.0.0.1:9/model.rten", dir.path(), "model.rten")
            .unwrap();

        assert_eq!(std::fs::read(path).unwrap(), b"cached");
    }

    #[test]
    fn test_cache_dir_is_namespaced() {
        assert!(cache_dir().ends_with("text-extractor"));
    }
}
