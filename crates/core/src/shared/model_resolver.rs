use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("could not determine model cache directory")]
    NoCacheDir,
    #[error("failed to prepare cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Resolve an ONNX model file by name, downloading it on first use.
///
/// Resolution order: user cache directory, then an optional bundled
/// directory, then download from `url` into the cache.
pub fn resolve(
    name: &str,
    url: &str,
    bundled_dir: Option<&Path>,
) -> Result<PathBuf, ModelResolveError> {
    let cache_dir = model_cache_dir()?;
    let cached = cache_dir.join(name);
    if cached.exists() {
        return Ok(cached);
    }

    if let Some(dir) = bundled_dir {
        let bundled = dir.join(name);
        if bundled.exists() {
            return Ok(bundled);
        }
    }

    fs::create_dir_all(&cache_dir).map_err(ModelResolveError::CacheDir)?;
    log::info!("Downloading model {name} from {url}");
    download(url, &cached)?;
    Ok(cached)
}

pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    dirs::cache_dir()
        .map(|d| d.join("FaceWatch").join("models"))
        .ok_or(ModelResolveError::NoCacheDir)
}

/// Downloads to `<dest>.part` first, then renames, so an interrupted
/// download never leaves a truncated model behind.
fn download(url: &str, dest: &Path) -> Result<(), ModelResolveError> {
    let wrap_dl = |source: reqwest::Error| ModelResolveError::Download {
        url: url.to_string(),
        source,
    };

    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(wrap_dl)?;

    let temp = dest.with_extension("part");
    let mut file = fs::File::create(&temp).map_err(|e| ModelResolveError::Write {
        path: temp.clone(),
        source: e,
    })?;

    response.copy_to(&mut file).map_err(wrap_dl)?;
    drop(file);

    fs::rename(&temp, dest).map_err(|e| ModelResolveError::Write {
        path: dest.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_model_cache_dir_under_app_name() {
        let dir = model_cache_dir().unwrap();
        assert!(dir.to_string_lossy().contains("FaceWatch"));
        assert!(dir.ends_with("models"));
    }

    #[test]
    fn test_resolve_prefers_bundled_file() {
        let tmp = TempDir::new().unwrap();
        let bundled = tmp.path().join("weights");
        fs::create_dir_all(&bundled).unwrap();
        fs::write(bundled.join("net.onnx"), b"weights").unwrap();

        // The cache won't contain this name, so the bundled copy wins and
        // no download is attempted (the URL is unreachable on purpose).
        let path = resolve(
            "net.onnx",
            "http://invalid.nonexistent.example.com/net.onnx",
            Some(&bundled),
        )
        .unwrap();
        assert_eq!(path, bundled.join("net.onnx"));
    }

    #[test]
    fn test_download_invalid_url_returns_error() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("net.onnx");
        let result = download("http://invalid.nonexistent.example.com/net.onnx", &dest);
        assert!(result.is_err());
    }

    #[test]
    fn test_download_failure_leaves_no_partial_file() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("net.onnx");
        let _ = download("http://invalid.nonexistent.example.com/net.onnx", &dest);
        assert!(!dest.exists());
        assert!(!dest.with_extension("part").exists());
    }
}
