//! Download of the default background-removal model.
//!
//! Only compiled with the `fetch-model` feature.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::config::{DEFAULT_MODEL_FILENAME as MODEL_FILENAME, ENV_MODEL_PATH};
use crate::{PipelineError, PipelineResult};

const APP_DIR_NAME: &str = "logo-trace";
/// Overrides the directory the model is downloaded to.
pub const ENV_MODEL_CACHE_DIR: &str = "LOGOTRACE_MODEL_CACHE_DIR";
const DEFAULT_MODEL_URL: &str =
    "https://github.com/danielgatis/rembg/releases/download/v0.0.0/silueta.onnx";
const DEFAULT_MODEL_SHA256: &str =
    "75da6c8d2f8096ec743d071951be73b4a8bc7b3e51d9a6625d63644f90ffeedb";

/// Options for fetching the model.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// URL to download the model from.
    pub url: String,
    /// Expected SHA-256 checksum (hex string).
    pub expected_sha256: String,
    /// Output path for the downloaded model.
    pub output: PathBuf,
    /// Whether to overwrite existing files.
    pub force: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            url: DEFAULT_MODEL_URL.to_string(),
            expected_sha256: DEFAULT_MODEL_SHA256.to_string(),
            output: default_model_cache_path(),
            force: false,
        }
    }
}

impl FetchOptions {
    /// Create new fetch options with a custom output path.
    pub fn with_output(mut self, output: PathBuf) -> Self {
        self.output = output;
        self
    }

    /// Set whether to overwrite existing files.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

/// The directory downloaded models are kept in.
///
/// `$LOGOTRACE_MODEL_CACHE_DIR` when set, otherwise `<cache dir>/logo-trace`
/// (`~/.cache/logo-trace` on Linux), or the current directory as a last resort.
pub fn default_model_cache_dir() -> PathBuf {
    let env_override = std::env::var_os(ENV_MODEL_CACHE_DIR).map(PathBuf::from);
    resolve_cache_dir(env_override, dirs::cache_dir())
}

fn resolve_cache_dir(env_override: Option<PathBuf>, system_cache_dir: Option<PathBuf>) -> PathBuf {
    if let Some(path) = env_override
        && !path.as_os_str().is_empty()
    {
        return path;
    }

    system_cache_dir
        .map(|path| path.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Where `fetch_model` saves the model by default.
pub fn default_model_cache_path() -> PathBuf {
    default_model_cache_dir().join(MODEL_FILENAME)
}

/// Writer that hashes and reports progress for everything written to the file.
struct VerifyingWriter<'a> {
    file: File,
    hasher: Sha256,
    written: u64,
    progress: &'a ProgressBar,
}

impl Write for VerifyingWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let n = self.file.write(buf)?;
        self.hasher.update(&buf[..n]);
        self.written += n as u64;
        self.progress.set_position(self.written);
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.file.flush()
    }
}

/// Stream `reader` into `temp_path`, removing the file again if the transfer
/// breaks off or the checksum is wrong.
fn download_and_verify<R: Read>(
    reader: &mut R,
    temp_path: &Path,
    expected_sha256: &str,
    progress: &ProgressBar,
) -> PipelineResult<()> {
    let mut writer = VerifyingWriter {
        file: File::create(temp_path)?,
        hasher: Sha256::new(),
        written: 0,
        progress,
    };
    let copied = io::copy(reader, &mut writer).and_then(|_| writer.flush());
    let VerifyingWriter { file, hasher, .. } = writer;
    drop(file);
    if let Err(err) = copied {
        let _ = fs::remove_file(temp_path);
        return Err(PipelineError::Download(err.to_string()));
    }
    progress.finish_with_message("download complete");

    let actual_hash = format!("{:x}", hasher.finalize());
    if !actual_hash.eq_ignore_ascii_case(expected_sha256) {
        let _ = fs::remove_file(temp_path);
        return Err(PipelineError::Download(format!(
            "checksum verification failed: expected {expected_sha256}, got {actual_hash}"
        )));
    }
    info!("checksum verified");
    Ok(())
}

/// Download the model with a progress bar and verify its checksum.
///
/// An existing file is kept unless `force` is set.
pub fn fetch_model(options: &FetchOptions) -> PipelineResult<PathBuf> {
    if options.output.exists() && !options.force {
        warn!(
            path = %options.output.display(),
            "model already exists, pass --force to overwrite"
        );
        return Ok(options.output.clone());
    }

    if let Some(parent) = options.output.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    info!(url = %options.url, path = %options.output.display(), "downloading model");

    let response = ureq::get(&options.url)
        .call()
        .map_err(|error| match error {
            ureq::Error::StatusCode(status) => PipelineError::Download(format!("HTTP error {status}")),
            other => PipelineError::Download(other.to_string()),
        })?;
    let total_size = response.body().content_length().unwrap_or(0);

    let pb = ProgressBar::new(total_size);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})")
            .map_err(|e| PipelineError::Download(e.to_string()))?
            .progress_chars("#>-"),
    );

    let temp_path = options.output.with_extension("onnx.tmp");
    let mut reader = response.into_body().into_reader();
    download_and_verify(&mut reader, &temp_path, &options.expected_sha256, &pb)?;

    if options.force && options.output.exists() {
        fs::remove_file(&options.output)?;
    }
    fs::rename(&temp_path, &options.output)?;

    info!(path = %options.output.display(), "model saved");
    if options.output != default_model_cache_path() {
        info!(
            "pass --model or set {ENV_MODEL_PATH}={} to use this model",
            options.output.display()
        );
    }

    Ok(options.output.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    mod cache_dir {
        use super::*;

        #[test]
        fn env_override_wins() {
            let custom = PathBuf::from("/tmp/models");
            let resolved = resolve_cache_dir(Some(custom.clone()), Some("/var/cache".into()));
            assert_eq!(resolved, custom);
        }

        #[test]
        fn empty_override_is_ignored() {
            let resolved = resolve_cache_dir(Some(PathBuf::new()), Some("/var/cache".into()));
            assert_eq!(resolved, PathBuf::from("/var/cache").join(APP_DIR_NAME));
        }

        #[test]
        fn current_dir_is_last_resort() {
            assert_eq!(resolve_cache_dir(None, None), PathBuf::from("."));
        }

        #[test]
        fn cache_path_ends_with_model_filename() {
            let path = default_model_cache_path();
            assert_eq!(path.file_name().and_then(|n| n.to_str()), Some(MODEL_FILENAME));
        }
    }

    mod fetch {
        use super::*;

        #[test]
        fn defaults_point_at_rembg_release() {
            let options = FetchOptions::default().with_force(true);

            assert!(options.url.starts_with("https://github.com/danielgatis/rembg/"));
            assert_eq!(options.expected_sha256.len(), 64);
            assert!(options.force);
        }

        #[test]
        fn existing_model_is_kept_without_force() {
            let dir = tempfile::tempdir().expect("failed to create temp dir");
            let output = dir.path().join("model.onnx");
            fs::write(&output, b"cached").expect("failed to write model");

            let options = FetchOptions::default().with_output(output.clone());
            let saved = fetch_model(&options).expect("existing model should be reused");

            assert_eq!(saved, output);
            assert_eq!(fs::read(&output).expect("failed to read model"), b"cached");
        }

        #[test]
        fn matching_checksum_keeps_download() {
            let dir = tempfile::tempdir().expect("failed to create temp dir");
            let temp_path = dir.path().join("model.onnx.tmp");
            let payload = vec![7u8; 20_000];
            let digest = format!("{:X}", Sha256::digest(&payload));

            download_and_verify(
                &mut Cursor::new(payload.clone()),
                &temp_path,
                &digest,
                &ProgressBar::hidden(),
            )
            .expect("checksum should match");

            assert_eq!(fs::read(&temp_path).expect("failed to read download"), payload);
        }

        /// Hands out one chunk, then fails like a dropped connection.
        struct BrokenStream {
            sent: bool,
        }

        impl Read for BrokenStream {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                if self.sent {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::ConnectionReset,
                        "connection reset",
                    ));
                }
                self.sent = true;
                let n = buf.len().min(16);
                buf[..n].fill(0xAB);
                Ok(n)
            }
        }

        #[test]
        fn interrupted_transfer_removes_partial_file() {
            let dir = tempfile::tempdir().expect("failed to create temp dir");
            let temp_path = dir.path().join("model.onnx.tmp");

            let error = download_and_verify(
                &mut BrokenStream { sent: false },
                &temp_path,
                DEFAULT_MODEL_SHA256,
                &ProgressBar::hidden(),
            )
            .expect_err("transfer should fail");

            assert!(matches!(error, PipelineError::Download(_)));
            assert!(error.to_string().contains("connection reset"));
            assert!(!temp_path.exists());
        }

        #[test]
        fn checksum_mismatch_removes_partial_file() {
            let dir = tempfile::tempdir().expect("failed to create temp dir");
            let temp_path = dir.path().join("model.onnx.tmp");

            let error = download_and_verify(
                &mut Cursor::new(b"logo-trace-model-bytes".to_vec()),
                &temp_path,
                "00ff",
                &ProgressBar::hidden(),
            )
            .expect_err("checksum should not match");

            assert!(matches!(error, PipelineError::Download(_)));
            assert!(!temp_path.exists());
        }
    }
}
