//! Optical character recognition collaborator.
//!
//! The margin-protection logic only needs one capability: given a small image
//! region, does it contain recognizable script or digits? That capability is
//! modeled as the [`TextRecognizer`] trait so the engine can be swapped or
//! absent entirely. When no engine is available the pipeline still runs; the
//! margin detector treats every candidate as text (fail-open, see
//! [`crate::detect::MarginTextDetector`]).
//!
//! The production implementation shells out to the Tesseract binary, located
//! with `which` at construction time. A fresh process is spawned per region,
//! so concurrent callers need no shared engine state.

use image::GrayImage;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// Default OCR languages: Arabic plus Latin digits/headers.
pub const DEFAULT_OCR_LANGUAGES: &str = "ara+eng";

/// Default per-invocation timeout in seconds.
pub const DEFAULT_OCR_TIMEOUT_SECS: u64 = 20;

/// Poll interval while waiting for the OCR process.
const WAIT_POLL_MILLIS: u64 = 20;

// ============================================================
// Error Types
// ============================================================

/// OCR error types
#[derive(Debug, Error)]
pub enum OcrError {
    #[error("no OCR engine available")]
    Unavailable,

    #[error("OCR timed out after {0}s")]
    Timeout(u64),

    #[error("OCR failed: {0}")]
    Failed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image encode error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, OcrError>;

// ============================================================
// Configuration
// ============================================================

/// OCR engine configuration.
///
/// Passed explicitly to whoever constructs a recognizer; there is no ambient
/// engine state anywhere in the crate.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Whether margin candidates should be sent to an engine at all.
    /// When false every candidate is protected.
    pub enabled: bool,
    /// Tesseract language codes, e.g. `"ara+eng"`.
    pub languages: String,
    /// Explicit engine binary path; `None` searches `PATH`.
    pub binary: Option<PathBuf>,
    /// Per-invocation timeout in seconds. Expiry is treated as "protect".
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            languages: DEFAULT_OCR_LANGUAGES.to_string(),
            binary: None,
            timeout_secs: DEFAULT_OCR_TIMEOUT_SECS,
        }
    }
}

// ============================================================
// Recognizer trait
// ============================================================

/// Black-box text recognition over a small grayscale region.
pub trait TextRecognizer: Send + Sync {
    /// Recognize text in the region. The raw engine output is returned;
    /// callers decide what counts as a confirmation (see
    /// [`contains_script`]).
    fn recognize(&self, region: &GrayImage) -> Result<String>;

    /// Human-readable engine description for logs and reports.
    fn describe(&self) -> String;
}

/// Whether recognized text still has content once punctuation and whitespace
/// are stripped. Alphanumeric here is Unicode-aware, so Arabic letters and
/// Arabic-Indic digits count.
pub fn contains_script(text: &str) -> bool {
    text.chars().any(char::is_alphanumeric)
}

// ============================================================
// Null implementation
// ============================================================

/// Recognizer used when no engine is configured or found.
///
/// Always reports [`OcrError::Unavailable`], which the margin detector maps
/// to "protect the region".
#[derive(Debug, Default)]
pub struct NullRecognizer;

impl TextRecognizer for NullRecognizer {
    fn recognize(&self, _region: &GrayImage) -> Result<String> {
        Err(OcrError::Unavailable)
    }

    fn describe(&self) -> String {
        "none (all margin candidates protected)".to_string()
    }
}

// ============================================================
// Tesseract implementation
// ============================================================

/// Tesseract CLI-backed recognizer.
pub struct TesseractRecognizer {
    binary: PathBuf,
    languages: String,
    timeout: Duration,
}

impl TesseractRecognizer {
    /// Locate the engine binary and build a recognizer from the config.
    ///
    /// Fails with [`OcrError::Unavailable`] when OCR is disabled or the
    /// binary cannot be found.
    pub fn discover(config: &OcrConfig) -> Result<Self> {
        if !config.enabled {
            return Err(OcrError::Unavailable);
        }

        let binary = match &config.binary {
            Some(path) if path.exists() => path.clone(),
            Some(path) => {
                debug!(path = %path.display(), "configured OCR binary not found");
                return Err(OcrError::Unavailable);
            }
            None => which::which("tesseract").map_err(|_| OcrError::Unavailable)?,
        };

        Ok(Self {
            binary,
            languages: config.languages.clone(),
            timeout: Duration::from_secs(config.timeout_secs.max(1)),
        })
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, region: &GrayImage) -> Result<String> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("region.png");
        region.save(&input)?;

        let mut cmd = Command::new(&self.binary);
        cmd.arg(&input)
            .arg("stdout")
            .args(["-l", &self.languages])
            // Single line of text: margin candidates are word/number sized.
            .args(["--psm", "7"]);

        let (status, stdout) = run_with_timeout(cmd, self.timeout)?;
        if !status.success() {
            return Err(OcrError::Failed(format!(
                "tesseract exited with {}",
                status
            )));
        }

        Ok(stdout)
    }

    fn describe(&self) -> String {
        format!("tesseract ({}, -l {})", self.binary.display(), self.languages)
    }
}

/// Build the best available recognizer for a config.
pub fn recognizer_from_config(config: &OcrConfig) -> Box<dyn TextRecognizer> {
    match TesseractRecognizer::discover(config) {
        Ok(engine) => {
            debug!(engine = %engine.describe(), "OCR engine ready");
            Box::new(engine)
        }
        Err(_) => {
            debug!("no OCR engine available, margin candidates will be protected");
            Box::new(NullRecognizer)
        }
    }
}

/// Run a command, killing it if it exceeds `timeout`.
///
/// Stdout is captured; stderr is discarded. OCR output for a margin
/// candidate is at most a few words, so reading after exit cannot deadlock
/// on the pipe buffer.
fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
) -> Result<(std::process::ExitStatus, String)> {
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()?;

    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            let mut output = String::new();
            if let Some(mut stdout) = child.stdout.take() {
                stdout.read_to_string(&mut output)?;
            }
            return Ok((status, output));
        }

        if start.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            return Err(OcrError::Timeout(timeout.as_secs()));
        }

        std::thread::sleep(Duration::from_millis(WAIT_POLL_MILLIS));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_recognizer_unavailable() {
        let region = GrayImage::new(10, 10);
        let result = NullRecognizer.recognize(&region);
        assert!(matches!(result, Err(OcrError::Unavailable)));
    }

    #[test]
    fn test_contains_script() {
        assert!(contains_script("42"));
        assert!(contains_script(" - 17 -"));
        assert!(contains_script("صفحة"));
        assert!(contains_script("١٢٣"));

        assert!(!contains_script(""));
        assert!(!contains_script("  \n\t"));
        assert!(!contains_script(".,;-—|"));
    }

    #[test]
    fn test_discover_disabled() {
        let config = OcrConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(matches!(
            TesseractRecognizer::discover(&config),
            Err(OcrError::Unavailable)
        ));
    }

    #[test]
    fn test_discover_missing_binary() {
        let config = OcrConfig {
            binary: Some(PathBuf::from("/nonexistent/tesseract")),
            ..Default::default()
        };
        assert!(matches!(
            TesseractRecognizer::discover(&config),
            Err(OcrError::Unavailable)
        ));
    }

    #[test]
    fn test_recognizer_from_config_disabled_is_null() {
        let config = OcrConfig {
            enabled: false,
            ..Default::default()
        };
        let recognizer = recognizer_from_config(&config);
        assert!(recognizer.describe().starts_with("none"));
    }

    #[test]
    fn test_config_default() {
        let config = OcrConfig::default();
        assert!(config.enabled);
        assert_eq!(config.languages, "ara+eng");
        assert_eq!(config.timeout_secs, 20);
        assert!(config.binary.is_none());
    }

    #[test]
    fn test_run_with_timeout_kills_hung_process() {
        let mut cmd = Command::new("sleep");
        cmd.arg("10");
        let result = run_with_timeout(cmd, Duration::from_millis(100));
        assert!(matches!(result, Err(OcrError::Timeout(_))));
    }

    #[test]
    fn test_run_with_timeout_captures_output() {
        let mut cmd = Command::new("echo");
        cmd.arg("hello");
        let (status, output) = run_with_timeout(cmd, Duration::from_secs(5)).unwrap();
        assert!(status.success());
        assert_eq!(output.trim(), "hello");
    }
}
