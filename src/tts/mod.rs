//! Speech synthesis through the Piper CLI.
//!
//! Piper runs as a scoped subprocess: spawn with piped stdio, feed the text
//! on stdin, read raw PCM from stdout, wrap it in a WAV container. The child
//! is spawned with `kill_on_drop` and collected under a deadline, so a hung
//! or cancelled synthesis never leaks a process.

pub mod wav;

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::timeout;

use crate::config::ServiceConfig;

/// Deadline for a single synthesis run.
const SYNTHESIS_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors from the speech synthesizer.
#[derive(Debug, Error)]
pub enum TtsError {
    /// Request text was empty or whitespace-only (client input error).
    #[error("Text cannot be empty")]
    EmptyText,

    /// The configured voice model file does not exist (startup failure).
    #[error("Voice model not found: {0}")]
    VoiceModelMissing(PathBuf),

    /// The Piper executable could not be located.
    #[error("Piper command '{0}' not found. Make sure piper-tts is installed.")]
    ToolNotInstalled(String),

    /// Piper exited non-zero; carries its diagnostic output.
    #[error("Piper TTS failed: {0}")]
    SynthesisFailed(String),

    /// Piper did not finish within the synthesis deadline.
    #[error("Piper TTS timed out after {0:?}")]
    Timeout(Duration),

    /// I/O failure talking to the subprocess.
    #[error("Piper I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Text-to-speech service invoking Piper with a configured voice model.
pub struct TtsService {
    piper_bin: String,
    voice_model: PathBuf,
    speech_rate: f32,
    timeout: Duration,
}

impl TtsService {
    /// Create the service, verifying the voice model exists.
    ///
    /// Fails fast: a missing model file is a startup error, not something
    /// deferred to the first synthesis call.
    pub fn new(config: &ServiceConfig) -> Result<Self, TtsError> {
        let voice_model = PathBuf::from(&config.voice_model);
        if !voice_model.exists() {
            return Err(TtsError::VoiceModelMissing(voice_model));
        }
        log::info!(
            "TTS service initialized with model {} (rate {}x)",
            voice_model.display(),
            config.speech_rate
        );
        Ok(Self {
            piper_bin: config.piper_bin.clone(),
            voice_model,
            speech_rate: config.speech_rate,
            timeout: SYNTHESIS_TIMEOUT,
        })
    }

    /// Override the synthesis deadline (tests use a short one).
    #[cfg(test)]
    fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Synthesize text to a complete WAV file.
    ///
    /// `rate` overrides the configured default speech rate for this call
    /// (Piper length-scale: >1.0 slower/clearer, <1.0 faster).
    pub async fn synthesize(&self, text: &str, rate: Option<f32>) -> Result<Vec<u8>, TtsError> {
        if text.trim().is_empty() {
            return Err(TtsError::EmptyText);
        }
        let rate = rate.unwrap_or(self.speech_rate);

        let mut child = Command::new(&self.piper_bin)
            .arg("--model")
            .arg(&self.voice_model)
            .arg("--length-scale")
            .arg(rate.to_string())
            .arg("--output-raw")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TtsError::ToolNotInstalled(self.piper_bin.clone())
                } else {
                    TtsError::Io(e)
                }
            })?;

        // Feed stdin and collect output concurrently, all under one
        // deadline. The writer must not run ahead of the reader: a child
        // that fills its stdout pipe before draining stdin would deadlock a
        // sequential write-then-wait. kill_on_drop reaps the child if the
        // deadline fires or the request is cancelled while we wait.
        let stdin = child.stdin.take();
        let input = text.as_bytes().to_vec();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                let _ = stdin.write_all(&input).await;
                let _ = stdin.shutdown().await;
            }
        };

        let output = timeout(self.timeout, async {
            let (_, output) = tokio::join!(feed, child.wait_with_output());
            output
        })
        .await
        .map_err(|_| TtsError::Timeout(self.timeout))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(TtsError::SynthesisFailed(stderr));
        }

        Ok(wav::wrap_pcm(&output.stdout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config_with(dir: &tempfile::TempDir, piper_bin: &str) -> ServiceConfig {
        let voice = dir.path().join("voice.onnx");
        std::fs::write(&voice, b"stub model").unwrap();
        ServiceConfig {
            piper_bin: piper_bin.to_string(),
            voice_model: voice.to_string_lossy().into_owned(),
            ..ServiceConfig::default()
        }
    }

    #[cfg(unix)]
    fn fake_piper(dir: &tempfile::TempDir, script_body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.path().join("fake-piper");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", script_body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_missing_voice_model_fails_fast() {
        let config = ServiceConfig {
            voice_model: "/definitely/not/here.onnx".to_string(),
            ..ServiceConfig::default()
        };
        match TtsService::new(&config) {
            Err(TtsError::VoiceModelMissing(path)) => {
                assert!(path.to_string_lossy().contains("not/here.onnx"));
            }
            other => panic!("expected VoiceModelMissing, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_empty_text_rejected_before_spawn() {
        let dir = tempdir().unwrap();
        // Binary that does not exist: if the spawn happened, we would see a
        // different error than EmptyText.
        let service = TtsService::new(&config_with(&dir, "/no/such/piper")).unwrap();
        assert!(matches!(
            service.synthesize("   \n\t  ", None).await,
            Err(TtsError::EmptyText)
        ));
    }

    #[tokio::test]
    async fn test_missing_binary_reported_as_not_installed() {
        let dir = tempdir().unwrap();
        let service = TtsService::new(&config_with(&dir, "/no/such/piper")).unwrap();
        match service.synthesize("hello", None).await {
            Err(TtsError::ToolNotInstalled(bin)) => assert_eq!(bin, "/no/such/piper"),
            other => panic!("expected ToolNotInstalled, got {:?}", other.err()),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_success_wraps_stdout_in_wav() {
        let dir = tempdir().unwrap();
        let piper = fake_piper(&dir, "cat >/dev/null; printf 'ABCD'");
        let service = TtsService::new(&config_with(&dir, &piper)).unwrap();

        let wav = service.synthesize("The cards reveal your path.", None).await.unwrap();
        assert_eq!(wav.len(), 4 + wav::HEADER_LEN);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[wav::HEADER_LEN..], b"ABCD");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_carries_stderr() {
        let dir = tempdir().unwrap();
        let piper = fake_piper(&dir, "cat >/dev/null; echo 'bad voice' >&2; exit 3");
        let service = TtsService::new(&config_with(&dir, &piper)).unwrap();

        match service.synthesize("hello", None).await {
            Err(TtsError::SynthesisFailed(stderr)) => assert_eq!(stderr, "bad voice"),
            other => panic!("expected SynthesisFailed, got {:?}", other.err()),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stalled_child_hits_deadline_even_with_pending_stdin() {
        let dir = tempdir().unwrap();
        // Child never reads stdin and never exits: the deadline must cover
        // the stdin feed as well as the wait.
        let piper = fake_piper(&dir, "exec sleep 30");
        let service = TtsService::new(&config_with(&dir, &piper))
            .unwrap()
            .with_timeout(Duration::from_millis(200));

        let big_text = "and the wheel turns ".repeat(20_000);
        let started = std::time::Instant::now();
        match service.synthesize(&big_text, None).await {
            Err(TtsError::Timeout(_)) => {}
            other => panic!("expected Timeout, got {:?}", other.err()),
        }
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_large_io_in_both_directions_does_not_deadlock() {
        let dir = tempdir().unwrap();
        // Child floods stdout past the pipe buffer before draining stdin;
        // the stdin feed and output collection must be pipelined.
        let piper = fake_piper(
            &dir,
            "head -c 262144 /dev/zero; cat >/dev/null; printf 'END!'",
        );
        let service = TtsService::new(&config_with(&dir, &piper))
            .unwrap()
            .with_timeout(Duration::from_secs(15));

        let big_text = "the cards keep turning ".repeat(20_000);
        let wav = service.synthesize(&big_text, None).await.unwrap();
        assert_eq!(wav.len(), 262_144 + 4 + wav::HEADER_LEN);
        assert_eq!(&wav[wav.len() - 4..], b"END!");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_rate_override_passed_as_length_scale() {
        let dir = tempdir().unwrap();
        // Echo the arguments back so the test can see the length-scale value.
        let piper = fake_piper(&dir, "cat >/dev/null; printf '%s' \"$*\"");
        let service = TtsService::new(&config_with(&dir, &piper)).unwrap();

        let wav = service.synthesize("hello", Some(1.5)).await.unwrap();
        let args = String::from_utf8_lossy(&wav[wav::HEADER_LEN..]).into_owned();
        assert!(args.contains("--length-scale 1.5"));
        assert!(args.contains("--output-raw"));
    }
}
