//! The `Executor` abstraction (`spec.md` §4.4): a tagged variant with a
//! single method returning `(response, duration, error)`, implemented once
//! for a live CLI agent subprocess and once for deterministic replay from a
//! debug directory of captured JSON samples.

use crate::agent::prompts;
use crate::errors::AgentReadinessError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub response: Option<String>,
    pub duration_seconds: f64,
    pub error: Option<String>,
}

/// Flat JSON file shape persisted to / loaded from the debug directory,
/// exactly `{metric_id, sample_index, file_path, prompt, response,
/// duration_seconds, error}` per `spec.md` §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapturedSample {
    pub metric_id: String,
    pub sample_index: usize,
    pub file_path: Option<PathBuf>,
    pub prompt: String,
    pub response: Option<String>,
    pub duration_seconds: f64,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AgentCliOutput {
    result: String,
}

pub enum Executor {
    Cli(CliExecutor),
    Replay(ReplayExecutor),
}

impl Executor {
    pub async fn execute(&self, prompt: &str, sample_index: usize) -> ExecutionOutcome {
        match self {
            Executor::Cli(e) => e.execute(prompt).await,
            Executor::Replay(e) => e.execute(prompt, sample_index),
        }
    }
}

pub struct CliExecutor {
    binary: PathBuf,
    timeout: Duration,
}

impl CliExecutor {
    /// Locates the agent binary via `which` (reusing the teacher's existing
    /// dependency rather than hand-rolling `PATH` search).
    pub fn locate(binary_name: &str, timeout: Duration) -> Result<Self, AgentReadinessError> {
        let binary = which::which(binary_name)
            .map_err(|e| AgentReadinessError::external_process(binary_name, e.to_string()))?;
        Ok(Self { binary, timeout })
    }

    pub fn new(binary: PathBuf, timeout: Duration) -> Self {
        Self { binary, timeout }
    }

    /// Spawns the agent with read-only tool access and structured JSON
    /// output, writes the prompt to stdin, and parses the `result` field
    /// from stdout. Honors the per-sample timeout (`spec.md` §5): an
    /// expired sample reports an error and is excluded from the mean.
    async fn execute(&self, prompt: &str) -> ExecutionOutcome {
        let start = Instant::now();
        let run = async {
            let mut child = Command::new(&self.binary)
                .arg("--output-format")
                .arg("json")
                .arg("--allowed-tools")
                .arg("Read,Glob,Grep")
                .stdin(std::process::Stdio::piped())
                .stdout(std::process::Stdio::piped())
                .stderr(std::process::Stdio::piped())
                .spawn()
                .map_err(|e| e.to_string())?;

            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(prompt.as_bytes()).await.map_err(|e| e.to_string())?;
            }

            let output = child.wait_with_output().await.map_err(|e| e.to_string())?;
            if !output.status.success() {
                return Err(format!(
                    "agent exited with status {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr)
                ));
            }
            let parsed: AgentCliOutput =
                serde_json::from_slice(&output.stdout).map_err(|e| format!("malformed agent output: {e}"))?;
            Ok(parsed.result)
        };

        match tokio::time::timeout(self.timeout, run).await {
            Ok(Ok(result)) => ExecutionOutcome {
                response: Some(result),
                duration_seconds: start.elapsed().as_secs_f64(),
                error: None,
            },
            Ok(Err(e)) => ExecutionOutcome {
                response: None,
                duration_seconds: start.elapsed().as_secs_f64(),
                error: Some(e),
            },
            Err(_) => ExecutionOutcome {
                response: None,
                duration_seconds: self.timeout.as_secs_f64(),
                error: Some("sample timed out".to_string()),
            },
        }
    }
}

pub struct ReplayExecutor {
    samples: HashMap<(String, usize), CapturedSample>,
}

impl ReplayExecutor {
    /// Loads every `{metric_id}_{sample_index}.json` file in the debug
    /// directory up front; `execute` routes by the prompt's distinctive
    /// phrase rather than trusting the caller's own notion of metric id,
    /// since the `Executor` contract exposes only `(prompt, sample_index)`.
    pub fn load(debug_dir: &Path) -> Result<Self, AgentReadinessError> {
        let mut samples = HashMap::new();
        let entries = std::fs::read_dir(debug_dir)
            .map_err(|e| AgentReadinessError::io(e.to_string(), Some(debug_dir.to_path_buf())))?;

        for entry in entries {
            let entry = entry.map_err(|e| AgentReadinessError::io(e.to_string(), Some(debug_dir.to_path_buf())))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let content = std::fs::read_to_string(&path)
                .map_err(|e| AgentReadinessError::io(e.to_string(), Some(path.clone())))?;
            let sample: CapturedSample = serde_json::from_str(&content)
                .map_err(|e| AgentReadinessError::parse_load(e.to_string(), "json", path.clone()))?;
            samples.insert((sample.metric_id.clone(), sample.sample_index), sample);
        }

        Ok(Self { samples })
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    fn execute(&self, prompt: &str, sample_index: usize) -> ExecutionOutcome {
        let Some(metric_id) = prompts::route_metric(prompt) else {
            return ExecutionOutcome {
                response: None,
                duration_seconds: 0.0,
                error: Some("could not route replay prompt to a metric".to_string()),
            };
        };
        match self.samples.get(&(metric_id.to_string(), sample_index)) {
            Some(sample) => ExecutionOutcome {
                response: sample.response.clone(),
                duration_seconds: sample.duration_seconds,
                error: sample.error.clone(),
            },
            None => ExecutionOutcome {
                response: None,
                duration_seconds: 0.0,
                error: Some(format!("no captured sample for {metric_id}[{sample_index}]")),
            },
        }
    }
}

/// Directory is empty (or absent) ⇒ capture mode; non-empty ⇒ replay mode
/// (`spec.md` §4.4, §6).
pub fn debug_dir_is_empty(debug_dir: &Path) -> bool {
    match std::fs::read_dir(debug_dir) {
        Ok(mut entries) => entries.next().is_none(),
        Err(_) => true,
    }
}

pub fn persist_capture(debug_dir: &Path, sample: &CapturedSample) -> Result<(), AgentReadinessError> {
    std::fs::create_dir_all(debug_dir).map_err(|e| AgentReadinessError::io(e.to_string(), Some(debug_dir.to_path_buf())))?;
    let path = debug_dir.join(format!("{}_{}.json", sample.metric_id, sample.sample_index));
    let json = serde_json::to_string_pretty(sample)
        .map_err(|e| AgentReadinessError::invariant(format!("failed to serialize captured sample: {e}")))?;
    std::fs::write(&path, json).map_err(|e| AgentReadinessError::io(e.to_string(), Some(path)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replay_routes_by_distinctive_phrase_not_stored_metric_id() {
        let dir = tempfile::tempdir().unwrap();
        let sample = CapturedSample {
            metric_id: "m2_behavior_comprehension".to_string(),
            sample_index: 0,
            file_path: None,
            prompt: prompts::m2_prompt("a.rs", "f", 1, 12),
            response: Some("it does x".to_string()),
            duration_seconds: 0.1,
            error: None,
        };
        persist_capture(dir.path(), &sample).unwrap();

        let executor = ReplayExecutor::load(dir.path()).unwrap();
        let outcome = executor.execute(&sample.prompt, 0);
        assert_eq!(outcome.response.as_deref(), Some("it does x"));
    }

    #[test]
    fn missing_capture_reports_error_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        let executor = ReplayExecutor::load(dir.path()).unwrap();
        let outcome = executor.execute(&prompts::m1_prompt("a.rs"), 2);
        assert!(outcome.response.is_none());
        assert!(outcome.error.is_some());
    }

    #[test]
    fn empty_directory_detected_as_capture_mode() {
        let dir = tempfile::tempdir().unwrap();
        assert!(debug_dir_is_empty(dir.path()));
    }
}
