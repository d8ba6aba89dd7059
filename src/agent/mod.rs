//! C7 Agent Evaluation: the bounded agent-evaluation subsystem
//! (`spec.md` §4.4). Ties together sample selection (`samples`), prompt
//! templates (`prompts`), the `Executor` abstraction (`executor`), and
//! heuristic response scoring (`scoring`) into one `AnalysisResult`.

pub mod executor;
pub mod prompts;
pub mod samples;
pub mod scoring;

use crate::core::AnalysisTarget;
use crate::errors::AgentReadinessError;
use crate::metrics::{AnalysisResult, C7Metrics, Category, CategoryMetrics, DebugSample, MetricResult, ScoreTrace};
use executor::{CapturedSample, Executor};
use samples::SampleContext;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Per-metric sample cap (`agent::samples` module doc table). Kept here
/// too since it governs the mean's denominator, not just selection.
const MAX_CONCURRENT_SAMPLES: usize = 4;

#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Name or path of the external agent CLI binary, located via `which`
    /// when it's a bare name.
    pub binary: String,
    pub per_sample_timeout: Duration,
    /// When `Some`, governs capture/replay mode (`spec.md` §4.4, §6):
    /// empty directory ⇒ capture, non-empty ⇒ replay.
    pub debug_dir: Option<PathBuf>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            binary: "agent-cli".to_string(),
            per_sample_timeout: Duration::from_secs(60),
            debug_dir: None,
        }
    }
}

struct MetricSpec {
    id: &'static str,
    score_fn: fn(&str) -> ScoreTrace,
}

const METRIC_SPECS: [MetricSpec; 5] = [
    MetricSpec { id: "m1_task_consistency", score_fn: scoring::score_m1 },
    MetricSpec { id: "m2_behavior_comprehension", score_fn: scoring::score_m2 },
    MetricSpec { id: "m3_cross_file_navigation", score_fn: scoring::score_m3 },
    MetricSpec { id: "m4_identifier_interpretability", score_fn: scoring::score_m4 },
    MetricSpec { id: "m5_documentation_accuracy", score_fn: scoring::score_m5 },
];

/// Runs all five C7 metrics against `targets`, using `prior_results` (the
/// already-computed C1/C3 results) to drive sample selection. Never
/// returns `Err`: a metric with zero eligible samples or an unreachable
/// agent binary is simply reported unavailable, per `spec.md` §4.4.
pub async fn analyze(
    targets: &[AnalysisTarget],
    prior_results: &[AnalysisResult],
    config: &AgentConfig,
) -> AnalysisResult {
    let (executor, capture_mode) = match build_executor(config) {
        Ok(pair) => pair,
        Err(e) => {
            tracing::warn!(error = %e, "C7 executor unavailable, category unavailable");
            return unavailable();
        }
    };
    let executor = Arc::new(executor);

    let mut metrics = C7Metrics::default();
    for spec in METRIC_SPECS {
        let contexts = select_samples(spec.id, targets, prior_results);
        let result = run_metric(spec, contexts, &executor, capture_mode, config.debug_dir.as_deref()).await;
        assign(&mut metrics, spec.id, result);
    }

    AnalysisResult {
        category: Category::C7AgentEvaluation,
        metrics: CategoryMetrics::C7(metrics),
    }
}

fn build_executor(config: &AgentConfig) -> Result<(Executor, bool), AgentReadinessError> {
    match &config.debug_dir {
        Some(dir) => {
            if executor::debug_dir_is_empty(dir) {
                let cli = executor::CliExecutor::locate(&config.binary, config.per_sample_timeout)?;
                Ok((Executor::Cli(cli), true))
            } else {
                let replay = executor::ReplayExecutor::load(dir)?;
                Ok((Executor::Replay(replay), false))
            }
        }
        None => {
            let cli = executor::CliExecutor::locate(&config.binary, config.per_sample_timeout)?;
            Ok((Executor::Cli(cli), false))
        }
    }
}

fn select_samples(metric_id: &str, targets: &[AnalysisTarget], prior: &[AnalysisResult]) -> Vec<SampleContext> {
    match metric_id {
        "m1_task_consistency" => samples::select_m1(prior),
        "m2_behavior_comprehension" => samples::select_m2(prior),
        "m3_cross_file_navigation" => samples::select_m3(prior),
        "m4_identifier_interpretability" => samples::select_m4(targets),
        "m5_documentation_accuracy" => samples::select_m5(targets),
        _ => Vec::new(),
    }
}

fn assign(metrics: &mut C7Metrics, metric_id: &str, result: MetricResult) {
    match metric_id {
        "m1_task_consistency" => metrics.m1_task_consistency = Some(result),
        "m2_behavior_comprehension" => metrics.m2_behavior_comprehension = Some(result),
        "m3_cross_file_navigation" => metrics.m3_cross_file_navigation = Some(result),
        "m4_identifier_interpretability" => metrics.m4_identifier_interpretability = Some(result),
        "m5_documentation_accuracy" => metrics.m5_documentation_accuracy = Some(result),
        _ => {}
    }
}

/// Dispatches every sample for one metric through a bounded worker pool
/// (`spec.md` §5: "samples for a metric may be run in parallel via a
/// bounded worker pool... the trace array preserves sample order by
/// sample index, not completion order"). Results are collated by index
/// once every worker has returned, independent of completion order.
async fn run_metric(
    spec: MetricSpec,
    contexts: Vec<SampleContext>,
    executor: &Arc<Executor>,
    capture_mode: bool,
    debug_dir: Option<&std::path::Path>,
) -> MetricResult {
    if contexts.is_empty() {
        return MetricResult {
            metric_id: spec.id.to_string(),
            score: 0,
            available: false,
            debug_samples: Vec::new(),
        };
    }

    // Workers share no mutable state beyond this append-only results slice
    // guarded by a single lock (`spec.md` §5); each worker writes its own
    // index once, so lock contention never blocks the critical path.
    let sample_count = contexts.len();
    let results: Arc<parking_lot::Mutex<Vec<Option<(Option<PathBuf>, String, executor::ExecutionOutcome)>>>> =
        Arc::new(parking_lot::Mutex::new((0..sample_count).map(|_| None).collect()));
    let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_SAMPLES));
    let mut handles = Vec::with_capacity(sample_count);
    for (index, ctx) in contexts.into_iter().enumerate() {
        let executor = Arc::clone(executor);
        let semaphore = Arc::clone(&semaphore);
        let results = Arc::clone(&results);
        let prompt = ctx.to_prompt();
        let file_path = ctx.file_path();
        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.expect("semaphore never closed");
            let outcome = executor.execute(&prompt, index).await;
            results.lock()[index] = Some((file_path, prompt, outcome));
        }));
    }
    for handle in handles {
        let _ = handle.await;
    }
    let ordered = Arc::try_unwrap(results)
        .expect("all worker tasks joined, no remaining clones")
        .into_inner();

    let mut debug_samples = Vec::with_capacity(ordered.len());
    let mut scored: Vec<i32> = Vec::new();

    for (index, entry) in ordered.into_iter().enumerate() {
        let Some((file_path, prompt, outcome)) = entry else { continue };
        let trace = outcome.response.as_deref().map(|r| (spec.score_fn)(r));
        if let Some(t) = &trace {
            scored.push(t.final_score);
        }

        if capture_mode {
            if let Some(dir) = debug_dir {
                let _ = executor::persist_capture(
                    dir,
                    &CapturedSample {
                        metric_id: spec.id.to_string(),
                        sample_index: index,
                        file_path: file_path.clone(),
                        prompt: prompt.clone(),
                        response: outcome.response.clone(),
                        duration_seconds: outcome.duration_seconds,
                        error: outcome.error.clone(),
                    },
                );
            }
        }

        debug_samples.push(DebugSample {
            metric_id: spec.id.to_string(),
            sample_index: index,
            file_path,
            prompt,
            response: outcome.response,
            duration_seconds: outcome.duration_seconds,
            error: outcome.error,
            trace,
        });
    }

    if scored.is_empty() {
        return MetricResult {
            metric_id: spec.id.to_string(),
            score: 0,
            available: false,
            debug_samples,
        };
    }

    let mean = scored.iter().sum::<i32>() as f64 / scored.len() as f64;
    let score = mean.round().clamp(1.0, 10.0) as i32;

    MetricResult {
        metric_id: spec.id.to_string(),
        score,
        available: true,
        debug_samples,
    }
}

fn unavailable() -> AnalysisResult {
    AnalysisResult {
        category: Category::C7AgentEvaluation,
        metrics: CategoryMetrics::C7(C7Metrics::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{C1Metrics, FunctionComplexity};

    fn prior_with_complex_function() -> Vec<AnalysisResult> {
        vec![AnalysisResult {
            category: Category::C1CodeHealth,
            metrics: CategoryMetrics::C1(C1Metrics {
                functions: vec![FunctionComplexity {
                    file: "a.rs".into(),
                    function: "f".into(),
                    line: 1,
                    cyclomatic: 15,
                    length: 20,
                }],
                ..Default::default()
            }),
        }]
    }

    #[tokio::test]
    async fn replay_mode_never_spawns_subprocess_and_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = samples::select_m2(&prior_with_complex_function());
        let prompt = ctx[0].to_prompt();
        executor::persist_capture(
            dir.path(),
            &CapturedSample {
                metric_id: "m2_behavior_comprehension".to_string(),
                sample_index: 0,
                file_path: Some("a.rs".into()),
                prompt,
                response: Some("it computes the responsible result and handles the edge case".to_string()),
                duration_seconds: 0.05,
                error: None,
            },
        )
        .unwrap();

        let config = AgentConfig {
            debug_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let targets: Vec<AnalysisTarget> = Vec::new();
        let prior = prior_with_complex_function();

        let first = analyze(&targets, &prior, &config).await;
        let second = analyze(&targets, &prior, &config).await;

        let CategoryMetrics::C7(m1) = first.metrics else { panic!() };
        let CategoryMetrics::C7(m2) = second.metrics else { panic!() };
        assert_eq!(
            m1.m2_behavior_comprehension.as_ref().unwrap().score,
            m2.m2_behavior_comprehension.as_ref().unwrap().score
        );
        assert!(m1.m2_behavior_comprehension.unwrap().available);
    }

    #[tokio::test]
    async fn zero_samples_marks_metric_unavailable_with_score_zero() {
        let dir = tempfile::tempdir().unwrap();
        // A non-empty (but irrelevant) debug directory forces replay mode so
        // this test never needs a real agent binary on PATH.
        executor::persist_capture(
            dir.path(),
            &CapturedSample {
                metric_id: "unused_metric".to_string(),
                sample_index: 0,
                file_path: None,
                prompt: "irrelevant".to_string(),
                response: Some("irrelevant".to_string()),
                duration_seconds: 0.0,
                error: None,
            },
        )
        .unwrap();
        let config = AgentConfig {
            debug_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        // No prior C1 result and no Rust targets => every selector returns empty.
        let result = analyze(&[], &[], &config).await;
        let CategoryMetrics::C7(m) = result.metrics else { panic!() };
        assert_eq!(m.results().len(), 5);
        for r in m.results() {
            assert_eq!(r.score, 0);
            assert!(!r.available);
        }
    }
}
