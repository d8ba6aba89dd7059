//! End-to-end scenarios against the full `analyze` pipeline, one test per
//! scenario named in `spec.md` §8 (S1-S6). Scratch repos are built with
//! `tempfile`, matching the teacher's integration-test style.

use std::path::PathBuf;
use std::process::Command;

use agentreadiness::agent::executor::{persist_capture, CapturedSample};
use agentreadiness::agent::AgentConfig;
use agentreadiness::core::discovery;
use agentreadiness::{analyze, RunConfig};

fn write(dir: &std::path::Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

fn git(dir: &std::path::Path, args: &[&str]) {
    let status = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_AUTHOR_NAME", "test")
        .env("GIT_AUTHOR_EMAIL", "test@example.com")
        .env("GIT_COMMITTER_NAME", "test")
        .env("GIT_COMMITTER_EMAIL", "test@example.com")
        .status()
        .expect("git must be on PATH for this test");
    assert!(status.success(), "git {args:?} failed");
}

/// S2: three in-module packages a -> b -> c -> a report exactly one
/// circular dependency, length 3, lexicographically least rotation first.
#[tokio::test]
async fn s2_three_file_cycle_is_reported_once() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "Cargo.toml", "[package]\nname = \"fixture\"\nversion = \"0.1.0\"\n");
    write(dir.path(), "src/a.rs", "use crate::b;\npub fn f() { b::g(); }\n");
    write(dir.path(), "src/b.rs", "use crate::c;\npub fn g() { c::h(); }\n");
    write(dir.path(), "src/c.rs", "use crate::a;\npub fn h() { a::f(); }\n");

    let targets = discovery::discover(dir.path());
    let config = RunConfig {
        skip_agent: true,
        ..RunConfig::default()
    };
    let output = analyze(&targets, dir.path(), &config).await;

    let c3 = output
        .raw_results
        .iter()
        .find_map(|r| match &r.metrics {
            agentreadiness::metrics::CategoryMetrics::C3(m) => Some(m),
            _ => None,
        })
        .expect("C3 result present");

    assert_eq!(c3.circular_dependencies.len(), 1);
    let cycle = &c3.circular_dependencies[0];
    assert_eq!(cycle.len(), 3);
    assert_eq!(cycle[0], *cycle.iter().min().unwrap());
}

/// S3: a target root with no `.git` directory yields an unavailable C5
/// category (no error, every C5 sub-score unavailable) and excludes it
/// from the composite.
#[tokio::test]
async fn s3_missing_git_excludes_c5_from_composite() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/lib.rs", "pub fn f() -> i32 { 1 }\n");

    let targets = discovery::discover(dir.path());
    let config = RunConfig {
        skip_agent: true,
        ..RunConfig::default()
    };
    let output = analyze(&targets, dir.path(), &config).await;

    let temporal = output.scored.category("Temporal Dynamics").expect("category present in report");
    assert_eq!(temporal.score, 0.0);
    assert!(temporal.sub_scores.iter().all(|s| !s.available));
    assert!(!temporal.has_available_metric());
}

/// S4: replay mode reproduces the same `MetricResult` across repeated
/// runs and never spawns the external agent process (verified indirectly:
/// no `agent-cli`-named binary needs to exist on `PATH` for this to pass).
#[tokio::test]
async fn s4_replay_is_deterministic_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/lib.rs", "pub fn f(x: i32) -> i32 { if x > 0 { x } else { -x } }\n");

    let debug_dir = tempfile::tempdir().unwrap();
    persist_capture(
        debug_dir.path(),
        &CapturedSample {
            metric_id: "m1_task_consistency".to_string(),
            sample_index: 0,
            file_path: Some(PathBuf::from("src/lib.rs")),
            prompt: "irrelevant, routing is by phrase".to_string(),
            response: Some(
                "this file is responsible for absolute-value style arithmetic helpers only".to_string(),
            ),
            duration_seconds: 0.01,
            error: None,
        },
    )
    .unwrap();

    let targets = discovery::discover(dir.path());
    let config = RunConfig {
        skip_agent: false,
        agent: AgentConfig {
            binary: "definitely-not-a-real-agent-binary".to_string(),
            debug_dir: Some(debug_dir.path().to_path_buf()),
            ..AgentConfig::default()
        },
        ..RunConfig::default()
    };

    let first = analyze(&targets, dir.path(), &config).await;
    let second = analyze(&targets, dir.path(), &config).await;

    let agent_score = |out: &agentreadiness::PipelineOutput| {
        out.scored
            .category("Agent Evaluation")
            .and_then(|c| c.sub_scores.iter().find(|s| s.metric_name == "m1_task_consistency"))
            .map(|s| s.score)
    };
    assert_eq!(agent_score(&first), agent_score(&second));
    assert!(agent_score(&first).is_some());
}

/// S5: evidence for a metric with more than five offending items is
/// truncated to the worst five, descending, through the full extraction
/// pipeline (not just the extractor unit in isolation).
#[tokio::test]
async fn s5_evidence_is_capped_at_five_through_the_full_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    // One function per complexity value in the S5 fixture set; `f0..f11`
    // chained `if` branches give predictable cyclomatic complexity.
    let complexities = [1, 2, 3, 5, 8, 13, 21, 34, 55, 89, 2, 2];
    let mut src = String::new();
    for (i, c) in complexities.iter().enumerate() {
        src.push_str(&format!("pub fn f{i}(x: i32) -> i32 {{\n    let mut y = x;\n"));
        for _ in 0..(c.saturating_sub(1)) {
            src.push_str("    if y > 0 { y -= 1; }\n");
        }
        src.push_str("    y\n}\n\n");
    }
    write(dir.path(), "src/lib.rs", &src);

    let targets = discovery::discover(dir.path());
    let config = RunConfig {
        skip_agent: true,
        ..RunConfig::default()
    };
    let output = analyze(&targets, dir.path(), &config).await;

    let code_health = output.scored.category("Code Health").expect("C1 category present");
    let complexity = code_health
        .sub_scores
        .iter()
        .find(|s| s.metric_name == "avg_cyclomatic_complexity")
        .expect("avg_cyclomatic_complexity sub-score present");

    assert!(complexity.evidence.len() <= 5);
    for pair in complexity.evidence.windows(2) {
        assert!(pair[0].value >= pair[1].value);
    }
}

/// S1 is interpolation-only (no filesystem state needed) and is already
/// covered exhaustively by `scoring::breakpoints`'s own unit tests; this
/// confirms the same table produces the same three values when driven
/// through the public `interpolate` entry point used elsewhere in tests.
#[test]
fn s1_breakpoint_table_matches_the_documented_scenario() {
    use agentreadiness::scoring::{interpolate, Breakpoint};
    let table = vec![
        Breakpoint::new(50.0, 10.0),
        Breakpoint::new(100.0, 8.0),
        Breakpoint::new(300.0, 6.0),
        Breakpoint::new(600.0, 3.0),
        Breakpoint::new(1000.0, 1.0),
    ];
    assert_eq!(interpolate(&table, 200.0), 7.0);
    assert_eq!(interpolate(&table, 1500.0), 1.0);
    assert_eq!(interpolate(&table, 25.0), 10.0);
}

/// S3 variant with a real (but commit-less) `.git` directory: git is
/// present but the log is empty, which must still report `Available`
/// rather than treating "no commits" as an error.
#[tokio::test]
async fn s3b_git_present_but_empty_log_is_available_and_zeroed() {
    let dir = tempfile::tempdir().unwrap();
    git(dir.path(), &["init", "-q"]);
    write(dir.path(), "src/lib.rs", "pub fn f() -> i32 { 1 }\n");

    let targets = discovery::discover(dir.path());
    let config = RunConfig {
        skip_agent: true,
        ..RunConfig::default()
    };
    let output = analyze(&targets, dir.path(), &config).await;

    let c5 = output
        .raw_results
        .iter()
        .find_map(|r| match &r.metrics {
            agentreadiness::metrics::CategoryMetrics::C5(m) => Some(m),
            _ => None,
        })
        .expect("C5 result present");
    assert!(c5.available);
    assert_eq!(c5.total_commits, 0);
}
