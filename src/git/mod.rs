//! C5 Temporal Dynamics: a streaming `git log` reader that derives churn,
//! temporal-coupling, author-fragmentation, commit-stability, and
//! hotspot-concentration metrics from commit history (`spec.md` §4.3).
//!
//! The reader owns the child's stdout pipe and waits on the process only
//! after reaching EOF (read-all-then-wait, `spec.md` §5), so a 25-second
//! watchdog thread can kill a runaway process without deadlocking the pipe.

use crate::metrics::{AnalysisResult, C5Metrics, Category, CategoryMetrics, CoupledPair, Hotspot};
use std::collections::{HashMap, HashSet};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const DEADLINE: Duration = Duration::from_secs(25);
const SINCE_WINDOW: &str = "6.months.ago";
const CHURN_WINDOW_DAYS: i64 = 90;
const AUTHOR_WINDOW_DAYS: i64 = 90;
const BULK_COMMIT_FILE_LIMIT: usize = 50;
const MIN_COMMITS_FOR_COUPLING: u32 = 5;
const COUPLING_THRESHOLD: f64 = 0.70;
const STABLE_SENTINEL_DAYS: f64 = 30.0;

struct Commit {
    #[allow(dead_code)]
    hash: String,
    author: String,
    timestamp: i64,
    files: Vec<PathBuf>,
    lines_changed: u64,
}

/// Repo-level analyzer entry point (`targets[0].RootDir`; file lists
/// unused). Never returns `Err` — every failure mode downgrades to
/// `Available=false`, per `spec.md` §4.3's failure semantics.
pub fn analyze(root_dir: &Path) -> AnalysisResult {
    if !root_dir.join(".git").is_dir() {
        tracing::info!(root = %root_dir.display(), "no .git directory, C5 unavailable");
        return unavailable();
    }

    match run_git_log(root_dir) {
        Ok(Some(commits)) => AnalysisResult {
            category: Category::C5TemporalDynamics,
            metrics: CategoryMetrics::C5(compute_metrics(&commits)),
        },
        Ok(None) => {
            tracing::warn!("git log deadline exceeded, C5 unavailable");
            unavailable()
        }
        Err(e) => {
            tracing::warn!(error = %e, "git log failed, C5 unavailable");
            unavailable()
        }
    }
}

fn unavailable() -> AnalysisResult {
    AnalysisResult {
        category: Category::C5TemporalDynamics,
        metrics: CategoryMetrics::C5(C5Metrics {
            available: false,
            ..C5Metrics::default()
        }),
    }
}

/// Spawns `git log` with a streaming `--numstat` body, enforces the
/// 25-second cooperative deadline via a watchdog thread, and parses commits
/// line by line without materializing the raw log text. Returns `Ok(None)`
/// if the deadline expired.
fn run_git_log(root_dir: &Path) -> Result<Option<Vec<Commit>>, crate::errors::AgentReadinessError> {
    let mut child = Command::new("git")
        .current_dir(root_dir)
        .args([
            "log",
            "--no-merges",
            "--numstat",
            &format!("--since={SINCE_WINDOW}"),
            "--pretty=format:@@%H|%ae|%at",
        ])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| crate::errors::AgentReadinessError::external_process("git", e.to_string()))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| crate::errors::AgentReadinessError::external_process("git", "no stdout pipe"))?;

    let killed = Arc::new(AtomicBool::new(false));
    let child_id = child.id();
    let watchdog_killed = Arc::clone(&killed);
    let done = Arc::new(AtomicBool::new(false));
    let watchdog_done = Arc::clone(&done);
    let watchdog = std::thread::spawn(move || {
        let start = std::time::Instant::now();
        while start.elapsed() < DEADLINE {
            if watchdog_done.load(Ordering::SeqCst) {
                return;
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        if !watchdog_done.load(Ordering::SeqCst) {
            watchdog_killed.store(true, Ordering::SeqCst);
            kill_pid(child_id);
        }
    });

    let reader = BufReader::new(stdout);
    let commits = parse_commits(reader);

    done.store(true, Ordering::SeqCst);
    let _ = child.wait();
    let _ = watchdog.join();

    if killed.load(Ordering::SeqCst) {
        return Ok(None);
    }
    Ok(Some(commits))
}

#[cfg(unix)]
fn kill_pid(pid: u32) {
    let _ = Command::new("kill").arg("-9").arg(pid.to_string()).status();
}

#[cfg(not(unix))]
fn kill_pid(pid: u32) {
    let _ = Command::new("taskkill").args(["/F", "/PID", &pid.to_string()]).status();
}

fn parse_commits(reader: BufReader<impl std::io::Read>) -> Vec<Commit> {
    let mut commits = Vec::new();
    let mut current: Option<Commit> = None;

    for line in reader.lines().map_while(Result::ok) {
        if let Some(header) = line.strip_prefix("@@") {
            if let Some(c) = current.take() {
                commits.push(c);
            }
            if let Some(parsed) = parse_header(header) {
                current = Some(parsed);
            }
        } else if line.trim().is_empty() {
            continue;
        } else if let Some(commit) = current.as_mut() {
            apply_numstat_line(commit, &line);
        }
    }
    if let Some(c) = current.take() {
        commits.push(c);
    }
    commits
}

fn parse_header(header: &str) -> Option<Commit> {
    let mut parts = header.splitn(3, '|');
    let hash = parts.next()?.to_string();
    let author = parts.next()?.to_string();
    let timestamp = parts.next()?.trim().parse::<i64>().ok()?;
    Some(Commit {
        hash,
        author,
        timestamp,
        files: Vec::new(),
        lines_changed: 0,
    })
}

fn apply_numstat_line(commit: &mut Commit, line: &str) {
    let mut fields = line.splitn(3, '\t');
    let Some(added) = fields.next() else { return };
    let Some(deleted) = fields.next() else { return };
    let Some(raw_path) = fields.next() else { return };

    if added == "-" || deleted == "-" {
        return;
    }
    let (Ok(added), Ok(deleted)) = (added.parse::<u64>(), deleted.parse::<u64>()) else {
        return;
    };
    commit.lines_changed += added + deleted;
    commit.files.push(resolve_rename(raw_path));
}

/// Resolves git's rename notations (`old => new` and the shorter
/// `dir/{old => new}/rest`) to the file's final path.
fn resolve_rename(raw: &str) -> PathBuf {
    if let Some(start) = raw.find('{') {
        if let Some(end_rel) = raw[start..].find('}') {
            let end = start + end_rel;
            let inner = &raw[start + 1..end];
            if let Some((_old, new)) = inner.split_once(" => ") {
                let mut result = String::new();
                result.push_str(&raw[..start]);
                result.push_str(new.trim());
                result.push_str(&raw[end + 1..]);
                return PathBuf::from(result);
            }
        }
    }
    if let Some((_old, new)) = raw.split_once(" => ") {
        return PathBuf::from(new.trim());
    }
    PathBuf::from(raw)
}

fn compute_metrics(commits: &[Commit]) -> C5Metrics {
    if commits.is_empty() {
        return C5Metrics {
            available: true,
            total_commits: 0,
            ..C5Metrics::default()
        };
    }

    let latest_ts = commits.iter().map(|c| c.timestamp).max().unwrap_or(0);
    let churn_cutoff = latest_ts - CHURN_WINDOW_DAYS * 86_400;
    let author_cutoff = latest_ts - AUTHOR_WINDOW_DAYS * 86_400;

    let churn_commits: Vec<&Commit> = commits.iter().filter(|c| c.timestamp >= churn_cutoff).collect();
    let churn_rate = if churn_commits.is_empty() {
        0.0
    } else {
        churn_commits.iter().map(|c| c.lines_changed as f64).sum::<f64>() / churn_commits.len() as f64
    };

    let non_bulk: Vec<&Commit> = commits
        .iter()
        .filter(|c| c.files.len() <= BULK_COMMIT_FILE_LIMIT)
        .collect();

    let (temporal_coupling_pct, coupled_pairs) = compute_coupling(&non_bulk);

    let author_fragmentation = compute_author_fragmentation(commits, author_cutoff);
    let commit_stability_days = compute_commit_stability(commits);
    let (hotspot_concentration, top_hotspots) = compute_hotspots(&non_bulk);

    C5Metrics {
        available: true,
        total_commits: commits.len() as u32,
        churn_rate,
        temporal_coupling_pct,
        coupled_pairs,
        author_fragmentation,
        commit_stability_days,
        hotspot_concentration,
        top_hotspots,
    }
}

fn compute_coupling(commits: &[&Commit]) -> (f64, Vec<CoupledPair>) {
    let mut per_file_commits: HashMap<PathBuf, u32> = HashMap::new();
    let mut shared: HashMap<(PathBuf, PathBuf), u32> = HashMap::new();

    for commit in commits {
        let mut files: Vec<PathBuf> = commit.files.clone();
        files.sort();
        files.dedup();
        for f in &files {
            *per_file_commits.entry(f.clone()).or_insert(0) += 1;
        }
        for i in 0..files.len() {
            for j in (i + 1)..files.len() {
                let key = (files[i].clone(), files[j].clone());
                *shared.entry(key).or_insert(0) += 1;
            }
        }
    }

    let mut eligible_count = 0u32;
    let mut coupled: Vec<CoupledPair> = Vec::new();

    for ((a, b), shared_commits) in &shared {
        let commits_a = per_file_commits.get(a).copied().unwrap_or(0);
        let commits_b = per_file_commits.get(b).copied().unwrap_or(0);
        if commits_a < MIN_COMMITS_FOR_COUPLING || commits_b < MIN_COMMITS_FOR_COUPLING {
            continue;
        }
        eligible_count += 1;
        let min_commits = commits_a.min(commits_b) as f64;
        let ratio = *shared_commits as f64 / min_commits;
        if ratio > COUPLING_THRESHOLD {
            coupled.push(CoupledPair {
                file_a: a.clone(),
                file_b: b.clone(),
                shared_commits: *shared_commits,
                coupling_ratio: ratio * 100.0,
            });
        }
    }

    coupled.sort_by(|a, b| {
        b.coupling_ratio
            .partial_cmp(&a.coupling_ratio)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.file_a.cmp(&b.file_a))
    });

    let pct = if eligible_count == 0 {
        0.0
    } else {
        coupled.len() as f64 / eligible_count as f64 * 100.0
    };
    (pct, coupled)
}

fn compute_author_fragmentation(commits: &[Commit], cutoff: i64) -> f64 {
    let mut authors_by_file: HashMap<&Path, HashSet<&str>> = HashMap::new();
    for commit in commits.iter().filter(|c| c.timestamp >= cutoff) {
        for f in &commit.files {
            authors_by_file.entry(f.as_path()).or_default().insert(commit.author.as_str());
        }
    }
    if authors_by_file.is_empty() {
        return 0.0;
    }
    let total: usize = authors_by_file.values().map(|s| s.len()).sum();
    total as f64 / authors_by_file.len() as f64
}

fn compute_commit_stability(commits: &[Commit]) -> f64 {
    let mut timestamps_by_file: HashMap<&Path, Vec<i64>> = HashMap::new();
    for commit in commits {
        for f in &commit.files {
            timestamps_by_file.entry(f.as_path()).or_default().push(commit.timestamp);
        }
    }

    let mut gaps_days: Vec<f64> = Vec::new();
    for timestamps in timestamps_by_file.values_mut() {
        timestamps.sort();
        for pair in timestamps.windows(2) {
            let gap_days = (pair[1] - pair[0]) as f64 / 86_400.0;
            gaps_days.push(gap_days);
        }
    }

    if gaps_days.is_empty() {
        return STABLE_SENTINEL_DAYS;
    }
    gaps_days.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    median(&gaps_days)
}

fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

fn compute_hotspots(commits: &[&Commit]) -> (f64, Vec<Hotspot>) {
    let mut changes_by_file: HashMap<&Path, u32> = HashMap::new();
    for commit in commits {
        for f in &commit.files {
            *changes_by_file.entry(f.as_path()).or_insert(0) += 1;
        }
    }
    if changes_by_file.is_empty() {
        return (0.0, Vec::new());
    }

    let total: u32 = changes_by_file.values().sum();
    let mut sorted: Vec<(&Path, u32)> = changes_by_file.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

    let decile_count = (sorted.len() as f64 / 10.0).ceil().max(1.0) as usize;
    let top = &sorted[..decile_count.min(sorted.len())];
    let top_sum: u32 = top.iter().map(|(_, c)| *c).sum();
    let concentration = if total == 0 { 0.0 } else { top_sum as f64 / total as f64 * 100.0 };

    let hotspots = top
        .iter()
        .map(|(file, changes)| Hotspot {
            file: file.to_path_buf(),
            changes: *changes,
        })
        .collect();

    (concentration, hotspots)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_plain_rename() {
        assert_eq!(resolve_rename("old/a.rs => new/b.rs"), PathBuf::from("new/b.rs"));
    }

    #[test]
    fn resolves_braced_rename() {
        assert_eq!(
            resolve_rename("src/{old => new}/mod.rs"),
            PathBuf::from("src/new/mod.rs")
        );
    }

    #[test]
    fn leaves_non_rename_paths_untouched() {
        assert_eq!(resolve_rename("src/lib.rs"), PathBuf::from("src/lib.rs"));
    }

    #[test]
    fn missing_git_dir_yields_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let result = analyze(dir.path());
        let CategoryMetrics::C5(m) = result.metrics else { panic!() };
        assert!(!m.available);
    }

    #[test]
    fn empty_commit_log_yields_zeroed_available_metrics() {
        let metrics = compute_metrics(&[]);
        assert!(metrics.available);
        assert_eq!(metrics.total_commits, 0);
        assert_eq!(metrics.churn_rate, 0.0);
    }

    #[test]
    fn coupling_pair_requires_min_commits_and_threshold() {
        let commits = vec![
            Commit {
                hash: "a".into(),
                author: "x".into(),
                timestamp: 0,
                files: vec![PathBuf::from("a.rs"), PathBuf::from("b.rs")],
                lines_changed: 10,
            },
            Commit {
                hash: "b".into(),
                author: "x".into(),
                timestamp: 1,
                files: vec![PathBuf::from("a.rs"), PathBuf::from("b.rs")],
                lines_changed: 10,
            },
            Commit {
                hash: "c".into(),
                author: "x".into(),
                timestamp: 2,
                files: vec![PathBuf::from("a.rs"), PathBuf::from("b.rs")],
                lines_changed: 10,
            },
            Commit {
                hash: "d".into(),
                author: "x".into(),
                timestamp: 3,
                files: vec![PathBuf::from("a.rs"), PathBuf::from("b.rs")],
                lines_changed: 10,
            },
            Commit {
                hash: "e".into(),
                author: "x".into(),
                timestamp: 4,
                files: vec![PathBuf::from("a.rs"), PathBuf::from("b.rs")],
                lines_changed: 10,
            },
        ];
        let refs: Vec<&Commit> = commits.iter().collect();
        let (pct, pairs) = compute_coupling(&refs);
        assert_eq!(pct, 100.0);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].shared_commits, 5);
    }

    #[test]
    fn median_of_even_count_averages_middle_two() {
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), 2.5);
    }
}
