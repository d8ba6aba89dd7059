//! CLI entry point.
//!
//! Argument parsing is an external concern the core pipeline doesn't
//! depend on (`spec.md` §6) — this binary is a thin `clap` wrapper over
//! `agentreadiness::analyze`, mirroring the shape of the teacher's
//! `Cli`/`Commands` split without its multi-command surface, since this
//! crate only ever does one thing.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use agentreadiness::{self, analyze, config, core::discovery, observability, report, RunConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Html,
    Both,
}

/// Scores a repository's readiness for AI coding agents.
#[derive(Debug, Parser)]
#[command(name = "agentreadiness", version, about)]
struct Cli {
    /// Root directory of the project to analyze.
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Optional TOML file overriding default category weights and breakpoints.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Optional prior JSON report to diff against.
    #[arg(long)]
    baseline: Option<PathBuf>,

    /// Debug directory for C7 agent-evaluation capture/replay.
    #[arg(long)]
    debug_dir: Option<PathBuf>,

    /// Skips the C7 agent-evaluation category entirely.
    #[arg(long)]
    no_agent: bool,

    /// Name or path of the external agent CLI (located via `which` when bare).
    #[arg(long, default_value = "agent-cli")]
    agent_binary: String,

    #[arg(long, value_enum, default_value = "json")]
    format: Format,

    /// Output file; defaults to stdout for a single-format run and to
    /// `<path>.json` / `<path>.html` for `--format both`.
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn write_output(path: Option<&PathBuf>, content: &str) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, content).with_context(|| format!("writing {}", path.display())),
        None => {
            println!("{content}");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    observability::init_tracing(cli.verbose);
    observability::install_panic_hook();

    let scoring_config = config::load(cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("loading scoring config")?;

    let targets = discovery::discover(&cli.path);
    let languages = agentreadiness::languages_of(&targets);

    let run_config = RunConfig {
        scoring: scoring_config,
        agent: agentreadiness::agent::AgentConfig {
            binary: cli.agent_binary.clone(),
            debug_dir: cli.debug_dir.clone(),
            ..agentreadiness::agent::AgentConfig::default()
        },
        skip_agent: cli.no_agent,
    };

    let output = analyze(&targets, &cli.path, &run_config).await;

    let baseline = match &cli.baseline {
        Some(path) => {
            let text = std::fs::read_to_string(path).with_context(|| format!("reading baseline {}", path.display()))?;
            Some(report::baseline::load(&text).map_err(|e| anyhow::anyhow!("{e}")).context("parsing baseline report")?)
        }
        None => None,
    };

    let project_name = cli
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| cli.path.display().to_string());

    match cli.format {
        Format::Json => {
            let json = report::render_json(&output.scored).context("rendering JSON report")?;
            write_output(cli.output.as_ref(), &json)?;
        }
        Format::Html => {
            let ctx = report::ReportContext {
                scoring_config: &run_config.scoring,
                raw_results: &output.raw_results,
                baseline: baseline.as_ref(),
                languages: &languages,
                project_name: &project_name,
            };
            let html = report::render_html(&output.scored, &ctx);
            write_output(cli.output.as_ref(), &html)?;
        }
        Format::Both => {
            let json = report::render_json(&output.scored).context("rendering JSON report")?;
            let ctx = report::ReportContext {
                scoring_config: &run_config.scoring,
                raw_results: &output.raw_results,
                baseline: baseline.as_ref(),
                languages: &languages,
                project_name: &project_name,
            };
            let html = report::render_html(&output.scored, &ctx);
            let base = cli.output.clone().unwrap_or_else(|| PathBuf::from("agentreadiness"));
            write_output(Some(&base.with_extension("json")), &json)?;
            write_output(Some(&base.with_extension("html")), &html)?;
        }
    }

    Ok(())
}
