//! Report assembly (`spec.md` §4.6): JSON schema v2, self-contained HTML,
//! per-metric trace/improvement fragments, and baseline comparison.
//!
//! Grounded on the teacher's `output`/`io::writers` split: one submodule
//! per concrete output, a shared static template for HTML
//! (`io::writers::html::HtmlWriter`), and a tolerant baseline loader kept
//! decoupled from the emit path (the teacher's Design Notes equivalent).

pub mod baseline;
pub mod html;
pub mod improvement;
pub mod json;
pub mod trace;

use crate::core::Language;
use crate::metrics::{AnalysisResult, Category};
use crate::scoring::{ScoredResult, ScoringConfig};

/// A single improvement opportunity, trimmed from the teacher's
/// `output::unified::priority` recommendation shape down to what report
/// assembly needs: which metric, where it stands, and where it could go.
#[derive(Debug, Clone)]
pub struct Recommendation {
    pub category: String,
    pub metric_name: String,
    pub current_score: f64,
    pub next_target: f64,
    pub summary: String,
}

/// Every available metric scoring below 9.0, worst-first — the same cutoff
/// `report::improvement::render` uses for per-metric prompts, surfaced
/// here as a flat list for a report's top-of-page summary.
pub fn recommendations(result: &ScoredResult, config: &ScoringConfig) -> Vec<Recommendation> {
    let mut out = Vec::new();
    for category_score in &result.categories {
        let Some(category) = Category::ALL.into_iter().find(|c| c.display_name() == category_score.name) else {
            continue;
        };
        let Some(category_config) = config.category(category) else { continue };
        for sub in &category_score.sub_scores {
            if !sub.available || sub.score >= 9.0 {
                continue;
            }
            let Some(metric_config) = category_config.metric(&sub.metric_name) else { continue };
            let next_target = if category == Category::C7AgentEvaluation {
                improvement::next_target_c7(sub.score)
            } else {
                improvement::next_target_breakpoint(&metric_config.breakpoints, sub.score)
            };
            out.push(Recommendation {
                category: category_score.name.clone(),
                metric_name: sub.metric_name.clone(),
                current_score: sub.score,
                next_target,
                summary: metric_config.description.clone(),
            });
        }
    }
    out.sort_by(|a, b| a.current_score.partial_cmp(&b.current_score).unwrap_or(std::cmp::Ordering::Equal));
    out
}

/// Everything report assembly needs beyond the scored result itself.
pub struct ReportContext<'a> {
    pub scoring_config: &'a ScoringConfig,
    pub raw_results: &'a [AnalysisResult],
    pub baseline: Option<&'a baseline::BaselineReport>,
    pub languages: &'a [Language],
    pub project_name: &'a str,
}

pub fn render_json(result: &ScoredResult) -> serde_json::Result<String> {
    json::render(result)
}

pub fn render_html(result: &ScoredResult, ctx: &ReportContext<'_>) -> String {
    html::render(
        result,
        ctx.scoring_config,
        ctx.raw_results,
        ctx.baseline,
        ctx.languages,
        ctx.project_name,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::engine::score_all;

    #[test]
    fn recommendations_exclude_metrics_scoring_at_or_above_nine() {
        let result = score_all(&[], &ScoringConfig::default());
        let recs = recommendations(&result, &ScoringConfig::default());
        assert!(recs.iter().all(|r| r.current_score < 9.0));
    }

    #[test]
    fn recommendations_are_sorted_worst_first() {
        let result = score_all(&[], &ScoringConfig::default());
        let recs = recommendations(&result, &ScoringConfig::default());
        for pair in recs.windows(2) {
            assert!(pair[0].current_score <= pair[1].current_score);
        }
    }
}
