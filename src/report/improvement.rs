//! "Improve" HTML fragments: a 4-section plain-text prompt (Context /
//! Build & Test / Task / Verification) embedded in an HTML copy container,
//! rendered for every available metric scoring below 9.0 (`spec.md` §4.6).

use html_escape::encode_text;

use crate::core::Language;
use crate::metrics::Category;
use crate::scoring::breakpoints::Breakpoint;
use crate::scoring::config::MetricConfig;
use crate::scoring::SubScore;

fn category_impact_blurb(category: Category) -> &'static str {
    match category {
        Category::C1CodeHealth => {
            "Lower complexity and smaller functions are easier for an agent to hold in context and modify safely."
        }
        Category::C2SemanticExplicitness => {
            "Explicit types and names reduce the inference an agent must do before it can act confidently."
        }
        Category::C3Architecture => {
            "A shallow, acyclic dependency graph lets an agent reason about a change's blast radius locally."
        }
        Category::C4Documentation => {
            "Up-to-date docs let an agent orient itself without reading every call site first."
        }
        Category::C5TemporalDynamics => {
            "Low churn and coupling make it safer for an agent to change one file without breaking its neighbors."
        }
        Category::C6Testing => {
            "A strong, isolated test suite gives an agent a fast, trustworthy signal that a change is correct."
        }
        Category::C7AgentEvaluation => {
            "These samples measure how well an agent actually performs the tasks the other categories predict it can."
        }
    }
}

fn build_command(languages: &[Language]) -> &'static str {
    if languages.contains(&Language::Rust) {
        "cargo build && cargo test"
    } else if languages.contains(&Language::TypeScript) || languages.contains(&Language::JavaScript) {
        "npm install && npm test"
    } else if languages.contains(&Language::Python) {
        "pip install -e . && pytest"
    } else {
        "(no recognized build tooling detected)"
    }
}

/// Next-target score for a C1-C6 metric: the smallest breakpoint score
/// strictly above the current score, i.e. "the next band up". Falls back
/// to 10.0 when the current score is already the table's maximum.
pub(crate) fn next_target_breakpoint(breakpoints: &[Breakpoint], current_score: f64) -> f64 {
    let mut scores: Vec<f64> = breakpoints.iter().map(|b| b.score).collect();
    scores.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    scores.dedup();
    scores.into_iter().find(|s| *s > current_score).unwrap_or(10.0)
}

/// `spec.md` §4.6: "C7 uses `min(current+2, 10)`".
pub(crate) fn next_target_c7(current_score: f64) -> f64 {
    (current_score + 2.0).min(10.0)
}

pub fn render(
    category: Category,
    config: &MetricConfig,
    sub: &SubScore,
    languages: &[Language],
) -> Option<String> {
    if !sub.available || sub.score >= 9.0 {
        return None;
    }

    let next_target = if category == Category::C7AgentEvaluation {
        next_target_c7(sub.score)
    } else {
        next_target_breakpoint(&config.breakpoints, sub.score)
    };

    let how_to_improve = config
        .how_to_improve
        .iter()
        .map(|bullet| format!("- {bullet}"))
        .collect::<Vec<_>>()
        .join("\n");

    let evidence = sub
        .evidence
        .iter()
        .take(5)
        .map(|e| format!("- {}:{} — {} (value {})", e.file_path.display(), e.line, e.description, e.value))
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = format!(
        "# Context\n\
         {description}. {impact}\n\
         Current score: {current:.1}/10. Target: {target:.1}/10.\n\n\
         # Build & Test\n\
         {build}\n\n\
         # Task\n\
         {how_to_improve}\n\n\
         # Verification\n\
         Re-run the analysis and confirm the {metric} score has moved toward the target.\n\
         Evidence driving this score:\n{evidence}",
        description = config.description,
        impact = category_impact_blurb(category),
        current = sub.score,
        target = next_target,
        build = build_command(languages),
        how_to_improve = if how_to_improve.is_empty() { "- Address the evidence below.".to_string() } else { how_to_improve },
        metric = config.name,
        evidence = if evidence.is_empty() { "(no evidence recorded)".to_string() } else { evidence },
    );

    Some(format!(
        "<div class=\"improve\" data-metric=\"{metric}\">\n\
         <pre class=\"copy-target\">{prompt}</pre>\n\
         <button type=\"button\" class=\"copy-button\" data-copy-target=\"prev\">Copy prompt</button>\n\
         </div>",
        metric = encode_text(&config.name),
        prompt = encode_text(&prompt),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::EvidenceItem;
    use std::path::PathBuf;

    fn config() -> MetricConfig {
        MetricConfig {
            name: "avg_cyclomatic_complexity".into(),
            weight: 0.25,
            breakpoints: vec![
                Breakpoint::new(2.0, 10.0),
                Breakpoint::new(10.0, 6.0),
                Breakpoint::new(40.0, 1.0),
            ],
            description: "Average cyclomatic complexity".into(),
            how_to_improve: vec!["Extract nested conditionals".into()],
        }
    }

    fn sub(score: f64, available: bool) -> SubScore {
        SubScore {
            metric_name: "avg_cyclomatic_complexity".into(),
            raw_value: 15.0,
            score,
            weight: 0.25,
            available,
            evidence: vec![EvidenceItem {
                file_path: PathBuf::from("a.rs"),
                line: 5,
                value: 22.0,
                description: "worst offender".into(),
            }],
        }
    }

    #[test]
    fn skips_metrics_scoring_at_or_above_nine() {
        assert!(render(Category::C1CodeHealth, &config(), &sub(9.0, true), &[Language::Rust]).is_none());
    }

    #[test]
    fn skips_unavailable_metrics() {
        assert!(render(Category::C1CodeHealth, &config(), &sub(3.0, false), &[Language::Rust]).is_none());
    }

    #[test]
    fn renders_four_sections_for_a_low_scoring_metric() {
        let html = render(Category::C1CodeHealth, &config(), &sub(5.0, true), &[Language::Rust]).unwrap();
        for section in ["# Context", "# Build &amp; Test", "# Task", "# Verification"] {
            assert!(html.contains(section), "missing {section} in {html}");
        }
        assert!(html.contains("cargo build"));
        assert!(html.contains("a.rs"));
    }

    #[test]
    fn c7_next_target_is_capped_at_ten() {
        assert_eq!(next_target_c7(9.5), 10.0);
        assert_eq!(next_target_c7(3.0), 5.0);
    }
}
