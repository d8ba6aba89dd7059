//! Self-contained HTML report assembly (`spec.md` §4.6, §6).
//!
//! Grounded on the teacher's `io::writers::html::HtmlWriter`: a static
//! template loaded with `include_str!` and populated by placeholder
//! substitution, rather than a templating-engine dependency. Trace and
//! improvement fragments are rendered once and embedded twice — inside a
//! hidden container the page script copies into the shared `<dialog>`,
//! and inline as a `<details>` fallback for environments without
//! JavaScript — exactly per `spec.md` §4.6's "both... once... and once".

use html_escape::encode_text;

use crate::core::Language;
use crate::metrics::{AnalysisResult, Category, CategoryMetrics};
use crate::report::baseline::BaselineReport;
use crate::report::{improvement, trace};
use crate::scoring::{CategoryScore, ScoredResult, ScoringConfig};

const TEMPLATE: &str = include_str!("templates/report.html");

pub fn render(
    result: &ScoredResult,
    config: &ScoringConfig,
    raw_results: &[AnalysisResult],
    baseline: Option<&BaselineReport>,
    languages: &[Language],
    project_name: &str,
) -> String {
    let mut sections = String::new();
    let mut fragments = String::new();

    for category in &result.categories {
        let (section, fragment) = render_category(category, config, raw_results, baseline, languages);
        sections.push_str(&section);
        fragments.push_str(&fragment);
    }

    let baseline_delta = baseline
        .map(|b| {
            format!(
                "<p class=\"baseline-delta\">Baseline composite: {base:.1} ({delta:+.1})</p>",
                base = b.composite_score,
                delta = result.composite_score - b.composite_score,
            )
        })
        .unwrap_or_default();

    TEMPLATE
        .replace("{{{PROJECT_NAME}}}", &encode_text(project_name))
        .replace("{{{TIER}}}", result.tier())
        .replace("{{{COMPOSITE_SCORE}}}", &format!("{:.1}", result.composite_score))
        .replace("{{{BASELINE_DELTA}}}", &baseline_delta)
        .replace("{{{CATEGORY_SECTIONS}}}", &sections)
        .replace("{{{TRACE_FRAGMENTS}}}", &fragments)
}

fn category_enum(name: &str) -> Option<Category> {
    Category::ALL.into_iter().find(|c| c.display_name() == name)
}

fn c7_result<'a>(raw_results: &'a [AnalysisResult]) -> Option<&'a crate::metrics::C7Metrics> {
    raw_results.iter().find_map(|r| match &r.metrics {
        CategoryMetrics::C7(m) => Some(m),
        _ => None,
    })
}

fn render_category(
    category_score: &CategoryScore,
    config: &ScoringConfig,
    raw_results: &[AnalysisResult],
    baseline: Option<&BaselineReport>,
    languages: &[Language],
) -> (String, String) {
    let category = category_enum(&category_score.name);
    let category_config = category.and_then(|c| config.category(c));
    let c7_metrics = category.filter(|c| *c == Category::C7AgentEvaluation).and_then(|_| c7_result(raw_results));

    let baseline_score = baseline.and_then(|b| b.category(&category_score.name)).map(|c| c.score);
    let delta_html = baseline_score
        .map(|b| format!(" <span class=\"delta\">({:+.1})</span>", category_score.score - b))
        .unwrap_or_default();

    let mut rows = String::new();
    let mut fragments = String::new();

    for sub in &category_score.sub_scores {
        let metric_config = category_config.and_then(|c| c.metric(&sub.metric_name));

        let (trace_html, improve_html) = if category == Some(Category::C7AgentEvaluation) {
            let metric_result = c7_metrics.and_then(|m| m.results().into_iter().find(|r| r.metric_id == sub.metric_name));
            let trace_html = metric_result.map(|r| trace::render_c7_trace(&sub.metric_name, r));
            let improve_html = metric_config.and_then(|c| improvement::render(Category::C7AgentEvaluation, c, sub, languages));
            (trace_html, improve_html)
        } else {
            let trace_html = metric_config.map(|c| trace::render_breakpoint_trace(c, sub));
            let improve_html = category
                .zip(metric_config)
                .and_then(|(cat, c)| improvement::render(cat, c, sub, languages));
            (trace_html, improve_html)
        };

        let view_trace_button = trace_html
            .as_ref()
            .map(|_| format!("<button type=\"button\" data-view-trace=\"{m}\">View Trace</button>", m = encode_text(&sub.metric_name)))
            .unwrap_or_default();
        // `trace_html` is itself a `<details>` fragment, so embedding it
        // directly in the row doubles as the no-JS fallback; the copy in
        // `fragments` below is what the dialog script clones.
        let fallback_trace = trace_html.clone().unwrap_or_default();
        let improve_inline = improve_html.unwrap_or_default();

        rows.push_str(&format!(
            "<tr><td>{name}</td><td>{score}</td><td>{available}</td>\
             <td class=\"metric-row\">{view_trace_button}{fallback_trace}</td>\
             <td>{improve_inline}</td></tr>\n",
            name = encode_text(&sub.metric_name),
            score = if sub.available { format!("{:.1}", sub.score) } else { "—".to_string() },
            available = if sub.available { "yes" } else { "no" },
        ));

        if let Some(t) = &trace_html {
            fragments.push_str(&format!("<div data-metric=\"{m}\">{t}</div>\n", m = encode_text(&sub.metric_name)));
        }
    }

    let section = format!(
        "<section class=\"category\"><h2>{name} — {score:.1}{delta_html}</h2>\n\
         <table><thead><tr><th>Metric</th><th>Score</th><th>Available</th><th>Trace</th><th>Improve</th></tr></thead>\n\
         <tbody>\n{rows}</tbody></table></section>\n",
        name = encode_text(&category_score.name),
        score = category_score.score,
    );

    (section, fragments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::engine::score_all;

    #[test]
    fn renders_a_document_with_composite_score_and_no_external_resources() {
        let result = score_all(&[], &ScoringConfig::default());
        let html = render(&result, &ScoringConfig::default(), &[], None, &[Language::Rust], "demo");
        assert!(html.contains("<!DOCTYPE html>"));
        assert!(html.contains(&format!("{:.1}", result.composite_score)));
        assert!(!html.contains("http://"));
        assert!(!html.contains("https://"));
    }

    #[test]
    fn escapes_project_name() {
        let result = score_all(&[], &ScoringConfig::default());
        let html = render(&result, &ScoringConfig::default(), &[], None, &[], "<script>alert(1)</script>");
        assert!(!html.contains("<script>alert(1)</script>"));
    }
}
