//! "View Trace" HTML fragments: a breakpoint band table plus an evidence
//! table for C1-C6 metrics (`spec.md` §4.5), and an indicator checklist
//! plus collapsible prompt/response samples for C7 (`spec.md` §4.4, §6).
//!
//! Each fragment is a `<details>` element so it works without JavaScript;
//! the HTML document (`report::html`) additionally wires a "View Trace"
//! button to pop the same markup into the shared `<dialog>`.

use html_escape::encode_text;

use crate::metrics::MetricResult;
use crate::scoring::config::MetricConfig;
use crate::scoring::{breakpoints, SubScore};

pub fn render_breakpoint_trace(config: &MetricConfig, sub: &SubScore) -> String {
    let mut rows = String::new();
    let current = breakpoints::current_band_index(&config.breakpoints, sub.raw_value);
    for (i, bp) in config.breakpoints.iter().enumerate() {
        let is_current = i == current || i + 1 == current;
        rows.push_str(&format!(
            "<tr class=\"{cls}\"><td>{value}</td><td>{score}</td></tr>\n",
            cls = if is_current { "current-band" } else { "" },
            value = bp.value,
            score = bp.score,
        ));
    }

    let mut evidence_rows = String::new();
    for item in &sub.evidence {
        evidence_rows.push_str(&format!(
            "<tr><td>{file}</td><td>{line}</td><td>{value}</td><td>{desc}</td></tr>\n",
            file = encode_text(&item.file_path.display().to_string()),
            line = item.line,
            value = item.value,
            desc = encode_text(&item.description),
        ));
    }
    if evidence_rows.is_empty() {
        evidence_rows = "<tr><td colspan=\"4\"><em>No evidence recorded</em></td></tr>\n".to_string();
    }

    format!(
        "<details class=\"trace\" data-metric=\"{metric}\">\n\
         <summary>{metric} — raw {raw}, score {score:.1}</summary>\n\
         <p>{description}</p>\n\
         <table class=\"breakpoints\"><thead><tr><th>Value</th><th>Score</th></tr></thead>\n\
         <tbody>\n{rows}</tbody></table>\n\
         <table class=\"evidence\"><thead><tr><th>File</th><th>Line</th><th>Value</th><th>Description</th></tr></thead>\n\
         <tbody>\n{evidence_rows}</tbody></table>\n\
         </details>",
        metric = encode_text(&config.name),
        raw = sub.raw_value,
        score = sub.score,
        description = encode_text(&config.description),
    )
}

pub fn render_c7_trace(metric_id: &str, result: &MetricResult) -> String {
    let mut samples_html = String::new();
    for sample in &result.debug_samples {
        let indicator_html = sample
            .trace
            .as_ref()
            .map(|trace| {
                let mut items = String::new();
                for indicator in &trace.indicators {
                    items.push_str(&format!(
                        "<li class=\"{state}\">{name} ({delta:+})</li>\n",
                        state = if indicator.matched { "matched" } else { "unmatched" },
                        name = encode_text(&indicator.name),
                        delta = indicator.delta,
                    ));
                }
                format!(
                    "<p>base {base}, final <strong>{final_score}</strong></p><ul class=\"indicators\">{items}</ul>",
                    base = trace.base_score,
                    final_score = trace.final_score,
                )
            })
            .unwrap_or_else(|| "<p><em>No response scored</em></p>".to_string());

        samples_html.push_str(&format!(
            "<details class=\"sample\">\n\
             <summary>sample {index} — {file}{error}</summary>\n\
             {indicator_html}\n\
             <details><summary>prompt</summary><pre>{prompt}</pre></details>\n\
             <details><summary>response</summary><pre>{response}</pre></details>\n\
             </details>\n",
            index = sample.sample_index,
            file = sample
                .file_path
                .as_ref()
                .map(|p| encode_text(&p.display().to_string()).into_owned())
                .unwrap_or_else(|| "(none)".to_string()),
            error = sample
                .error
                .as_ref()
                .map(|e| format!(" — error: {}", encode_text(e)))
                .unwrap_or_default(),
            prompt = encode_text(&sample.prompt),
            response = encode_text(sample.response.as_deref().unwrap_or("")),
        ));
    }

    format!(
        "<details class=\"trace\" data-metric=\"{metric_id}\">\n\
         <summary>{metric_id} — score {score}, {available}</summary>\n\
         {samples_html}\n\
         </details>",
        metric_id = encode_text(metric_id),
        score = result.score,
        available = if result.available { "available" } else { "unavailable" },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::DebugSample;
    use crate::metrics::{ScoreIndicator, ScoreTrace};
    use crate::scoring::breakpoints::Breakpoint;
    use crate::scoring::EvidenceItem;
    use std::path::PathBuf;

    #[test]
    fn breakpoint_trace_includes_evidence_rows() {
        let config = MetricConfig {
            name: "avg_cyclomatic_complexity".into(),
            weight: 0.25,
            breakpoints: vec![Breakpoint::new(2.0, 10.0), Breakpoint::new(40.0, 1.0)],
            description: "description".into(),
            how_to_improve: Vec::new(),
        };
        let sub = SubScore {
            metric_name: "avg_cyclomatic_complexity".into(),
            raw_value: 12.0,
            score: 5.0,
            weight: 0.25,
            available: true,
            evidence: vec![EvidenceItem {
                file_path: PathBuf::from("a.rs"),
                line: 10,
                value: 25.0,
                description: "complex function".into(),
            }],
        };
        let html = render_breakpoint_trace(&config, &sub);
        assert!(html.contains("a.rs"));
        assert!(html.contains("complex function"));
        assert!(html.contains("current-band"));
    }

    #[test]
    fn c7_trace_renders_one_details_block_per_sample() {
        let result = MetricResult {
            metric_id: "m2_behavior_comprehension".into(),
            score: 8,
            available: true,
            debug_samples: vec![DebugSample {
                metric_id: "m2_behavior_comprehension".into(),
                sample_index: 0,
                file_path: Some(PathBuf::from("a.rs")),
                prompt: "explain <script>".into(),
                response: Some("it computes".into()),
                duration_seconds: 0.1,
                error: None,
                trace: Some(ScoreTrace::new(
                    2,
                    vec![ScoreIndicator {
                        name: "behavior_understanding".into(),
                        matched: true,
                        delta: 1,
                    }],
                )),
            }],
        };
        let html = render_c7_trace("m2_behavior_comprehension", &result);
        assert!(html.contains("sample 0"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
