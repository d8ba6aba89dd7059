//! Heuristic response scoring for the five C7 metrics (`spec.md` §4.4).
//!
//! Each metric declares a metric-specific base score and a list of
//! thematic indicator groups: a set of case-insensitive substrings
//! representing one semantic concept. A group contributes its delta at
//! most once regardless of how many of its member phrases match ("grouped
//! scoring", preventing saturation — see S6). Negative indicators
//! (hedging, explicit failure) are each scored individually rather than
//! grouped, since any one of them is independently informative.

use crate::metrics::{ScoreIndicator, ScoreTrace};

/// One thematic concept: matches if any phrase is a substring of the
/// (lowercased) response. `delta` is the group's contribution when
/// matched; unmatched groups still appear in the trace with `delta = 0`.
struct IndicatorGroup {
    name: &'static str,
    phrases: &'static [&'static str],
    delta: i32,
}

fn matches(response_lower: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| response_lower.contains(p))
}

fn score_groups(response: &str, base_score: i32, groups: &[IndicatorGroup]) -> ScoreTrace {
    let lower = response.to_lowercase();
    let indicators = groups
        .iter()
        .map(|g| {
            let matched = matches(&lower, g.phrases);
            ScoreIndicator {
                name: g.name.to_string(),
                matched,
                delta: g.delta,
            }
        })
        .collect();
    ScoreTrace::new(base_score, indicators)
}

// ---------------------------------------------------------------------
// M1 Task Consistency (base 3)
// ---------------------------------------------------------------------

const M1_GROUPS: &[IndicatorGroup] = &[
    IndicatorGroup {
        name: "names_responsibility",
        phrases: &["responsible for", "primary responsibility", "purpose of this file", "this file's role"],
        delta: 1,
    },
    IndicatorGroup {
        name: "provides_restatement",
        phrases: &["in other words", "put differently", "restated", "to rephrase", "another way to say"],
        delta: 1,
    },
    IndicatorGroup {
        name: "sufficient_detail",
        phrases: &[],
        delta: 1,
    },
    IndicatorGroup {
        name: "hedging",
        phrases: &["i'm not sure", "it's unclear", "hard to say", "cannot determine"],
        delta: -1,
    },
    IndicatorGroup {
        name: "contradicts_itself",
        phrases: &["actually, wait", "on second thought", "no longer", "that's wrong", "i take that back"],
        delta: -1,
    },
];

/// M1 has a length-based "sufficient detail" bonus that can't be
/// expressed as a fixed phrase list, so it's special-cased rather than
/// folded into `M1_GROUPS`'s declarative table.
pub fn score_m1(response: &str) -> ScoreTrace {
    let lower = response.to_lowercase();
    let indicators = M1_GROUPS
        .iter()
        .map(|g| {
            let matched = if g.name == "sufficient_detail" {
                response.len() > 200
            } else {
                matches(&lower, g.phrases)
            };
            ScoreIndicator {
                name: g.name.to_string(),
                matched,
                delta: g.delta,
            }
        })
        .collect();
    ScoreTrace::new(3, indicators)
}

// ---------------------------------------------------------------------
// M2 Behavior Comprehension (base 2). Six positive groups, so a response
// matching every one lands at 2 + 6 = 8, per S6.
// ---------------------------------------------------------------------

const M2_GROUPS: &[IndicatorGroup] = &[
    IndicatorGroup {
        name: "control_flow",
        phrases: &["if ", "loop", "iterates", "branches", "recursion", "recursive"],
        delta: 1,
    },
    IndicatorGroup {
        name: "edge_cases",
        phrases: &["edge case", "boundary", "empty input", "zero-length", "overflow"],
        delta: 1,
    },
    IndicatorGroup {
        name: "error_handling",
        phrases: &["error", "panics", "exception", "returns err", "propagates the failure"],
        delta: 1,
    },
    IndicatorGroup {
        name: "behavior_understanding",
        phrases: &["computes", "returns", "produces", "responsible for", "its purpose is"],
        delta: 1,
    },
    IndicatorGroup {
        name: "state_mutation",
        phrases: &["mutates", "modifies", "updates state", "side effect", "in place"],
        delta: 1,
    },
    IndicatorGroup {
        name: "complexity_awareness",
        phrases: &["complex", "nested", "multiple branches", "cyclomatic", "many paths"],
        delta: 1,
    },
    IndicatorGroup {
        name: "hedging",
        phrases: &["i'm not sure", "unclear", "cannot determine", "don't know"],
        delta: -1,
    },
    IndicatorGroup {
        name: "explicit_failure",
        phrases: &["i cannot explain", "unable to understand", "failed to understand"],
        delta: -1,
    },
];

pub fn score_m2(response: &str) -> ScoreTrace {
    score_groups(response, 2, M2_GROUPS)
}

// ---------------------------------------------------------------------
// M3 Cross-File Navigation (base 2)
// ---------------------------------------------------------------------

const M3_GROUPS: &[IndicatorGroup] = &[
    IndicatorGroup {
        name: "call_sites_named",
        phrases: &["calls", "invoked by", "call site", "called from"],
        delta: 1,
    },
    IndicatorGroup {
        name: "module_boundary",
        phrases: &["imports", "module boundary", "cross-module", "across modules"],
        delta: 1,
    },
    IndicatorGroup {
        name: "trace_explained",
        phrases: &["traces", "flows into", "flows from", "propagates through"],
        delta: 1,
    },
    IndicatorGroup {
        name: "caller_named",
        phrases: &["caller", "consumer", "dependent module", "depends on it"],
        delta: 1,
    },
    IndicatorGroup {
        name: "cannot_trace",
        phrases: &["cannot trace", "unable to find", "no references found", "can't locate"],
        delta: -1,
    },
    IndicatorGroup {
        name: "hedging",
        phrases: &["i'm not sure", "it's unclear", "hard to tell"],
        delta: -1,
    },
];

pub fn score_m3(response: &str) -> ScoreTrace {
    score_groups(response, 2, M3_GROUPS)
}

// ---------------------------------------------------------------------
// M4 Identifier Interpretability (base 1). Self-reported confidence
// carries a weighted delta per `spec.md` §4.4 ("M4 self-report-accurate:
// +2; M4 self-report-incorrect: −2").
// ---------------------------------------------------------------------

const M4_GROUPS: &[IndicatorGroup] = &[
    IndicatorGroup {
        name: "plausible_guess",
        phrases: &["likely responsible for", "probably handles", "appears to", "seems to"],
        delta: 1,
    },
    IndicatorGroup {
        name: "specific_behavior_named",
        phrases: &["specifically", "for example", "in particular"],
        delta: 1,
    },
    IndicatorGroup {
        name: "self_report_accurate",
        phrases: &["confident", "certain", "clear from the name", "strongly suggests"],
        delta: 2,
    },
    IndicatorGroup {
        name: "self_report_incorrect",
        phrases: &["not confident", "hard to tell", "ambiguous name", "could mean several things"],
        delta: -2,
    },
    IndicatorGroup {
        name: "vague_guess",
        phrases: &["something related to", "some kind of", "not sure what"],
        delta: -1,
    },
];

pub fn score_m4(response: &str) -> ScoreTrace {
    score_groups(response, 1, M4_GROUPS)
}

// ---------------------------------------------------------------------
// M5 Documentation Accuracy (base 3)
// ---------------------------------------------------------------------

const M5_GROUPS: &[IndicatorGroup] = &[
    IndicatorGroup {
        name: "confirms_match",
        phrases: &["still accurate", "accurately describes", "up to date", "matches the implementation"],
        delta: 1,
    },
    IndicatorGroup {
        name: "identifies_mismatch",
        phrases: &["stale", "mismatch", "out of date", "no longer accurate", "inconsistent with"],
        delta: 1,
    },
    IndicatorGroup {
        name: "cites_specific_evidence",
        phrases: &["for example", "specifically, the code", "the implementation now"],
        delta: 1,
    },
    IndicatorGroup {
        name: "hedging",
        phrases: &["i'm not sure", "cannot verify", "unclear if", "can't confirm"],
        delta: -1,
    },
];

pub fn score_m5(response: &str) -> ScoreTrace {
    score_groups(response, 3, M5_GROUPS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn m2_grouped_scoring_caps_saturation_per_s6() {
        let response = "If the loop iterates and branches, it handles the edge case of empty input, \
            returns an error on overflow, and computes the result it is responsible for. It mutates \
            state in place. This is complex with nested, multiple branches and high cyclomatic weight.";
        let trace = score_m2(response);
        assert_eq!(trace.base_score, 2);
        assert_eq!(trace.final_score, 8);
        let matched_count = trace.indicators.iter().filter(|i| i.matched).count();
        assert_eq!(matched_count, 6);
    }

    #[test]
    fn m2_repeated_keywords_in_one_group_still_count_once() {
        let response = "if if if if loop loop branches branches recursion recursion";
        let trace = score_m2(response);
        let control_flow = trace.indicators.iter().find(|i| i.name == "control_flow").unwrap();
        assert!(control_flow.matched);
        assert_eq!(control_flow.delta, 1);
    }

    #[test]
    fn m4_self_report_accurate_outweighs_plausible_guess() {
        let response = "I am confident this handles validation, based on the name alone.";
        let trace = score_m4(response);
        assert_eq!(trace.base_score, 1);
        // plausible_guess (+1, doesn't match here) skipped; self_report_accurate (+2) matches.
        assert!(trace.final_score >= 3);
    }

    #[test]
    fn unmatched_negative_indicator_has_zero_delta() {
        let trace = score_m5("This documentation is still accurate and matches the implementation.");
        let hedging = trace.indicators.iter().find(|i| i.name == "hedging").unwrap();
        assert!(!hedging.matched);
        assert_eq!(hedging.delta, 0);
    }

    #[test]
    fn final_score_always_matches_trace_invariant() {
        for response in [
            "",
            "confident certain clear from the name",
            "i'm not sure, it's unclear, hard to tell, cannot trace, unable to find",
        ] {
            let trace = score_m3(response);
            let sum: i32 = trace.indicators.iter().map(|i| if i.matched { i.delta } else { 0 }).sum();
            assert_eq!(trace.final_score, (trace.base_score + sum).clamp(1, 10));
        }
    }
}
