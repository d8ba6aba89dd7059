//! Prompt templates for the five C7 metrics (`spec.md` §4.4). Each template
//! embeds a fixed, uppercase "distinctive phrase" so replay routing can
//! recover the metric from the prompt text alone via case-insensitive
//! substring matching (`spec.md` §9 design note).

pub const M1_PHRASE: &str = "task consistency check";
pub const M2_PHRASE: &str = "behavior comprehension check";
pub const M3_PHRASE: &str = "cross-file navigation check";
pub const M4_PHRASE: &str = "identifier interpretability check";
pub const M5_PHRASE: &str = "documentation accuracy check";

/// Routes a prompt back to its metric id by the distinctive phrase it
/// embeds. Used by the replay executor, which only sees prompt text.
pub fn route_metric(prompt: &str) -> Option<&'static str> {
    let lower = prompt.to_lowercase();
    if lower.contains(M1_PHRASE) {
        Some("m1_task_consistency")
    } else if lower.contains(M2_PHRASE) {
        Some("m2_behavior_comprehension")
    } else if lower.contains(M3_PHRASE) {
        Some("m3_cross_file_navigation")
    } else if lower.contains(M4_PHRASE) {
        Some("m4_identifier_interpretability")
    } else if lower.contains(M5_PHRASE) {
        Some("m5_documentation_accuracy")
    } else {
        None
    }
}

pub fn m1_prompt(file: &str) -> String {
    format!(
        "TASK CONSISTENCY CHECK: Describe the primary responsibility of the file `{file}` in one sentence. \
         Then, rephrased in your own different words, describe its single primary responsibility again. \
         Keep both restatements focused on the same responsibility."
    )
}

pub fn m2_prompt(file: &str, function: &str, line: usize, cyclomatic: u32) -> String {
    format!(
        "BEHAVIOR COMPREHENSION CHECK: Explain precisely what the function `{function}` at {file}:{line} \
         (cyclomatic complexity {cyclomatic}) does. Describe its control flow, its edge cases, and any error \
         handling it performs."
    )
}

pub fn m3_prompt(module: &str, fan_in: u32) -> String {
    format!(
        "CROSS-FILE NAVIGATION CHECK: The module `{module}` is imported by {fan_in} other modules in this \
         project. Trace how calls flow into `{module}` from its callers and explain which call sites across \
         module boundaries depend on it."
    )
}

pub fn m4_prompt(file: &str, line: usize, name: &str) -> String {
    format!(
        "IDENTIFIER INTERPRETABILITY CHECK: Without reading its implementation, what do you think the \
         identifier `{name}` (defined at {file}:{line}) is responsible for, based solely on its name? State \
         your best guess and how confident you are."
    )
}

pub fn m5_prompt(file: &str, line: usize, name: &str, doc: &str) -> String {
    format!(
        "DOCUMENTATION ACCURACY CHECK: Here is the existing doc comment for `{name}` at {file}:{line}:\n\n\
         {doc}\n\nDoes this documentation still accurately describe the identifier's behavior? Identify any \
         staleness or mismatch you find, or confirm it is accurate."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_template_routes_back_to_its_metric() {
        assert_eq!(route_metric(&m1_prompt("a.rs")), Some("m1_task_consistency"));
        assert_eq!(route_metric(&m2_prompt("a.rs", "f", 1, 5)), Some("m2_behavior_comprehension"));
        assert_eq!(route_metric(&m3_prompt("mod", 3)), Some("m3_cross_file_navigation"));
        assert_eq!(route_metric(&m4_prompt("a.rs", 1, "x")), Some("m4_identifier_interpretability"));
        assert_eq!(route_metric(&m5_prompt("a.rs", 1, "x", "doc")), Some("m5_documentation_accuracy"));
    }

    #[test]
    fn unrelated_text_has_no_route() {
        assert_eq!(route_metric("just some unrelated text"), None);
    }
}
