//! Optional scoring-config file (`spec.md` §6): a small keyed TOML
//! document overriding default category weights and breakpoint tables.
//! Missing file ⇒ defaults; unknown keys are tolerated (no
//! `deny_unknown_fields`, mirroring the teacher's `ScoringWeights` style).
//! A malformed file is a fatal `Config` error, surfaced before analysis
//! starts (`spec.md` §7).

use std::path::Path;

use serde::Deserialize;

use crate::errors::AgentReadinessError;
use crate::scoring::breakpoints::Breakpoint;
use crate::scoring::ScoringConfig;

#[derive(Debug, Clone, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    categories: Vec<CategoryOverride>,
}

#[derive(Debug, Clone, Deserialize)]
struct CategoryOverride {
    /// Matches `Category::key()` ("c1".."c7"), not the display name.
    category: String,
    weight: Option<f64>,
    #[serde(default)]
    metrics: Vec<MetricOverride>,
}

#[derive(Debug, Clone, Deserialize)]
struct MetricOverride {
    name: String,
    weight: Option<f64>,
    /// `(value, score)` pairs, replacing the whole breakpoint table.
    breakpoints: Option<Vec<(f64, f64)>>,
}

/// Loads and applies the config file at `path`, or returns built-in
/// defaults if `path` is `None` or does not exist.
pub fn load(path: Option<&Path>) -> Result<ScoringConfig, AgentReadinessError> {
    let mut config = ScoringConfig::default();

    let Some(path) = path else { return Ok(config) };
    if !path.is_file() {
        return Ok(config);
    }

    let text = std::fs::read_to_string(path)
        .map_err(|e| AgentReadinessError::io(format!("reading config file: {e}"), Some(path.to_path_buf())))?;
    let file: ConfigFile = toml::from_str(&text)
        .map_err(|e| AgentReadinessError::config(format!("malformed config file {}: {e}", path.display())))?;

    apply(&mut config, &file);
    Ok(config)
}

fn apply(config: &mut ScoringConfig, file: &ConfigFile) {
    for category_override in &file.categories {
        let Some(category_config) = config
            .categories
            .iter_mut()
            .find(|c| c.category.key() == category_override.category)
        else {
            continue;
        };
        if let Some(weight) = category_override.weight {
            category_config.weight = weight;
        }
        for metric_override in &category_override.metrics {
            let Some(metric_config) = category_config.metrics.iter_mut().find(|m| m.name == metric_override.name) else {
                continue;
            };
            if let Some(weight) = metric_override.weight {
                metric_config.weight = weight;
            }
            if let Some(breakpoints) = &metric_override.breakpoints {
                metric_config.breakpoints = breakpoints.iter().map(|(v, s)| Breakpoint::new(*v, *s)).collect();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_returns_defaults() {
        let config = load(None).unwrap();
        assert_eq!(config.categories.len(), 7);
    }

    #[test]
    fn nonexistent_file_returns_defaults() {
        let config = load(Some(Path::new("/nonexistent/agentreadiness.toml"))).unwrap();
        assert_eq!(config.categories.len(), 7);
    }

    #[test]
    fn overrides_a_category_weight_and_tolerates_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            some_unknown_top_level_key = "ignored"

            [[categories]]
            category = "c1"
            weight = 0.5
            unknown_field_in_category = 123

            [[categories.metrics]]
            name = "avg_cyclomatic_complexity"
            weight = 0.9
            breakpoints = [[1.0, 10.0], [50.0, 1.0]]
            "#,
        )
        .unwrap();

        let config = load(Some(&path)).unwrap();
        let c1 = config.category(crate::metrics::Category::C1CodeHealth).unwrap();
        assert_eq!(c1.weight, 0.5);
        let metric = c1.metric("avg_cyclomatic_complexity").unwrap();
        assert_eq!(metric.weight, 0.9);
        assert_eq!(metric.breakpoints.len(), 2);
    }

    #[test]
    fn malformed_toml_is_a_fatal_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "not = [valid toml").unwrap();
        let result = load(Some(&path));
        assert!(result.is_err());
        assert!(result.unwrap_err().is_fatal());
    }
}
