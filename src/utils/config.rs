// src/utils/config.rs

// --- Defaults ---
pub const DEFAULT_BRANCH_LOOKBACK: usize = 1000;
pub const DEFAULT_CATEGORY_RADIUS: usize = 500;
pub const DEFAULT_ACTIVITY_WINDOW: usize = 500;
pub const DEFAULT_EXPLANATION_WINDOW: usize = 2000;
pub const DEFAULT_EXPLANATION_MAX_CHARS: usize = 500;
pub const DEFAULT_PROGRAM_ELEMENT_MAX_CHARS: usize = 100;
pub const DEFAULT_ACTIVITY_LABEL_MAX_CHARS: usize = 40;
pub const DEFAULT_FISCAL_YEAR_PROBE: usize = 1000;
pub const DEFAULT_BASELINE_LINE_FLOOR: f64 = 1_000.0;
pub const DEFAULT_BASELINE_FLOW_FLOOR: f64 = 50_000.0;

pub const ENV_BASELINE_LINE_FLOOR: &str = "BASELINE_LINE_FLOOR";
pub const ENV_BASELINE_FLOW_FLOOR: &str = "BASELINE_FLOW_FLOOR";

/// Search windows and materiality floors used across extraction and aggregation.
/// Windows are in characters of document text; floors are in the document's native units.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractorConfig {
    pub branch_lookback: usize,       // How far before a section start to look for its unit marker
    pub category_radius: usize,       // Max distance of a category match from the section anchor
    pub activity_window: usize,       // Budget-activity header search after the anchor
    pub explanation_window: usize,    // Explanation block search after the anchor
    pub explanation_max_chars: usize,
    pub program_element_max_chars: usize,
    pub activity_label_max_chars: usize,
    pub fiscal_year_probe: usize,     // Leading text scanned for a document-level fiscal year
    pub baseline_line_floor: f64,     // Data lines leading with a smaller value are noise
    pub baseline_flow_floor: f64,     // Baseline groups must sum to more than this to become edges
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            branch_lookback: DEFAULT_BRANCH_LOOKBACK,
            category_radius: DEFAULT_CATEGORY_RADIUS,
            activity_window: DEFAULT_ACTIVITY_WINDOW,
            explanation_window: DEFAULT_EXPLANATION_WINDOW,
            explanation_max_chars: DEFAULT_EXPLANATION_MAX_CHARS,
            program_element_max_chars: DEFAULT_PROGRAM_ELEMENT_MAX_CHARS,
            activity_label_max_chars: DEFAULT_ACTIVITY_LABEL_MAX_CHARS,
            fiscal_year_probe: DEFAULT_FISCAL_YEAR_PROBE,
            baseline_line_floor: DEFAULT_BASELINE_LINE_FLOOR,
            baseline_flow_floor: DEFAULT_BASELINE_FLOW_FLOOR,
        }
    }
}

impl ExtractorConfig {
    /// Defaults, with the two materiality floors overridable from the environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(floor) = parse_override(&lookup, ENV_BASELINE_LINE_FLOOR) {
            config.baseline_line_floor = floor;
        }
        if let Some(floor) = parse_override(&lookup, ENV_BASELINE_FLOW_FLOOR) {
            config.baseline_flow_floor = floor;
        }
        config
    }

    pub fn with_baseline_line_floor(mut self, floor: f64) -> Self {
        self.baseline_line_floor = floor;
        self
    }

    pub fn with_baseline_flow_floor(mut self, floor: f64) -> Self {
        self.baseline_flow_floor = floor;
        self
    }
}

/// Parses a materiality floor. Floors must be finite and non-negative;
/// a NaN floor would make every comparison against it false.
pub fn parse_floor(raw: &str) -> Result<f64, String> {
    let value: f64 = raw.trim().parse().map_err(|_| format!("{:?} is not a number", raw))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("{} is not a finite, non-negative floor", value));
    }
    Ok(value)
}

fn parse_override(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<f64> {
    let raw = lookup(key)?;
    match parse_floor(&raw) {
        Ok(value) => {
            tracing::debug!("Using {}={} from environment", key, raw.trim());
            Some(value)
        }
        Err(e) => {
            tracing::warn!("Ignoring invalid {} value: {}", key, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_env_overrides_floors() {
        let env: HashMap<&str, &str> =
            [(ENV_BASELINE_FLOW_FLOOR, "75000"), (ENV_BASELINE_LINE_FLOOR, " 500 ")].into_iter().collect();
        let config = ExtractorConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.baseline_flow_floor, 75_000.0);
        assert_eq!(config.baseline_line_floor, 500.0);
        assert_eq!(config.category_radius, DEFAULT_CATEGORY_RADIUS);
    }

    #[test]
    fn test_invalid_env_value_keeps_default() {
        let config = ExtractorConfig::from_lookup(|k| {
            (k == ENV_BASELINE_FLOW_FLOOR).then(|| "fifty thousand".to_string())
        });
        assert_eq!(config.baseline_flow_floor, DEFAULT_BASELINE_FLOW_FLOOR);
    }

    #[test]
    fn test_non_finite_or_negative_floors_rejected() {
        for bad in ["NaN", "inf", "-infinity", "-5"] {
            let config = ExtractorConfig::from_lookup(|k| (k == ENV_BASELINE_LINE_FLOOR).then(|| bad.to_string()));
            assert_eq!(config.baseline_line_floor, DEFAULT_BASELINE_LINE_FLOOR, "{} must be ignored", bad);
            assert!(parse_floor(bad).is_err());
        }
        assert_eq!(parse_floor(" 0 "), Ok(0.0));
    }
}
