#![forbid(unsafe_code)]

//! Session configuration.
//!
//! [`RevealConfig`] is immutable once built: every constructor validates, so a
//! session never sees an out-of-range threshold. Changing options means
//! attaching a new session.
//!
//! Defaults can be overridden from the environment:
//!
//! | Variable             | Field          | Format                   |
//! |----------------------|----------------|--------------------------|
//! | `REVEAL_THRESHOLD`   | `threshold`    | float in `[0, 1]`        |
//! | `REVEAL_ROOT_MARGIN` | `root_margin`  | CSS margin shorthand     |
//! | `REVEAL_TRIGGER_ONCE`| `trigger_once` | `1/0/true/false/yes/no`  |
//!
//! Invalid values keep the default for that field and are reported in
//! [`ConfigParse::errors`].

use std::env;
use std::fmt;

use crate::margin::RootMargin;

pub const ENV_THRESHOLD: &str = "REVEAL_THRESHOLD";
pub const ENV_ROOT_MARGIN: &str = "REVEAL_ROOT_MARGIN";
pub const ENV_TRIGGER_ONCE: &str = "REVEAL_TRIGGER_ONCE";

pub const DEFAULT_THRESHOLD: f64 = 0.3;

/// Ratio breakpoints requested from the platform, in tenths.
const SAMPLE_STEPS: u32 = 10;

/// Options for one observation session.
#[derive(Debug, Clone, PartialEq)]
pub struct RevealConfig {
    threshold: f64,
    root_margin: RootMargin,
    trigger_once: bool,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            root_margin: RootMargin::default(),
            trigger_once: true,
        }
    }
}

/// Configuration error with field context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub field: &'static str,
    pub value: String,
    pub message: String,
}

impl ConfigError {
    fn new(field: &'static str, value: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} ({})", self.field, self.value, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Result of loading configuration with diagnostics.
#[derive(Debug, Clone)]
pub struct ConfigParse {
    pub config: RevealConfig,
    pub errors: Vec<ConfigError>,
}

impl RevealConfig {
    pub fn new(
        threshold: f64,
        root_margin: RootMargin,
        trigger_once: bool,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            threshold: check_threshold(threshold)?,
            root_margin,
            trigger_once,
        })
    }

    pub fn with_threshold(mut self, threshold: f64) -> Result<Self, ConfigError> {
        self.threshold = check_threshold(threshold)?;
        Ok(self)
    }

    #[must_use]
    pub fn with_root_margin(mut self, root_margin: RootMargin) -> Self {
        self.root_margin = root_margin;
        self
    }

    /// Set the root margin from its CSS shorthand form.
    pub fn with_root_margin_css(self, css: &str) -> Result<Self, ConfigError> {
        let margin = RootMargin::parse(css)
            .map_err(|e| ConfigError::new("root_margin", css, e.to_string()))?;
        Ok(self.with_root_margin(margin))
    }

    #[must_use]
    pub fn with_trigger_once(mut self, trigger_once: bool) -> Self {
        self.trigger_once = trigger_once;
        self
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    #[must_use]
    pub fn root_margin(&self) -> &RootMargin {
        &self.root_margin
    }

    #[must_use]
    pub fn trigger_once(&self) -> bool {
        self.trigger_once
    }

    /// Ratio breakpoints for the platform primitive: every tenth from 0 to 1
    /// plus the configured threshold, ascending and without duplicates.
    #[must_use]
    pub fn sample_ratios(&self) -> Vec<f64> {
        let mut ratios: Vec<f64> = (0..=SAMPLE_STEPS)
            .map(|step| f64::from(step) / f64::from(SAMPLE_STEPS))
            .collect();
        ratios.push(self.threshold);
        ratios.sort_by(f64::total_cmp);
        ratios.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
        ratios
    }

    /// Load from environment variables, ignoring diagnostics.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with_diagnostics().config
    }

    #[must_use]
    pub fn from_env_with_diagnostics() -> ConfigParse {
        Self::from_env_with(|key| env::var(key).ok())
    }

    /// Load using `get` as the variable source.
    pub fn from_env_with<F>(mut get: F) -> ConfigParse
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let mut errors = Vec::new();

        if let Some(value) = get(ENV_THRESHOLD) {
            match value.trim().parse::<f64>() {
                Ok(parsed) => match check_threshold(parsed) {
                    Ok(threshold) => config.threshold = threshold,
                    Err(err) => errors.push(err),
                },
                Err(_) => errors.push(ConfigError::new(
                    "threshold",
                    value,
                    "expected float in [0, 1]",
                )),
            }
        }

        if let Some(value) = get(ENV_ROOT_MARGIN) {
            match RootMargin::parse(&value) {
                Ok(margin) => config.root_margin = margin,
                Err(err) => errors.push(ConfigError::new("root_margin", value, err.to_string())),
            }
        }

        if let Some(value) = get(ENV_TRIGGER_ONCE) {
            match parse_bool(&value) {
                Some(parsed) => config.trigger_once = parsed,
                None => errors.push(ConfigError::new(
                    "trigger_once",
                    value,
                    "expected bool (1/0/true/false)",
                )),
            }
        }

        for err in &errors {
            tracing::warn!(field = err.field, value = %err.value, "{}", err.message);
        }

        ConfigParse { config, errors }
    }
}

fn check_threshold(threshold: f64) -> Result<f64, ConfigError> {
    if threshold.is_finite() && (0.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(ConfigError::new(
            "threshold",
            threshold.to_string(),
            "must be within [0, 1]",
        ))
    }
}

#[inline]
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::margin::MarginLength;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl FnMut(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = RevealConfig::default();
        assert_eq!(config.threshold(), 0.3);
        assert_eq!(config.root_margin(), &RootMargin::default());
        assert!(config.trigger_once());
    }

    #[test]
    fn threshold_out_of_range_is_rejected() {
        for bad in [-0.1, 1.5, f64::NAN, f64::INFINITY] {
            let err = RevealConfig::default().with_threshold(bad).unwrap_err();
            assert_eq!(err.field, "threshold");
        }
        assert!(RevealConfig::default().with_threshold(0.0).is_ok());
        assert!(RevealConfig::default().with_threshold(1.0).is_ok());
    }

    #[test]
    fn root_margin_css_errors_carry_field() {
        let err = RevealConfig::default()
            .with_root_margin_css("10em")
            .unwrap_err();
        assert_eq!(err.field, "root_margin");
        assert_eq!(err.value, "10em");
    }

    #[test]
    fn sample_ratios_include_tenths_and_threshold() {
        let ratios = RevealConfig::default()
            .with_threshold(0.25)
            .unwrap()
            .sample_ratios();
        assert_eq!(ratios.len(), 12);
        assert_eq!(ratios.first(), Some(&0.0));
        assert_eq!(ratios.last(), Some(&1.0));
        assert!(ratios.contains(&0.25));
        assert!(ratios.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn sample_ratios_do_not_duplicate_a_tenth_threshold() {
        let ratios = RevealConfig::default()
            .with_threshold(0.5)
            .unwrap()
            .sample_ratios();
        assert_eq!(ratios.len(), 11);
    }

    #[test]
    fn env_overrides_apply() {
        let parse = RevealConfig::from_env_with(env_from(&[
            (ENV_THRESHOLD, "0.5"),
            (ENV_ROOT_MARGIN, "-20px"),
            (ENV_TRIGGER_ONCE, "off"),
        ]));
        assert!(parse.errors.is_empty());
        assert_eq!(parse.config.threshold(), 0.5);
        assert_eq!(parse.config.root_margin().top, MarginLength::px(-20.0));
        assert!(!parse.config.trigger_once());
    }

    #[test]
    fn invalid_env_values_fall_back_to_defaults() {
        let parse = RevealConfig::from_env_with(env_from(&[
            (ENV_THRESHOLD, "2"),
            (ENV_ROOT_MARGIN, "wide"),
            (ENV_TRIGGER_ONCE, "maybe"),
        ]));
        assert_eq!(parse.config, RevealConfig::default());
        let fields: Vec<_> = parse.errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["threshold", "root_margin", "trigger_once"]);
    }

    #[test]
    fn error_display_includes_context() {
        let err = ConfigError::new("threshold", "abc", "expected float in [0, 1]");
        assert_eq!(err.to_string(), "threshold=abc (expected float in [0, 1])");
    }
}
