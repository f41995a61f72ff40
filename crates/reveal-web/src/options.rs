#![forbid(unsafe_code)]

//! JSON options supplied by page scripts.
//!
//! Accepts the object a component passes when it asks to be revealed:
//!
//! ```json
//! { "threshold": 0.3, "rootMargin": "0px 0px -10% 0px", "triggerOnce": true }
//! ```
//!
//! Every key is optional; missing keys take the [`RevealConfig`] defaults.
//! This module has no web-sys dependency so it is testable natively.

use reveal_core::{ConfigError, RevealConfig};
use serde::Deserialize;

/// Errors from parsing host options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionsError {
    /// Malformed JSON or wrong value types.
    Json(String),
    /// Well-formed but out-of-range values.
    Config(ConfigError),
}

impl core::fmt::Display for OptionsError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Json(msg) => write!(f, "JSON parse error: {msg}"),
            Self::Config(err) => write!(f, "invalid option: {err}"),
        }
    }
}

impl std::error::Error for OptionsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(_) => None,
            Self::Config(err) => Some(err),
        }
    }
}

impl From<ConfigError> for OptionsError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawOptions {
    #[serde(default)]
    threshold: Option<f64>,
    #[serde(default)]
    root_margin: Option<String>,
    #[serde(default)]
    trigger_once: Option<bool>,
}

/// Parse a JSON options object into a validated [`RevealConfig`].
///
/// An empty string or `null` yields the defaults.
pub fn parse_reveal_options(json: &str) -> Result<RevealConfig, OptionsError> {
    let trimmed = json.trim();
    if trimmed.is_empty() {
        return Ok(RevealConfig::default());
    }
    let raw: Option<RawOptions> =
        serde_json::from_str(trimmed).map_err(|e| OptionsError::Json(e.to_string()))?;
    let raw = raw.unwrap_or_default();

    let mut config = RevealConfig::default();
    if let Some(threshold) = raw.threshold {
        config = config.with_threshold(threshold)?;
    }
    if let Some(margin) = raw.root_margin.as_deref() {
        config = config.with_root_margin_css(margin)?;
    }
    if let Some(trigger_once) = raw.trigger_once {
        config = config.with_trigger_once(trigger_once);
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use reveal_core::RootMargin;

    #[test]
    fn empty_and_null_use_defaults() {
        assert_eq!(parse_reveal_options("").unwrap(), RevealConfig::default());
        assert_eq!(parse_reveal_options("null").unwrap(), RevealConfig::default());
        assert_eq!(parse_reveal_options("{}").unwrap(), RevealConfig::default());
    }

    #[test]
    fn full_options() {
        let config = parse_reveal_options(
            r#"{"threshold":0.1,"rootMargin":"0px 0px -50px 0px","triggerOnce":false}"#,
        )
        .unwrap();
        assert_eq!(config.threshold(), 0.1);
        assert_eq!(
            config.root_margin(),
            &RootMargin::parse("0px 0px -50px 0px").unwrap()
        );
        assert!(!config.trigger_once());
    }

    #[test]
    fn partial_options_keep_defaults() {
        let config = parse_reveal_options(r#"{"triggerOnce":false}"#).unwrap();
        assert_eq!(config.threshold(), 0.3);
        assert!(!config.trigger_once());
    }

    #[test]
    fn out_of_range_threshold_is_config_error() {
        let err = parse_reveal_options(r#"{"threshold":1.5}"#).unwrap_err();
        match err {
            OptionsError::Config(inner) => assert_eq!(inner.field, "threshold"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn bad_margin_is_config_error() {
        let err = parse_reveal_options(r#"{"rootMargin":"10vh"}"#).unwrap_err();
        assert!(matches!(err, OptionsError::Config(ref e) if e.field == "root_margin"));
        assert!(err.to_string().starts_with("invalid option: root_margin=10vh"));
    }

    #[test]
    fn malformed_json_and_unknown_keys_are_rejected() {
        assert!(matches!(
            parse_reveal_options("{threshold:"),
            Err(OptionsError::Json(_))
        ));
        assert!(matches!(
            parse_reveal_options(r#"{"threshold":"high"}"#),
            Err(OptionsError::Json(_))
        ));
        assert!(matches!(
            parse_reveal_options(r#"{"delay":200}"#),
            Err(OptionsError::Json(_))
        ));
    }
}
