//! Session configuration.
//!
//! Settings are held in an explicit [`Config`] value rather than process-wide
//! state. [`Config::from_env`] layers `PERFNORM_*` environment variables over
//! the defaults.

use crate::error::{Error, Result};
use crate::units::TimeUnit;

/// Environment variable prefix for [`Config::from_env`].
pub const ENV_PREFIX: &str = "PERFNORM_";

/// Configuration options for a [`Session`](crate::Session) and its reports.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    // =========================================================================
    // Collection
    // =========================================================================
    /// Master switch. When false, regions are inert and nothing is recorded.
    ///
    /// Default: true.
    pub enabled: bool,

    /// Component labels to collect. Empty means every registered component.
    ///
    /// Default: empty.
    pub components: Vec<String>,

    /// Verbosity for derivation and region logging (0 = quiet).
    ///
    /// At 2 and above every derivation is logged with its data size.
    /// Default: 0.
    pub verbose: u8,

    // =========================================================================
    // Reporting
    // =========================================================================
    /// Display unit for timing components.
    ///
    /// Default: milliseconds.
    pub timing_unit: TimeUnit,

    /// Digits after the decimal point.
    ///
    /// Default: 3.
    pub precision: usize,

    /// Minimum column width for values.
    ///
    /// Default: 8.
    pub width: usize,

    /// Scientific notation for values.
    ///
    /// Default: true.
    pub scientific: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: true,
            components: Vec::new(),
            verbose: 0,
            timing_unit: TimeUnit::Millisecond,
            precision: 3,
            width: 8,
            scientific: true,
        }
    }
}

impl Config {
    /// Create a new configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration with collection switched off.
    pub fn quiet() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Fixed-point output with microsecond timing.
    pub fn fixed() -> Self {
        Self {
            scientific: false,
            timing_unit: TimeUnit::Microsecond,
            ..Default::default()
        }
    }

    /// Defaults overridden by `PERFNORM_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_env_or(Self::default())
    }

    /// `default` overridden by `PERFNORM_*` environment variables.
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env_or(default: Self) -> Self {
        Self::from_lookup(default, |key| std::env::var(key).ok())
    }

    /// `default` overridden by values returned from `lookup`.
    ///
    /// `lookup` receives full variable names such as `PERFNORM_PRECISION`.
    pub fn from_lookup<F>(default: Self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = default;
        let get = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(v) = get("ENABLED") {
            apply(&mut config.enabled, "ENABLED", parse_bool(&v));
        }
        if let Some(v) = get("TIMING_UNITS") {
            apply(&mut config.timing_unit, "TIMING_UNITS", v.parse().ok());
        }
        if let Some(v) = get("PRECISION") {
            apply(&mut config.precision, "PRECISION", v.trim().parse().ok());
        }
        if let Some(v) = get("WIDTH") {
            apply(&mut config.width, "WIDTH", v.trim().parse().ok());
        }
        if let Some(v) = get("SCIENTIFIC") {
            apply(&mut config.scientific, "SCIENTIFIC", parse_bool(&v));
        }
        if let Some(v) = get("VERBOSE") {
            apply(&mut config.verbose, "VERBOSE", v.trim().parse().ok());
        }
        if let Some(v) = get("COMPONENTS") {
            config.components = v
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        config
    }

    // =========================================================================
    // Builder methods
    // =========================================================================

    /// Enable or disable collection.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the timing display unit.
    pub fn timing_unit(mut self, unit: TimeUnit) -> Self {
        self.timing_unit = unit;
        self
    }

    /// Set the output precision.
    pub fn precision(mut self, precision: usize) -> Self {
        assert!(precision <= 17, "precision must be <= 17");
        self.precision = precision;
        self
    }

    /// Set the output column width.
    pub fn width(mut self, width: usize) -> Self {
        assert!(width > 0, "width must be positive");
        self.width = width;
        self
    }

    /// Toggle scientific notation.
    pub fn scientific(mut self, scientific: bool) -> Self {
        self.scientific = scientific;
        self
    }

    /// Set the verbosity level.
    pub fn verbose(mut self, level: u8) -> Self {
        self.verbose = level;
        self
    }

    /// Restrict collection to the given component labels.
    pub fn components<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.components = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<()> {
        if self.precision > 17 {
            return Err(Error::InvalidConfig("precision must be <= 17".to_string()));
        }
        if self.width == 0 {
            return Err(Error::InvalidConfig("width must be positive".to_string()));
        }
        if self.components.iter().any(|c| c.trim().is_empty()) {
            return Err(Error::InvalidConfig(
                "component labels must be non-empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn apply<T>(slot: &mut T, name: &str, parsed: Option<T>) {
    match parsed {
        Some(value) => *slot = value,
        None => tracing::warn!("ignoring unparseable {ENV_PREFIX}{name}"),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.enabled);
        assert_eq!(config.timing_unit, TimeUnit::Millisecond);
        assert_eq!(config.precision, 3);
        assert_eq!(config.width, 8);
        assert!(config.scientific);
        assert!(config.components.is_empty());
    }

    #[test]
    fn test_preset_configs() {
        assert!(!Config::quiet().enabled);
        let fixed = Config::fixed();
        assert!(!fixed.scientific);
        assert_eq!(fixed.timing_unit, TimeUnit::Microsecond);
    }

    #[test]
    fn test_builder_methods() {
        let config = Config::new()
            .timing_unit(TimeUnit::Second)
            .precision(6)
            .width(12)
            .scientific(false)
            .verbose(2)
            .components(["wall_clock", "normalized_wall_clock"]);

        assert_eq!(config.timing_unit, TimeUnit::Second);
        assert_eq!(config.precision, 6);
        assert_eq!(config.width, 12);
        assert!(!config.scientific);
        assert_eq!(config.verbose, 2);
        assert_eq!(config.components.len(), 2);
    }

    #[test]
    fn test_validation() {
        assert!(Config::default().validate().is_ok());

        let mut invalid = Config::default();
        invalid.width = 0;
        assert!(matches!(invalid.validate(), Err(Error::InvalidConfig(_))));

        let mut invalid = Config::default();
        invalid.components = vec![" ".to_string()];
        assert!(invalid.validate().is_err());
    }

    #[test]
    #[should_panic(expected = "width must be positive")]
    fn test_invalid_width() {
        Config::new().width(0);
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::from_lookup(
            Config::default(),
            lookup(&[
                ("PERFNORM_ENABLED", "off"),
                ("PERFNORM_TIMING_UNITS", "usec"),
                ("PERFNORM_PRECISION", "5"),
                ("PERFNORM_SCIENTIFIC", "false"),
                ("PERFNORM_COMPONENTS", "wall_clock, normalized_wall_clock"),
            ]),
        );
        assert!(!config.enabled);
        assert_eq!(config.timing_unit, TimeUnit::Microsecond);
        assert_eq!(config.precision, 5);
        assert!(!config.scientific);
        assert_eq!(config.components, vec!["wall_clock", "normalized_wall_clock"]);
    }

    #[test]
    fn test_env_garbage_keeps_default() {
        let config = Config::from_lookup(
            Config::fixed(),
            lookup(&[("PERFNORM_WIDTH", "wide"), ("PERFNORM_TIMING_UNITS", "parsec")]),
        );
        assert_eq!(config.width, 8);
        assert_eq!(config.timing_unit, TimeUnit::Microsecond);
    }
}
