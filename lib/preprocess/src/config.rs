//! Preprocessing configuration
//!
//! Every field has a default, so a config file only needs to name what it
//! changes. Values are validated once, before any row is touched.

use serde::{Deserialize, Serialize};
use stattwin_core::{Error, Result};

/// Full preprocessing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// How duplicate (player, league, season) rows collapse
    pub dedup: DedupPolicy,
    /// Drop rows whose fraction of missing raw stats exceeds this (0..=1)
    pub drop_row_missing_fraction: Option<f64>,
    /// Policy for missing name/position/league/continent/season
    pub missing_categorical: CategoricalPolicy,
    /// Policy for missing raw numeric stats
    pub missing_numeric: NumericImputation,
    /// Raw stat columns to clean. Empty means every raw column.
    pub numeric_columns: Vec<String>,
    pub outliers: OutlierPolicy,
    /// Raw columns converted to per-90 rates. Empty means every raw column.
    pub per90_columns: Vec<String>,
    pub ratios: Vec<RatioSpec>,
    pub composites: Vec<CompositeSpec>,
    pub normalization: NormalizationMethod,
    /// Columns to normalize. Empty means every raw, per-90, ratio and
    /// composite column.
    pub normalize_columns: Vec<String>,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            dedup: DedupPolicy::default(),
            drop_row_missing_fraction: Some(0.6),
            missing_categorical: CategoricalPolicy::default(),
            missing_numeric: NumericImputation::default(),
            numeric_columns: Vec::new(),
            outliers: OutlierPolicy::default(),
            per90_columns: Vec::new(),
            ratios: RatioSpec::defaults(),
            composites: CompositeSpec::defaults(),
            normalization: NormalizationMethod::default(),
            normalize_columns: Vec::new(),
        }
    }
}

impl PreprocessConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(fraction) = self.drop_row_missing_fraction {
            if !(0.0..=1.0).contains(&fraction) {
                return Err(Error::InvalidConfig(format!(
                    "drop_row_missing_fraction must be within [0, 1], got {}",
                    fraction
                )));
            }
        }

        match self.outliers {
            OutlierPolicy::Iqr { k } if !k.is_finite() || k < 0.0 => {
                return Err(Error::InvalidConfig(format!(
                    "iqr multiplier must be finite and >= 0, got {}",
                    k
                )));
            }
            OutlierPolicy::Winsorize { lower, upper }
                if !(0.0..=1.0).contains(&lower) || !(0.0..=1.0).contains(&upper) || lower >= upper =>
            {
                return Err(Error::InvalidConfig(format!(
                    "winsorize limits must satisfy 0 <= lower < upper <= 1, got ({}, {})",
                    lower, upper
                )));
            }
            _ => {}
        }

        for ratio in &self.ratios {
            if ratio.output.is_empty() {
                return Err(Error::InvalidConfig("ratio output name is empty".into()));
            }
            if let Some(m) = ratio.multiplier {
                if !m.is_finite() {
                    return Err(Error::InvalidConfig(format!(
                        "ratio '{}' multiplier must be finite",
                        ratio.output
                    )));
                }
            }
        }

        for composite in &self.composites {
            if composite.output.is_empty() || composite.sources.is_empty() {
                return Err(Error::InvalidConfig(format!(
                    "composite '{}' needs an output name and at least one source",
                    composite.output
                )));
            }
        }

        Ok(())
    }
}

/// Collapse policy for duplicate (player, league, season) rows, e.g. a
/// mid-season transfer inside one league
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    KeepFirst,
    KeepMostMinutes,
    /// Sum minutes and stats; metadata from the first occurrence
    #[default]
    Aggregate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalPolicy {
    /// Fill with the most frequent value
    #[default]
    Mode,
    /// Drop rows with the field missing
    Drop,
    Keep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericImputation {
    #[default]
    Median,
    Mean,
    Zero,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum OutlierPolicy {
    None,
    /// Clamp to `[Q1 - k*IQR, Q3 + k*IQR]`
    Iqr { k: f64 },
    /// Clamp to the given quantiles
    Winsorize { lower: f64, upper: f64 },
}

impl Default for OutlierPolicy {
    fn default() -> Self {
        OutlierPolicy::Iqr { k: 1.5 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationMethod {
    /// `(x - mean) / std`
    #[default]
    ZScore,
    /// `(x - median) / IQR`
    Robust,
}

/// `output = numerator / denominator * multiplier`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioSpec {
    pub numerator: String,
    pub denominator: String,
    pub output: String,
    #[serde(default)]
    pub multiplier: Option<f64>,
}

impl RatioSpec {
    pub fn new(numerator: &str, denominator: &str, output: &str, multiplier: Option<f64>) -> Self {
        Self {
            numerator: numerator.to_string(),
            denominator: denominator.to_string(),
            output: output.to_string(),
            multiplier,
        }
    }

    pub fn defaults() -> Vec<Self> {
        vec![
            RatioSpec::new("shots_on_target", "shots", "sot_ratio", None),
            RatioSpec::new("passes_completed", "passes_attempted", "pass_completion", Some(100.0)),
            RatioSpec::new("tackles_won", "tackles", "tackles_win_ratio", None),
            RatioSpec::new("aerials_won", "aerials_contested", "aerial_win_ratio", None),
        ]
    }
}

/// `output = sum(sources)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeSpec {
    pub output: String,
    pub sources: Vec<String>,
}

impl CompositeSpec {
    pub fn new(output: &str, sources: &[&str]) -> Self {
        Self {
            output: output.to_string(),
            sources: sources.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn defaults() -> Vec<Self> {
        vec![CompositeSpec::new("def_actions", &["tackles", "interceptions"])]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = PreprocessConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.ratios.len(), 4);
        assert_eq!(cfg.outliers, OutlierPolicy::Iqr { k: 1.5 });
    }

    #[test]
    fn test_partial_json_config() {
        let cfg: PreprocessConfig = serde_json::from_str(
            r#"{
                "normalization": "robust",
                "outliers": { "method": "winsorize", "lower": 0.05, "upper": 0.95 },
                "per90_columns": ["shots", "tackles"]
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.normalization, NormalizationMethod::Robust);
        assert_eq!(cfg.outliers, OutlierPolicy::Winsorize { lower: 0.05, upper: 0.95 });
        assert_eq!(cfg.missing_numeric, NumericImputation::Median);
        assert_eq!(cfg.per90_columns, vec!["shots", "tackles"]);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let cfg = PreprocessConfig {
            drop_row_missing_fraction: Some(1.5),
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));

        let cfg = PreprocessConfig {
            outliers: OutlierPolicy::Winsorize { lower: 0.9, upper: 0.1 },
            ..Default::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = PreprocessConfig {
            composites: vec![CompositeSpec::new("empty", &[])],
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
