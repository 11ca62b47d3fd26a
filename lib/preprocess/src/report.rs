//! Preprocessing report
//!
//! Degraded conditions never abort the pipeline; they are counted here so
//! callers can see what was substituted, clipped or skipped.

use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PreprocessReport {
    pub input_rows: usize,
    pub output_rows: usize,
    pub duplicates_collapsed: usize,
    pub dropped_rows: DroppedRows,
    pub imputed_numeric: BTreeMap<String, Imputation>,
    pub imputed_categorical: BTreeMap<String, usize>,
    pub clipped: BTreeMap<String, usize>,
    pub per90: BTreeMap<String, Per90Flags>,
    /// Ratio rows with a zero or missing operand, emitted as 0
    pub ratio_undefined: BTreeMap<String, usize>,
    /// Composite rows with a missing source, treated as 0
    pub composite_missing: BTreeMap<String, usize>,
    /// Normalized columns whose spread was zero
    pub zero_variance: Vec<String>,
    pub skipped: Vec<SkippedFeature>,
    pub per90_columns: Vec<String>,
    pub ratio_columns: Vec<String>,
    pub composite_columns: Vec<String>,
    pub normalized_columns: Vec<String>,
    pub validation: ValidationReport,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DroppedRows {
    pub missing_threshold: usize,
    pub missing_categorical: usize,
}

impl DroppedRows {
    pub fn total(&self) -> usize {
        self.missing_threshold + self.missing_categorical
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Imputation {
    pub count: usize,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Per90Flags {
    /// Rows with zero (or invalid) minutes, emitted as 0
    pub zero_minutes: usize,
    /// Rows with a missing raw value, emitted as 0
    pub missing_value: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Cleaning,
    Per90,
    Ratio,
    Composite,
    Normalization,
}

/// A configured feature that could not be produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFeature {
    pub feature: String,
    pub stage: Stage,
    pub missing_sources: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Rows with negative minutes
    pub invalid_minutes: usize,
    pub out_of_range: BTreeMap<String, RangeViolation>,
    /// Missing values per column, nonzero entries only
    pub missing_counts: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RangeViolation {
    pub below_zero: usize,
    pub above_hundred: usize,
}

impl PreprocessReport {
    pub(crate) fn skip(&mut self, feature: &str, stage: Stage, missing_sources: Vec<String>) {
        tracing::warn!(
            feature,
            ?stage,
            ?missing_sources,
            "skipping feature with absent source columns"
        );
        self.skipped.push(SkippedFeature {
            feature: feature.to_string(),
            stage,
            missing_sources,
        });
    }

    /// Whether anything was substituted, clipped, dropped or skipped
    pub fn has_degradations(&self) -> bool {
        self.duplicates_collapsed > 0
            || self.dropped_rows.total() > 0
            || !self.imputed_numeric.is_empty()
            || !self.imputed_categorical.is_empty()
            || !self.clipped.is_empty()
            || !self.per90.is_empty()
            || !self.ratio_undefined.is_empty()
            || !self.composite_missing.is_empty()
            || !self.zero_variance.is_empty()
            || !self.skipped.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degradations() {
        let mut report = PreprocessReport::default();
        assert!(!report.has_degradations());

        report.skip("sot_ratio", Stage::Ratio, vec!["shots_on_target".into()]);
        assert!(report.has_degradations());

        let mut report = PreprocessReport::default();
        report.zero_variance.push("minutes_z".into());
        assert!(report.has_degradations());
    }
}
