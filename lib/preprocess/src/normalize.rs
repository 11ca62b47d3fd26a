use stattwin_core::{normalized_name, Column, ColumnKind, FeatureTable, ScalingParams};

use crate::config::NormalizationMethod;
use crate::report::{PreprocessReport, Stage};
use crate::stats;

/// Source columns for normalization: the explicit list, or every
/// non-normalized column in table order
fn normalization_sources(
    table: &FeatureTable,
    requested: &[String],
    report: &mut PreprocessReport,
) -> Vec<String> {
    if requested.is_empty() {
        return table
            .columns()
            .iter()
            .filter(|c| c.kind != ColumnKind::Normalized)
            .map(|c| c.name.clone())
            .collect();
    }
    requested
        .iter()
        .filter(|name| {
            let present = table.has_column(name);
            if !present {
                report.skip(&normalized_name(name), Stage::Normalization, vec![name.to_string()]);
            }
            present
        })
        .cloned()
        .collect()
}

/// Fit center and spread for one column
pub fn fit(column: &Column, method: NormalizationMethod) -> ScalingParams {
    let sorted = stats::sorted_finite(column.present());
    let (center, spread) = match method {
        NormalizationMethod::ZScore => {
            let mean = stats::mean(&sorted).unwrap_or(0.0);
            (mean, stats::population_std(&sorted, mean))
        }
        NormalizationMethod::Robust => {
            let median = stats::median(&sorted).unwrap_or(0.0);
            let iqr = stats::quartiles(&sorted).map_or(0.0, |(q1, q3)| q3 - q1);
            (median, iqr)
        }
    };
    ScalingParams {
        source: column.name.clone(),
        column: normalized_name(&column.name),
        center,
        spread,
        degenerate: !(spread.is_finite() && spread > 0.0),
    }
}

/// Append a `<col>_z` column for each source column. Returns the fitted
/// parameters in column order.
pub fn normalize(
    table: &mut FeatureTable,
    requested: &[String],
    method: NormalizationMethod,
    report: &mut PreprocessReport,
) -> Vec<ScalingParams> {
    let sources = normalization_sources(table, requested, report);
    let mut scaling = Vec::with_capacity(sources.len());

    for source in sources {
        let Some(column) = table.column(&source) else {
            continue;
        };
        let params = fit(column, method);
        let values: Vec<Option<f64>> = column
            .values
            .iter()
            .map(|v| v.filter(|x| x.is_finite()).map(|x| params.apply(x)))
            .collect();

        if params.degenerate {
            tracing::warn!(column = %source, "zero spread, scaling by 1");
            report.zero_variance.push(params.column.clone());
        }
        table.push_column(Column::new(params.column.clone(), ColumnKind::Normalized, values));
        report.normalized_columns.push(params.column.clone());
        scaling.push(params);
    }

    tracing::debug!(columns = scaling.len(), ?method, "normalized feature columns");
    scaling
}
