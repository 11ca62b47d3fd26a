//! Derived features: per-90 rates, ratios and composite sums

use stattwin_core::{Column, ColumnKind, FeatureTable};

use crate::config::{CompositeSpec, RatioSpec};
use crate::report::{Per90Flags, PreprocessReport, Stage};

pub const PER90_SUFFIX: &str = "_per90";

pub fn per90_name(column: &str) -> String {
    format!("{}{}", column, PER90_SUFFIX)
}

/// `raw / minutes * 90` for each requested raw column (every raw column when
/// `requested` is empty). Invalid minutes or a missing value emit 0.
pub fn add_per90(table: &mut FeatureTable, requested: &[String], report: &mut PreprocessReport) {
    let sources = if requested.is_empty() {
        table.column_names(ColumnKind::Raw)
    } else {
        requested.to_vec()
    };
    let minutes: Vec<f64> = table.rows().iter().map(|r| r.minutes).collect();

    for source in sources {
        let Some(column) = table.column(&source) else {
            report.skip(&per90_name(&source), Stage::Per90, vec![source.clone()]);
            continue;
        };

        let mut flags = Per90Flags::default();
        let values: Vec<Option<f64>> = column
            .values
            .iter()
            .zip(&minutes)
            .map(|(value, &mins)| {
                if !mins.is_finite() || mins <= 0.0 {
                    flags.zero_minutes += 1;
                    return Some(0.0);
                }
                match value {
                    Some(v) if v.is_finite() => Some(v / mins * 90.0),
                    _ => {
                        flags.missing_value += 1;
                        Some(0.0)
                    }
                }
            })
            .collect();

        let name = per90_name(&source);
        if flags != Per90Flags::default() {
            report.per90.insert(name.clone(), flags);
        }
        table.push_column(Column::new(name.clone(), ColumnKind::Per90, values));
        report.per90_columns.push(name);
    }
}

/// Add each ratio whose operands are both present
pub fn add_ratios(table: &mut FeatureTable, ratios: &[RatioSpec], report: &mut PreprocessReport) {
    for spec in ratios {
        let missing = absent(table, [&spec.numerator, &spec.denominator]);
        if !missing.is_empty() {
            report.skip(&spec.output, Stage::Ratio, missing);
            continue;
        }
        let (Some(num), Some(den)) = (table.column(&spec.numerator), table.column(&spec.denominator))
        else {
            continue;
        };

        let multiplier = spec.multiplier.unwrap_or(1.0);
        let mut undefined = 0;
        let values: Vec<Option<f64>> = num
            .values
            .iter()
            .zip(&den.values)
            .map(|pair| match pair {
                (Some(n), Some(d)) if d.is_finite() && *d != 0.0 && n.is_finite() => {
                    Some(n / d * multiplier)
                }
                _ => {
                    undefined += 1;
                    Some(0.0)
                }
            })
            .collect();

        if undefined > 0 {
            report.ratio_undefined.insert(spec.output.clone(), undefined);
        }
        table.push_column(Column::new(spec.output.clone(), ColumnKind::Ratio, values));
        report.ratio_columns.push(spec.output.clone());
    }
}

/// Add each composite whose sources are all present. Missing cells count as 0.
pub fn add_composites(
    table: &mut FeatureTable,
    composites: &[CompositeSpec],
    report: &mut PreprocessReport,
) {
    for spec in composites {
        let missing = absent(table, &spec.sources);
        if !missing.is_empty() {
            report.skip(&spec.output, Stage::Composite, missing);
            continue;
        }

        let mut sums = vec![0.0; table.len()];
        let mut missing_cells = 0;
        for source in &spec.sources {
            let Some(column) = table.column(source) else {
                continue;
            };
            for (sum, value) in sums.iter_mut().zip(&column.values) {
                match value {
                    Some(v) if v.is_finite() => *sum += v,
                    _ => missing_cells += 1,
                }
            }
        }

        if missing_cells > 0 {
            report.composite_missing.insert(spec.output.clone(), missing_cells);
        }
        table.push_column(Column::dense(spec.output.clone(), ColumnKind::Composite, &sums));
        report.composite_columns.push(spec.output.clone());
    }
}

fn absent<'a>(table: &FeatureTable, names: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    names
        .into_iter()
        .filter(|name| !table.has_column(name))
        .cloned()
        .collect()
}
