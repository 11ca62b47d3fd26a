//! Cleaning stage: sparse-row dropping, missing-value policies and outlier
//! clipping over raw stat columns.

use std::collections::BTreeMap;

use stattwin_core::{CategoricalField, ColumnKind, FeatureTable};

use crate::config::{CategoricalPolicy, NumericImputation, OutlierPolicy};
use crate::report::{Imputation, PreprocessReport, Stage};
use crate::stats;

/// Raw columns the cleaning stage works on: the configured list (absent
/// names are reported and skipped) or every raw column.
pub fn cleaning_columns(
    table: &FeatureTable,
    requested: &[String],
    report: &mut PreprocessReport,
) -> Vec<String> {
    if requested.is_empty() {
        return table.column_names(ColumnKind::Raw);
    }
    let mut out = Vec::with_capacity(requested.len());
    for name in requested {
        if table.has_column(name) {
            out.push(name.clone());
        } else {
            report.skip(name, Stage::Cleaning, vec![name.clone()]);
        }
    }
    out
}

/// Drop rows whose fraction of missing values over `columns` exceeds
/// `threshold`. Returns the number of dropped rows.
pub fn drop_sparse_rows(table: &mut FeatureTable, columns: &[String], threshold: f64) -> usize {
    if columns.is_empty() || table.is_empty() {
        return 0;
    }
    let keep: Vec<bool> = (0..table.len())
        .map(|row| {
            let missing = columns
                .iter()
                .filter(|name| {
                    table
                        .column(name)
                        .map_or(true, |c| !c.values[row].is_some_and(f64::is_finite))
                })
                .count();
            (missing as f64 / columns.len() as f64) <= threshold
        })
        .collect();
    table.retain_rows(&keep)
}

/// Apply the categorical policy. Returns the number of rows dropped.
pub fn handle_missing_categorical(
    table: &mut FeatureTable,
    policy: CategoricalPolicy,
    report: &mut PreprocessReport,
) -> usize {
    match policy {
        CategoricalPolicy::Keep => 0,
        CategoricalPolicy::Drop => {
            let keep: Vec<bool> = table
                .rows()
                .iter()
                .map(|row| CategoricalField::NULLABLE.iter().all(|f| f.get(row).is_some()))
                .collect();
            table.retain_rows(&keep)
        }
        CategoricalPolicy::Mode => {
            for field in CategoricalField::NULLABLE {
                let Some(mode) = mode_of(table, field) else {
                    continue;
                };
                let mut filled = 0;
                for row in table.rows_mut() {
                    if field.get(row).is_none() {
                        field.set(row, Some(mode.clone()));
                        filled += 1;
                    }
                }
                if filled > 0 {
                    report.imputed_categorical.insert(field.as_str().to_string(), filled);
                }
            }
            0
        }
    }
}

/// Most frequent present value; ties go to the smallest string
fn mode_of(table: &FeatureTable, field: CategoricalField) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for row in table.rows() {
        if let Some(value) = field.get(row) {
            *counts.entry(value).or_default() += 1;
        }
    }
    let mut best: Option<(&str, usize)> = None;
    for (value, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value.to_string())
}

/// Fill missing or non-finite values in each column
pub fn impute_numeric(
    table: &mut FeatureTable,
    columns: &[String],
    method: NumericImputation,
    report: &mut PreprocessReport,
) {
    for name in columns {
        let Some(column) = table.column_mut(name) else {
            continue;
        };
        let missing = column
            .values
            .iter()
            .filter(|v| !v.is_some_and(f64::is_finite))
            .count();
        if missing == 0 {
            continue;
        }

        let sorted = stats::sorted_finite(column.present());
        let value = match method {
            NumericImputation::Median => stats::median(&sorted),
            NumericImputation::Mean => stats::mean(&sorted),
            NumericImputation::Zero => Some(0.0),
        }
        .unwrap_or(0.0);

        for cell in &mut column.values {
            if !cell.is_some_and(f64::is_finite) {
                *cell = Some(value);
            }
        }
        report
            .imputed_numeric
            .insert(name.clone(), Imputation { count: missing, value });
    }
}

/// Clamp outliers per the configured policy
pub fn clip_outliers(
    table: &mut FeatureTable,
    columns: &[String],
    policy: OutlierPolicy,
    report: &mut PreprocessReport,
) {
    for name in columns {
        let Some(column) = table.column_mut(name) else {
            continue;
        };
        let sorted = stats::sorted_finite(column.present());
        let bounds = match policy {
            OutlierPolicy::None => None,
            OutlierPolicy::Iqr { k } => stats::quartiles(&sorted).and_then(|(q1, q3)| {
                let iqr = q3 - q1;
                (iqr > 0.0).then(|| (q1 - k * iqr, q3 + k * iqr))
            }),
            OutlierPolicy::Winsorize { lower, upper } => {
                match (stats::quantile(&sorted, lower), stats::quantile(&sorted, upper)) {
                    (Some(lo), Some(hi)) => Some((lo, hi)),
                    _ => None,
                }
            }
        };
        let Some((lower, upper)) = bounds else {
            continue;
        };

        let mut clipped = 0;
        for value in column.values.iter_mut().flatten() {
            if *value < lower || *value > upper {
                *value = value.clamp(lower, upper);
                clipped += 1;
            }
        }
        if clipped > 0 {
            report.clipped.insert(name.clone(), clipped);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stattwin_core::{PlayerSeasonRecord, StatLine};

    fn table_with(values: &[Option<f64>]) -> FeatureTable {
        let records: Vec<_> = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let mut r = PlayerSeasonRecord::new(format!("p{}", i));
                r.stats.set("shots", *v);
                r
            })
            .collect();
        FeatureTable::from_records(&records)
    }

    fn shots(table: &FeatureTable) -> Vec<Option<f64>> {
        table.column("shots").unwrap().values.clone()
    }

    #[test]
    fn test_iqr_clipping() {
        let mut table = table_with(&[Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(100.0)]);
        let mut report = PreprocessReport::default();
        clip_outliers(&mut table, &["shots".into()], OutlierPolicy::Iqr { k: 1.5 }, &mut report);
        // Q1 = 2, Q3 = 4, upper bound = 7
        assert_eq!(shots(&table)[4], Some(7.0));
        assert_eq!(report.clipped.get("shots"), Some(&1));
    }

    #[test]
    fn test_iqr_zero_spread_untouched() {
        // Q1 = Q3 = 1, so there is no fence to clip against
        let mut table = table_with(&[Some(1.0), Some(1.0), Some(1.0), Some(1.0), Some(50.0)]);
        let mut report = PreprocessReport::default();
        clip_outliers(&mut table, &["shots".into()], OutlierPolicy::Iqr { k: 1.5 }, &mut report);
        assert!(report.clipped.is_empty());
        assert_eq!(shots(&table)[4], Some(50.0));
    }

    #[test]
    fn test_winsorize() {
        let values: Vec<Option<f64>> = (0..=100).map(|i| Some(i as f64)).collect();
        let mut table = table_with(&values);
        let mut report = PreprocessReport::default();
        clip_outliers(
            &mut table,
            &["shots".into()],
            OutlierPolicy::Winsorize { lower: 0.05, upper: 0.95 },
            &mut report,
        );
        let s = shots(&table);
        assert_eq!(s[0], Some(5.0));
        assert_eq!(s[100], Some(95.0));
        assert_eq!(report.clipped.get("shots"), Some(&10));
    }

    #[test]
    fn test_impute_median_mean_zero() {
        for (method, expected) in [
            (NumericImputation::Median, 2.0),
            (NumericImputation::Mean, 3.0),
            (NumericImputation::Zero, 0.0),
        ] {
            let mut table = table_with(&[Some(1.0), None, Some(2.0), Some(6.0)]);
            let mut report = PreprocessReport::default();
            impute_numeric(&mut table, &["shots".into()], method, &mut report);
            assert_eq!(shots(&table)[1], Some(expected));
            assert_eq!(report.imputed_numeric["shots"].count, 1);
        }
    }

    #[test]
    fn test_drop_sparse_rows() {
        let mut a = PlayerSeasonRecord::new("a");
        a.stats = StatLine::default().with("shots", 1.0).with("tackles", 1.0).with("saves", 1.0);
        let mut b = PlayerSeasonRecord::new("b");
        b.stats = StatLine::default().with("shots", 1.0);
        let mut table = FeatureTable::from_records(&[a, b]);
        let columns = table.column_names(ColumnKind::Raw);
        assert_eq!(drop_sparse_rows(&mut table, &columns, 0.6), 1);
        assert_eq!(table.row(0).player_id, "a");
    }

    #[test]
    fn test_categorical_mode_and_drop() {
        let mut records: Vec<_> = ["EPL", "EPL", "Serie A"]
            .iter()
            .enumerate()
            .map(|(i, league)| {
                let mut r = PlayerSeasonRecord::new(format!("p{}", i));
                r.league = Some(league.to_string());
                r.name = Some(format!("Player {}", i));
                r.position = Some("MF".into());
                r.continent = Some("Europe".into());
                r.season = Some("2023-2024".into());
                r
            })
            .collect();
        records[2].league = None;

        let mut table = FeatureTable::from_records(&records);
        let mut report = PreprocessReport::default();
        handle_missing_categorical(&mut table, CategoricalPolicy::Mode, &mut report);
        assert_eq!(table.row(2).league.as_deref(), Some("EPL"));
        assert_eq!(report.imputed_categorical.get("league"), Some(&1));

        let mut table = FeatureTable::from_records(&records);
        let dropped = handle_missing_categorical(&mut table, CategoricalPolicy::Drop, &mut report);
        assert_eq!(dropped, 1);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_cleaning_columns_reports_absent() {
        let table = table_with(&[Some(1.0)]);
        let mut report = PreprocessReport::default();
        let cols = cleaning_columns(&table, &["shots".into(), "saves".into()], &mut report);
        assert_eq!(cols, vec!["shots".to_string()]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].feature, "saves");
    }
}
