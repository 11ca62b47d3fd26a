use stattwin_core::{FeatureTable, NormalizedFeatureTable, PlayerSeasonRecord, Result};

use crate::clean;
use crate::config::PreprocessConfig;
use crate::dedup::deduplicate;
use crate::derive;
use crate::normalize::normalize;
use crate::report::PreprocessReport;
use crate::validate::validate;

/// Turn raw player-season records into a normalized feature table.
///
/// Stages run in a fixed order: dedup, sparse-row drop, categorical policy,
/// numeric imputation, outlier clipping, per-90 rates, ratios, composites,
/// normalization and validation. The only error is an invalid config;
/// everything else degrades into report entries. Output is deterministic for
/// a given input and config.
pub fn preprocess(
    records: Vec<PlayerSeasonRecord>,
    cfg: &PreprocessConfig,
) -> Result<(NormalizedFeatureTable, PreprocessReport)> {
    cfg.validate()?;

    let mut report = PreprocessReport {
        input_rows: records.len(),
        ..Default::default()
    };

    let (records, collapsed) = deduplicate(records, cfg.dedup);
    report.duplicates_collapsed = collapsed;

    let mut table = FeatureTable::from_records(&records);
    drop(records);
    tracing::debug!(rows = table.len(), columns = table.columns().len(), "built raw table");

    let numeric = clean::cleaning_columns(&table, &cfg.numeric_columns, &mut report);
    if let Some(threshold) = cfg.drop_row_missing_fraction {
        report.dropped_rows.missing_threshold =
            clean::drop_sparse_rows(&mut table, &numeric, threshold);
    }
    report.dropped_rows.missing_categorical =
        clean::handle_missing_categorical(&mut table, cfg.missing_categorical, &mut report);
    if report.dropped_rows.total() > 0 {
        tracing::warn!(
            missing_threshold = report.dropped_rows.missing_threshold,
            missing_categorical = report.dropped_rows.missing_categorical,
            "dropped incomplete rows"
        );
    }

    clean::impute_numeric(&mut table, &numeric, cfg.missing_numeric, &mut report);
    clean::clip_outliers(&mut table, &numeric, cfg.outliers, &mut report);
    tracing::debug!(
        imputed = report.imputed_numeric.len(),
        clipped = report.clipped.len(),
        "cleaned raw columns"
    );

    derive::add_per90(&mut table, &cfg.per90_columns, &mut report);
    derive::add_ratios(&mut table, &cfg.ratios, &mut report);
    derive::add_composites(&mut table, &cfg.composites, &mut report);
    tracing::debug!(
        per90 = report.per90_columns.len(),
        ratios = report.ratio_columns.len(),
        composites = report.composite_columns.len(),
        "derived features"
    );

    let scaling = normalize(&mut table, &cfg.normalize_columns, cfg.normalization, &mut report);
    report.validation = validate(&table);
    report.output_rows = table.len();

    tracing::info!(
        input_rows = report.input_rows,
        output_rows = report.output_rows,
        features = report.normalized_columns.len(),
        skipped = report.skipped.len(),
        "preprocessing complete"
    );

    Ok((NormalizedFeatureTable::new(table, scaling), report))
}
