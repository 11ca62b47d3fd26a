//! Similarity scoring and ranking
//!
//! A query is prepared once against a table (feature selection, filter
//! binding, return columns), then run for one target row or vector:
//!
//! ```text
//! candidates = filter ∩ position restriction − rows sharing the query id
//! matrix     = gather(candidates, features) ⊙ weights
//! scores     = metric(query ⊙ weights, matrix)
//! hits       = top-k by (score desc, player_id asc, row asc)
//! ```

use rayon::prelude::*;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::str::FromStr;

use stattwin_core::{
    matrix::sanitize, simd, CategoricalField, Error, FeatureMatrix, FeatureTable,
    NormalizedFeatureTable, RecordKey, Result,
};

use crate::explain::{SimilarHit, SimilarityResult, SimilarityStats};
use crate::filter::{select_rows, CompiledFilter, PositionRestriction, RowFilter};
use crate::query::{QueryTarget, SimilarityQuery};

/// Rank candidates against a single query target.
///
/// Configuration problems (bad weights, filters) are reported before any
/// data is looked at; data problems (unknown query, unknown feature,
/// dimension mismatch) leave the table untouched.
pub fn similar_to_query(
    table: &NormalizedFeatureTable,
    query: &SimilarityQuery,
) -> Result<SimilarityResult> {
    let prepared = PreparedQuery::new(table, query)?;
    let target = prepared.resolve_target()?;
    prepared.run(target)
}

/// Run `template` once per table row, with that row as the target. The
/// template's own target is ignored. Keys are the rows' record keys; if a
/// key repeats, the first row wins.
pub fn rank_all_against_all(
    table: &NormalizedFeatureTable,
    template: &SimilarityQuery,
) -> Result<BTreeMap<RecordKey, SimilarityResult>> {
    let prepared = PreparedQuery::new(table, template)?;
    let rows = table.table();

    let results = (0..rows.len())
        .into_par_iter()
        .map(|row| {
            let target = prepared.target_from_row(row)?;
            Ok((rows.row(row).key(), prepared.run(target)?))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut out = BTreeMap::new();
    for (key, result) in results {
        out.entry(key).or_insert(result);
    }
    tracing::info!(queries = out.len(), rows = rows.len(), "ranked all rows");
    Ok(out)
}

/// Feature list for a query: the explicit list, or every normalized column
pub fn select_features(
    table: &NormalizedFeatureTable,
    explicit: Option<&[String]>,
) -> Result<Vec<String>> {
    let features = match explicit {
        Some(list) => {
            if let Some(missing) = list.iter().find(|f| !table.table().has_column(f)) {
                return Err(Error::UnknownFeature(missing.clone()));
            }
            list.to_vec()
        }
        None => table.normalized_columns(),
    };
    if features.is_empty() {
        return Err(Error::NoFeatures);
    }
    Ok(features)
}

enum ReturnColumn {
    Text(String, CategoricalField),
    Age,
    Numeric(String),
}

impl ReturnColumn {
    fn resolve(table: &FeatureTable, name: &str) -> Result<Self> {
        if let Ok(field) = CategoricalField::from_str(name) {
            return Ok(ReturnColumn::Text(name.to_string(), field));
        }
        match name {
            "age" => Ok(ReturnColumn::Age),
            _ if table.has_numeric(name) => Ok(ReturnColumn::Numeric(name.to_string())),
            _ => Err(Error::UnknownColumn(name.to_string())),
        }
    }

    fn name(&self) -> &str {
        match self {
            ReturnColumn::Text(name, _) | ReturnColumn::Numeric(name) => name,
            ReturnColumn::Age => "age",
        }
    }

    fn value(&self, table: &FeatureTable, row: usize) -> Value {
        match self {
            ReturnColumn::Text(_, field) => field.get(table.row(row)).map_or(Value::Null, Value::from),
            ReturnColumn::Age => table.row(row).age.map_or(Value::Null, Value::from),
            ReturnColumn::Numeric(name) => table
                .numeric_value(row, name)
                .and_then(serde_json::Number::from_f64)
                .map_or(Value::Null, Value::Number),
        }
    }
}

/// Resolved query target: an unweighted vector plus where it came from
struct Target {
    row: Option<usize>,
    player_id: Option<String>,
    position: Option<String>,
    vector: Vec<f32>,
}

/// The target-independent part of a query, bound to one table
struct PreparedQuery<'a> {
    table: &'a FeatureTable,
    query: &'a SimilarityQuery,
    features: Vec<String>,
    filter: CompiledFilter,
    return_columns: Vec<ReturnColumn>,
}

impl<'a> PreparedQuery<'a> {
    fn new(normalized: &'a NormalizedFeatureTable, query: &'a SimilarityQuery) -> Result<Self> {
        query.weights.validate()?;
        query.filters.validate()?;

        let table = normalized.table();
        if table.is_empty() {
            return Err(Error::EmptyTable);
        }
        let features = select_features(normalized, query.features.as_deref())?;
        let filter = query.filters.compile(table)?;
        let return_columns = query
            .return_columns
            .iter()
            .map(|c| ReturnColumn::resolve(table, c))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            table,
            query,
            features,
            filter,
            return_columns,
        })
    }

    fn resolve_target(&self) -> Result<Target> {
        match &self.query.target {
            QueryTarget::Record {
                player_id,
                league,
                season,
            } => {
                let row = self
                    .table
                    .find_rows(player_id)
                    .into_iter()
                    .find(|&r| {
                        let meta = self.table.row(r);
                        league.as_deref().map_or(true, |l| meta.league.as_deref() == Some(l))
                            && season.as_deref().map_or(true, |s| meta.season.as_deref() == Some(s))
                    })
                    .ok_or_else(|| {
                        let mut described = player_id.clone();
                        for part in [league, season].into_iter().flatten() {
                            described.push('/');
                            described.push_str(part);
                        }
                        Error::QueryNotFound(described)
                    })?;
                self.target_from_row(row)
            }
            QueryTarget::Vector { values, position } => {
                if values.len() != self.features.len() {
                    return Err(Error::DimensionMismatch {
                        expected: self.features.len(),
                        actual: values.len(),
                    });
                }
                Ok(Target {
                    row: None,
                    player_id: None,
                    position: position.clone(),
                    vector: FeatureMatrix::from_row(values).as_slice().to_vec(),
                })
            }
        }
    }

    fn target_from_row(&self, row: usize) -> Result<Target> {
        let meta = self.table.row(row);
        let vector = self
            .features
            .iter()
            .map(|name| {
                self.table
                    .column(name)
                    .map(|c| sanitize(c.values[row]))
                    .ok_or_else(|| Error::UnknownFeature(name.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Target {
            row: Some(row),
            player_id: Some(meta.player_id.clone()),
            position: meta.position.clone(),
            vector,
        })
    }

    fn run(&self, target: Target) -> Result<SimilarityResult> {
        let metric = self.query.metric;
        let weights = self
            .query
            .weights
            .resolve(&self.features, target.position.as_deref())?;

        let restriction = if self.query.restrict_to_query_positions {
            PositionRestriction::from_field(target.position.as_deref())
        } else {
            None
        };
        let mut filters: Vec<&dyn RowFilter> = vec![&self.filter];
        if let Some(restriction) = &restriction {
            filters.push(restriction);
        }
        let mut candidates = select_rows(self.table, &filters);
        if let Some(id) = &target.player_id {
            candidates.retain(|&r| self.table.row(r).player_id != *id);
        }

        let mut query_vector = target.vector;
        simd::scale_in_place(&mut query_vector, weights.aligned());
        let mut matrix = FeatureMatrix::gather(self.table, &self.features, &candidates)?;
        matrix.scale_columns(weights.aligned())?;
        let scores = metric.scores(&matrix, &query_vector)?;

        let top = self.top_k(&candidates, &scores);
        let mut top_feature = None;
        let hits: Vec<SimilarHit> = top
            .iter()
            .enumerate()
            .map(|(rank, &(pos, score))| {
                let row = candidates[pos];
                let terms = (self.query.explain || rank == 0)
                    .then(|| metric.contributions(&query_vector, matrix.row(pos)));
                if rank == 0 {
                    top_feature = terms
                        .as_deref()
                        .and_then(|t| metric.top_term(t))
                        .map(|i| self.features[i].clone());
                }
                let contributions = terms.filter(|_| self.query.explain).map(|t| {
                    self.features.iter().cloned().zip(t).collect::<BTreeMap<_, _>>()
                });
                SimilarHit {
                    index: row,
                    player_id: self.table.row(row).player_id.clone(),
                    score,
                    attributes: self
                        .return_columns
                        .iter()
                        .map(|c| (c.name().to_string(), c.value(self.table, row)))
                        .collect(),
                    contributions,
                }
            })
            .collect();

        let stats = SimilarityStats::compute(&hits, candidates.len(), top_feature);
        tracing::debug!(
            query = target.player_id.as_deref().unwrap_or("<vector>"),
            candidates = stats.candidates_count,
            results = stats.results_count,
            %metric,
            "similarity query"
        );

        Ok(SimilarityResult {
            query_index: target.row,
            query_id: target.player_id,
            metric,
            features: self.features.clone(),
            hits,
            stats,
        })
    }

    /// Best `top_k` (candidate position, score) pairs, best first
    fn top_k(&self, candidates: &[usize], scores: &[f32]) -> Vec<(usize, f32)> {
        let k = self.query.top_k.min(scores.len());
        if k == 0 {
            return Vec::new();
        }

        // + 0.0 folds -0.0 into 0.0 so equal scores tie-break on identity
        let mut order: Vec<(usize, f32)> = scores
            .iter()
            .enumerate()
            .map(|(pos, &s)| (pos, s + 0.0))
            .collect();
        let cmp = |a: &(usize, f32), b: &(usize, f32)| -> Ordering {
            let (ra, rb) = (candidates[a.0], candidates[b.0]);
            b.1.total_cmp(&a.1)
                .then_with(|| self.table.row(ra).player_id.cmp(&self.table.row(rb).player_id))
                .then_with(|| ra.cmp(&rb))
        };

        if k < order.len() {
            order.select_nth_unstable_by(k - 1, cmp);
            order.truncate(k);
        }
        order.sort_unstable_by(cmp);
        order
    }
}
