//! Result types and explainability
//!
//! Hits carry the selected display attributes and, on request, the
//! per-feature terms that make up their score.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::metric::Metric;

/// One ranked candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarHit {
    /// Row index in the queried table
    pub index: usize,
    pub player_id: String,
    pub score: f32,
    /// Requested return columns, JSON null when missing
    pub attributes: BTreeMap<String, Value>,
    /// Per-feature score terms (weighted)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contributions: Option<BTreeMap<String, f32>>,
}

/// Summary statistics for a similarity query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityStats {
    /// Number of candidates considered
    pub candidates_count: usize,
    /// Number of results returned
    pub results_count: usize,
    /// Average score of results
    pub avg_score: f32,
    /// Score of best result
    pub best_score: f32,
    /// Feature that contributed most to the best result
    pub top_contributing_feature: Option<String>,
}

impl SimilarityStats {
    /// Stats over hits sorted best first. `top_feature` comes from the best
    /// hit's contribution terms.
    pub fn compute(hits: &[SimilarHit], candidates_count: usize, top_feature: Option<String>) -> Self {
        if hits.is_empty() {
            return Self {
                candidates_count,
                results_count: 0,
                avg_score: 0.0,
                best_score: 0.0,
                top_contributing_feature: None,
            };
        }

        let avg_score = hits.iter().map(|h| h.score).sum::<f32>() / hits.len() as f32;
        Self {
            candidates_count,
            results_count: hits.len(),
            avg_score,
            best_score: hits[0].score,
            top_contributing_feature: top_feature,
        }
    }
}

/// Ranked hits for one query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityResult {
    /// Row the query was taken from, `None` for vector queries
    pub query_index: Option<usize>,
    pub query_id: Option<String>,
    pub metric: Metric,
    /// Features compared, in vector order
    pub features: Vec<String>,
    pub hits: Vec<SimilarHit>,
    pub stats: SimilarityStats,
}

impl SimilarityResult {
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Identifiers of the hits, best first
    pub fn ids(&self) -> Vec<&str> {
        self.hits.iter().map(|h| h.player_id.as_str()).collect()
    }

    pub fn best(&self) -> Option<&SimilarHit> {
        self.hits.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hit(id: &str, score: f32) -> SimilarHit {
        SimilarHit {
            index: 0,
            player_id: id.to_string(),
            score,
            attributes: BTreeMap::from([("player_id".to_string(), json!(id))]),
            contributions: None,
        }
    }

    #[test]
    fn test_stats() {
        let hits = vec![hit("a", 0.9), hit("b", 0.5)];
        let stats = SimilarityStats::compute(&hits, 7, Some("shots_z".into()));
        assert_eq!(stats.candidates_count, 7);
        assert_eq!(stats.results_count, 2);
        assert!((stats.avg_score - 0.7).abs() < 1e-6);
        assert_eq!(stats.best_score, 0.9);
        assert_eq!(stats.top_contributing_feature.as_deref(), Some("shots_z"));

        let empty = SimilarityStats::compute(&[], 3, Some("x".into()));
        assert_eq!(empty.results_count, 0);
        assert_eq!(empty.top_contributing_feature, None);
    }

    #[test]
    fn test_hit_serialization_skips_empty_contributions() {
        let value = serde_json::to_value(hit("a", 1.0)).unwrap();
        assert!(value.get("contributions").is_none());
        assert_eq!(value["attributes"]["player_id"], "a");
    }
}
