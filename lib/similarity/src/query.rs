use serde::{Deserialize, Serialize};

use crate::filter::FilterSpec;
use crate::metric::Metric;
use crate::weights::WeightSpec;

pub const DEFAULT_TOP_K: usize = 10;

/// Display attributes attached to each hit unless overridden
pub const DEFAULT_RETURN_COLUMNS: [&str; 5] = ["player_id", "name", "position", "league", "season"];

/// What to compare candidates against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryTarget {
    /// A table row by identifier. `league`/`season` narrow the match when the
    /// identifier has several rows; the first match in table order is used.
    Record {
        player_id: String,
        #[serde(default)]
        league: Option<String>,
        #[serde(default)]
        season: Option<String>,
    },
    /// A feature vector aligned with the query's feature list
    Vector {
        values: Vec<f32>,
        #[serde(default)]
        position: Option<String>,
    },
}

/// A single similarity query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityQuery {
    pub target: QueryTarget,
    /// Feature columns to compare; every normalized column when `None`
    #[serde(default)]
    pub features: Option<Vec<String>>,
    #[serde(default)]
    pub filters: FilterSpec,
    #[serde(default)]
    pub weights: WeightSpec,
    /// Keep only candidates sharing a position tag with the query
    #[serde(default)]
    pub restrict_to_query_positions: bool,
    #[serde(default)]
    pub metric: Metric,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_return_columns")]
    pub return_columns: Vec<String>,
    /// Attach per-feature contributions to each hit
    #[serde(default)]
    pub explain: bool,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_return_columns() -> Vec<String> {
    DEFAULT_RETURN_COLUMNS.iter().map(|c| c.to_string()).collect()
}

impl SimilarityQuery {
    pub fn new(target: QueryTarget) -> Self {
        Self {
            target,
            features: None,
            filters: FilterSpec::default(),
            weights: WeightSpec::default(),
            restrict_to_query_positions: false,
            metric: Metric::default(),
            top_k: DEFAULT_TOP_K,
            return_columns: default_return_columns(),
            explain: false,
        }
    }

    pub fn by_id(player_id: impl Into<String>) -> Self {
        Self::new(QueryTarget::Record {
            player_id: player_id.into(),
            league: None,
            season: None,
        })
    }

    pub fn by_vector(values: Vec<f32>, position: Option<&str>) -> Self {
        Self::new(QueryTarget::Vector {
            values,
            position: position.map(str::to_string),
        })
    }

    /// Narrow a record target to one league and/or season
    pub fn narrowed(mut self, league: Option<&str>, season: Option<&str>) -> Self {
        if let QueryTarget::Record {
            league: l,
            season: s,
            ..
        } = &mut self.target
        {
            *l = league.map(str::to_string);
            *s = season.map(str::to_string);
        }
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_filters(mut self, filters: FilterSpec) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_weights(mut self, weights: WeightSpec) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.features = Some(features.into_iter().map(Into::into).collect());
        self
    }

    pub fn restrict_positions(mut self, restrict: bool) -> Self {
        self.restrict_to_query_positions = restrict;
        self
    }

    pub fn with_return_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.return_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_explain(mut self, explain: bool) -> Self {
        self.explain = explain;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_json() {
        let q: SimilarityQuery =
            serde_json::from_str(r#"{"target": {"record": {"player_id": "p1"}}}"#).unwrap();
        assert_eq!(q, SimilarityQuery::by_id("p1"));
        assert_eq!(q.top_k, 10);
        assert_eq!(q.metric, Metric::Cosine);
        assert_eq!(q.return_columns.len(), 5);
        assert!(!q.restrict_to_query_positions);
    }

    #[test]
    fn test_builders() {
        let q = SimilarityQuery::by_id("p1")
            .narrowed(Some("EPL"), None)
            .with_top_k(3)
            .with_metric(Metric::Euclidean)
            .with_features(["shots_z"])
            .restrict_positions(true);
        assert_eq!(
            q.target,
            QueryTarget::Record {
                player_id: "p1".into(),
                league: Some("EPL".into()),
                season: None
            }
        );
        assert_eq!(q.features, Some(vec!["shots_z".to_string()]));

        let v = SimilarityQuery::by_vector(vec![1.0], Some("FW")).narrowed(Some("EPL"), None);
        assert!(matches!(v.target, QueryTarget::Vector { ref position, .. } if position.as_deref() == Some("FW")));
    }
}
