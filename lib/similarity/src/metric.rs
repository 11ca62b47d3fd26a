//! Similarity metrics
//!
//! Both metrics produce a score where higher means more similar: cosine in
//! [-1, 1], euclidean as `1 / (1 + d)` in (0, 1].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use stattwin_core::{simd, Error, FeatureMatrix, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Cosine,
    Euclidean,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Cosine => "cosine",
            Metric::Euclidean => "euclidean",
        }
    }

    /// Score `query` against every row of `candidates`, in row order
    pub fn scores(&self, candidates: &FeatureMatrix, query: &[f32]) -> Result<Vec<f32>> {
        match self {
            Metric::Cosine => candidates.cosine_scores(query),
            Metric::Euclidean => Ok(candidates
                .euclidean_distances(query)?
                .into_iter()
                .map(|d| (1.0 / (1.0 + d)) as f32)
                .collect()),
        }
    }

    /// Per-feature terms of the score between two weighted vectors.
    ///
    /// Cosine: `q[i] * c[i] / (|q| |c|)`, which sums to the score.
    /// Euclidean: `(q[i] - c[i])^2`, which sums to the squared distance.
    pub fn contributions(&self, query: &[f32], candidate: &[f32]) -> Vec<f32> {
        match self {
            Metric::Cosine => {
                let denom = simd::norm_wide(query) * simd::norm_wide(candidate);
                if denom == 0.0 {
                    return vec![0.0; query.len()];
                }
                query
                    .iter()
                    .zip(candidate)
                    .map(|(q, c)| (*q as f64 * *c as f64 / denom) as f32)
                    .collect()
            }
            Metric::Euclidean => query
                .iter()
                .zip(candidate)
                .map(|(q, c)| {
                    let d = *q as f64 - *c as f64;
                    (d * d) as f32
                })
                .collect(),
        }
    }

    /// Index of the term that helps the score most: the largest cosine term,
    /// or the smallest squared difference.
    pub fn top_term(&self, terms: &[f32]) -> Option<usize> {
        let best = terms.iter().enumerate().reduce(|best, cur| {
            let better = match self {
                Metric::Cosine => cur.1 > best.1,
                Metric::Euclidean => cur.1 < best.1,
            };
            if better {
                cur
            } else {
                best
            }
        });
        best.map(|(i, _)| i)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosine" => Ok(Metric::Cosine),
            "euclidean" => Ok(Metric::Euclidean),
            _ => Err(Error::UnknownMetric(s.to_string())),
        }
    }
}
