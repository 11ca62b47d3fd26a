//! # StatTwin
//!
//! Find the player-seasons that statistically resemble a reference
//! player-season.
//!
//! StatTwin turns raw per-season statistics into per-90, ratio and composite
//! features, normalizes them, and ranks candidates against a query with
//! position-aware weighting and explainable scores.
//!
//! ## Quick Start
//!
//! ### From the command line
//!
//! ```bash
//! stattwin preprocess --input players.json
//! stattwin similar --input players.json --id 92e7e919 --restrict-positions --role from_query
//! stattwin rank-all --input players.json --top-k 3
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use stattwin::prelude::*;
//!
//! let records = stattwin::input::read_records("players.json".as_ref()).unwrap();
//! let store = TableStore::load(records, &PreprocessConfig::default()).unwrap();
//!
//! let query = SimilarityQuery::by_id("92e7e919")
//!     .restrict_positions(true)
//!     .with_weights(WeightSpec::from_query_role())
//!     .with_filters(FilterSpec::new().age_range(Some(18), Some(25)))
//!     .with_top_k(10);
//! for hit in store.similar(&query).unwrap().hits {
//!     println!("{} {:.3}", hit.player_id, hit.score);
//! }
//! ```
//!
//! ## Crate Structure
//!
//! - [`stattwin-core`](https://docs.rs/stattwin-core) - Records, feature tables, position tags, kernels
//! - [`stattwin-preprocess`](https://docs.rs/stattwin-preprocess) - Cleaning, per-90, ratios, normalization
//! - [`stattwin-similarity`](https://docs.rs/stattwin-similarity) - Weighting, filters, ranking, explanations

pub mod input;

// Re-export core types
pub use stattwin_core::{
    CategoricalField, Error, ErrorKind, FeatureTable, NormalizedFeatureTable, PlayerSeasonRecord,
    PositionSet, PositionTag, RecordKey, Result, StatLine,
};

// Re-export preprocessing
pub use stattwin_preprocess::{preprocess, PreprocessConfig, PreprocessReport};

// Re-export similarity
pub use stattwin_similarity::{
    rank_all_against_all, similar_to_query, FilterSpec, Metric, RoleChoice, SimilarHit,
    SimilarityQuery, SimilarityResult, TableStore, WeightSpec,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        preprocess, rank_all_against_all, similar_to_query, Error, FilterSpec, Metric,
        NormalizedFeatureTable, PlayerSeasonRecord, PositionTag, PreprocessConfig,
        PreprocessReport, Result, RoleChoice, SimilarityQuery, SimilarityResult, StatLine,
        TableStore, WeightSpec,
    };
}
