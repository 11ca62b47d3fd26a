//! # StatTwin Similarity
//!
//! Position-aware similarity search over normalized player-season tables.
//!
//! ## Features
//!
//! - **Weighting**: role keyword boosts or an explicit per-feature map
//! - **Candidate filters**: numeric and label ranges, membership, positions
//! - **Metrics**: weighted cosine and euclidean (`1 / (1 + d)`)
//! - **Explainability**: per-feature contributions and summary statistics
//! - **Batch ranking**: every row against the table, in parallel
//!
//! ## Example
//!
//! ```rust
//! use stattwin_core::{PlayerSeasonRecord, PositionTag, StatLine};
//! use stattwin_preprocess::{preprocess, PreprocessConfig};
//! use stattwin_similarity::{similar_to_query, SimilarityQuery, WeightSpec};
//!
//! let records: Vec<_> = [("a", "FW", 30.0), ("b", "FW", 28.0), ("c", "DF", 2.0)]
//!     .iter()
//!     .map(|&(id, pos, shots)| {
//!         let mut r = PlayerSeasonRecord::new(id);
//!         r.position = Some(pos.to_string());
//!         r.minutes = 1800.0;
//!         r.stats = StatLine::default().with("shots", shots).with("tackles", 40.0 - shots);
//!         r
//!     })
//!     .collect();
//! let (table, _) = preprocess(records, &PreprocessConfig::default()).unwrap();
//!
//! let query = SimilarityQuery::by_id("a")
//!     .restrict_positions(true)
//!     .with_weights(WeightSpec::for_role(PositionTag::Forward))
//!     .with_top_k(5);
//! let result = similar_to_query(&table, &query).unwrap();
//! assert_eq!(result.ids(), vec!["b"]);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Normalized  │────>│   Filter    │────>│  Weighting  │
//! │   table     │     │ (candidates)│     │  (role/map) │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                                                │
//!                     ┌─────────────┐     ┌─────────────┐
//!                     │  Explain    │<────│   Ranker    │
//!                     │  (results)  │     │ (top-k)     │
//!                     └─────────────┘     └─────────────┘
//! ```

pub mod explain;
pub mod filter;
pub mod metric;
pub mod query;
pub mod rank;
pub mod store;
pub mod weights;

pub use explain::{SimilarHit, SimilarityResult, SimilarityStats};
pub use filter::{select_rows, CompiledFilter, FilterSpec, PositionRestriction, Predicate, RowFilter};
pub use metric::Metric;
pub use query::{QueryTarget, SimilarityQuery, DEFAULT_RETURN_COLUMNS, DEFAULT_TOP_K};
pub use rank::{rank_all_against_all, select_features, similar_to_query};
pub use store::TableStore;
pub use weights::{role_keywords, RoleChoice, WeightSpec, WeightVector, DEFAULT_BOOST, ROLE_KEYWORDS};
