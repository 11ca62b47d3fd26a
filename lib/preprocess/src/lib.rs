//! # StatTwin Preprocess
//!
//! Turns raw player-season records into comparable, normalized feature
//! vectors.
//!
//! ## Stages
//!
//! - **Dedup**: collapse repeated (player, league, season) rows
//! - **Cleaning**: drop sparse rows, fill missing values, clip outliers
//! - **Derivation**: per-90 rates, ratios and composite sums
//! - **Normalization**: z-score or robust scaling into `*_z` columns
//! - **Validation**: negative minutes, percentage ranges, missing counts
//!
//! Degraded input never fails the pipeline; see [`PreprocessReport`].
//!
//! ## Example
//!
//! ```rust
//! use stattwin_core::{PlayerSeasonRecord, StatLine};
//! use stattwin_preprocess::{preprocess, PreprocessConfig};
//!
//! let records: Vec<_> = [(900.0, 10.0), (1800.0, 12.0)]
//!     .iter()
//!     .enumerate()
//!     .map(|(i, &(minutes, shots))| {
//!         let mut r = PlayerSeasonRecord::new(format!("p{}", i));
//!         r.minutes = minutes;
//!         r.stats = StatLine::default().with("shots", shots);
//!         r
//!     })
//!     .collect();
//!
//! let (table, report) = preprocess(records, &PreprocessConfig::default()).unwrap();
//! assert!(table.normalized_columns().contains(&"shots_per90_z".to_string()));
//! assert_eq!(report.output_rows, 2);
//! ```

pub mod clean;
pub mod config;
pub mod dedup;
pub mod derive;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod stats;
pub mod validate;

pub use config::{
    CategoricalPolicy, CompositeSpec, DedupPolicy, NormalizationMethod, NumericImputation,
    OutlierPolicy, PreprocessConfig, RatioSpec,
};
pub use derive::{per90_name, PER90_SUFFIX};
pub use pipeline::preprocess;
pub use report::{
    DroppedRows, Imputation, Per90Flags, PreprocessReport, RangeViolation, SkippedFeature, Stage,
    ValidationReport,
};
