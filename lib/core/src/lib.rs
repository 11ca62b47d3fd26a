//! # StatTwin Core
//!
//! Core data model for the StatTwin similarity engine.
//!
//! This crate provides the fundamental data structures:
//!
//! - [`PlayerSeasonRecord`] - One player's statistics for one league-season
//! - [`StatLine`] - Known provider stats plus an extension map
//! - [`FeatureTable`] - Row metadata with named numeric columns
//! - [`NormalizedFeatureTable`] - A feature table with fitted `*_z` columns
//! - [`PositionSet`] - Canonical position tags parsed from free text
//! - [`FeatureMatrix`] - Dense row-major matrix for bulk scoring
//!
//! ## Example
//!
//! ```rust
//! use stattwin_core::{FeatureTable, PlayerSeasonRecord, StatLine, PositionTag};
//!
//! let mut record = PlayerSeasonRecord::new("p1");
//! record.position = Some("FW,MF".to_string());
//! record.minutes = 1800.0;
//! record.stats = StatLine::default().with("shots", 40.0);
//!
//! assert!(record.positions().contains(PositionTag::Forward));
//!
//! let table = FeatureTable::from_records(&[record]);
//! assert_eq!(table.numeric_value(0, "shots"), Some(40.0));
//! ```

pub mod error;
pub mod matrix;
pub mod position;
pub mod record;
pub mod table;

/// SIMD-optimized row kernels
///
/// - AVX2/FMA on x86_64 for wide rows
/// - Two-accumulator scalar code elsewhere
pub mod simd;

pub use error::{Error, ErrorKind, Result};
pub use matrix::FeatureMatrix;
pub use position::{PositionSet, PositionTag};
pub use record::{PlayerSeasonRecord, RecordKey, StatLine};
pub use table::{
    normalized_name, CategoricalField, Column, ColumnKind, FeatureTable, NormalizedFeatureTable,
    RowMeta, ScalingParams, NORMALIZED_SUFFIX,
};
