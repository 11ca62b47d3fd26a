//! In-memory feature tables
//!
//! Row metadata is stored row-wise, numeric features column-wise. Columns are
//! addressed by name through an index so derived features (per-90 rates,
//! ratios, normalized columns) can be appended without touching the rows.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::position::PositionSet;
use crate::record::{PlayerSeasonRecord, RecordKey, StatLine};
use crate::{Error, Result};

/// Name suffix marking a normalized column
pub const NORMALIZED_SUFFIX: &str = "_z";

/// Name of the normalized version of `column`
pub fn normalized_name(column: &str) -> String {
    format!("{}{}", column, NORMALIZED_SUFFIX)
}

/// Where a column came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Raw,
    Per90,
    Ratio,
    Composite,
    Normalized,
}

/// A named numeric column; `None` marks a missing value
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    pub values: Vec<Option<f64>>,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            kind,
            values,
        }
    }

    /// Column with every value present
    pub fn dense(name: impl Into<String>, kind: ColumnKind, values: &[f64]) -> Self {
        Self::new(name, kind, values.iter().copied().map(Some).collect())
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }

    /// Present, finite values
    pub fn present(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().flatten().copied().filter(|v| v.is_finite())
    }
}

/// Per-row identity and display attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowMeta {
    pub player_id: String,
    pub name: Option<String>,
    pub position: Option<String>,
    #[serde(skip)]
    pub positions: PositionSet,
    pub age: Option<u32>,
    pub league: Option<String>,
    pub continent: Option<String>,
    pub season: Option<String>,
    pub minutes: f64,
}

impl RowMeta {
    pub fn from_record(record: &PlayerSeasonRecord) -> Self {
        Self {
            player_id: record.player_id.clone(),
            name: record.name.clone(),
            position: record.position.clone(),
            positions: record.positions(),
            age: record.age,
            league: record.league.clone(),
            continent: record.continent.clone(),
            season: record.season.clone(),
            minutes: record.minutes,
        }
    }

    pub fn key(&self) -> RecordKey {
        RecordKey {
            player_id: self.player_id.clone(),
            league: self.league.clone().unwrap_or_default(),
            season: self.season.clone().unwrap_or_default(),
        }
    }

    /// Re-parse the position field, e.g. after it was filled in
    pub fn refresh_positions(&mut self) {
        self.positions = self.position.as_deref().map(PositionSet::parse).unwrap_or_default();
    }
}

/// Text-valued row attributes usable in filters and missing-value policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalField {
    PlayerId,
    Name,
    Position,
    League,
    Continent,
    Season,
}

impl CategoricalField {
    /// Fields that may be missing and are subject to the categorical policy
    pub const NULLABLE: [CategoricalField; 5] = [
        CategoricalField::Name,
        CategoricalField::Position,
        CategoricalField::League,
        CategoricalField::Continent,
        CategoricalField::Season,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoricalField::PlayerId => "player_id",
            CategoricalField::Name => "name",
            CategoricalField::Position => "position",
            CategoricalField::League => "league",
            CategoricalField::Continent => "continent",
            CategoricalField::Season => "season",
        }
    }

    pub fn get<'a>(&self, row: &'a RowMeta) -> Option<&'a str> {
        match self {
            CategoricalField::PlayerId => Some(row.player_id.as_str()),
            CategoricalField::Name => row.name.as_deref(),
            CategoricalField::Position => row.position.as_deref(),
            CategoricalField::League => row.league.as_deref(),
            CategoricalField::Continent => row.continent.as_deref(),
            CategoricalField::Season => row.season.as_deref(),
        }
    }

    /// Overwrite the field; `PlayerId` is never nullable and is left as is.
    pub fn set(&self, row: &mut RowMeta, value: Option<String>) {
        match self {
            CategoricalField::PlayerId => {}
            CategoricalField::Name => row.name = value,
            CategoricalField::Position => {
                row.position = value;
                row.refresh_positions();
            }
            CategoricalField::League => row.league = value,
            CategoricalField::Continent => row.continent = value,
            CategoricalField::Season => row.season = value,
        }
    }
}

impl FromStr for CategoricalField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "player_id" | "id" => Ok(CategoricalField::PlayerId),
            "name" => Ok(CategoricalField::Name),
            "position" => Ok(CategoricalField::Position),
            "league" => Ok(CategoricalField::League),
            "continent" => Ok(CategoricalField::Continent),
            "season" => Ok(CategoricalField::Season),
            other => Err(Error::UnknownColumn(other.to_string())),
        }
    }
}

/// Rows of player-season metadata plus named numeric columns
#[derive(Debug, Clone, Default)]
pub struct FeatureTable {
    rows: Vec<RowMeta>,
    columns: Vec<Column>,
    index: AHashMap<String, usize>,
}

impl FeatureTable {
    pub fn new(rows: Vec<RowMeta>) -> Self {
        Self {
            rows,
            columns: Vec::new(),
            index: AHashMap::new(),
        }
    }

    /// Build a raw table from records. A stat becomes a column when at least
    /// one record declares it; known stats come first in schema order, extra
    /// stats follow in name order.
    pub fn from_records(records: &[PlayerSeasonRecord]) -> Self {
        let rows = records.iter().map(RowMeta::from_record).collect();
        let mut table = Self::new(rows);

        for name in StatLine::KNOWN {
            if records.iter().any(|r| r.stats.declares(name)) {
                table.push_column(raw_column(name, records));
            }
        }

        let mut extra_names: Vec<&str> = records
            .iter()
            .flat_map(|r| r.stats.extra.keys().map(String::as_str))
            .collect();
        extra_names.sort_unstable();
        extra_names.dedup();
        for name in extra_names {
            table.push_column(raw_column(name, records));
        }

        table
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[RowMeta] {
        &self.rows
    }

    pub fn row(&self, idx: usize) -> &RowMeta {
        &self.rows[idx]
    }

    pub fn rows_mut(&mut self) -> &mut [RowMeta] {
        &mut self.rows
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.index.get(name).map(|&i| &self.columns[i])
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        match self.index.get(name) {
            Some(&i) => Some(&mut self.columns[i]),
            None => None,
        }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Names of columns of the given kind, in insertion order
    pub fn column_names(&self, kind: ColumnKind) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.name.clone())
            .collect()
    }

    /// Add a column, replacing any existing column with the same name.
    pub fn push_column(&mut self, column: Column) {
        assert_eq!(
            column.values.len(),
            self.rows.len(),
            "column '{}' length does not match row count",
            column.name
        );
        match self.index.get(&column.name) {
            Some(&i) => self.columns[i] = column,
            None => {
                self.index.insert(column.name.clone(), self.columns.len());
                self.columns.push(column);
            }
        }
    }

    /// Whether `name` resolves to a numeric value source: a column or one of
    /// the numeric row attributes (`age`, `minutes`).
    pub fn has_numeric(&self, name: &str) -> bool {
        matches!(name, "age" | "minutes") || self.has_column(name)
    }

    /// Numeric value of `name` at `row`, looking at row attributes first
    pub fn numeric_value(&self, row: usize, name: &str) -> Option<f64> {
        match name {
            "age" => self.rows[row].age.map(f64::from),
            "minutes" => Some(self.rows[row].minutes),
            _ => self.column(name).and_then(|c| c.values[row]),
        }
    }

    /// Indices of rows carrying the given identifier, in table order
    pub fn find_rows(&self, player_id: &str) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.player_id == player_id)
            .map(|(i, _)| i)
            .collect()
    }

    /// Keep only rows whose flag is set. Returns the number of dropped rows.
    pub fn retain_rows(&mut self, keep: &[bool]) -> usize {
        assert_eq!(keep.len(), self.rows.len());
        let before = self.rows.len();

        let mut flags = keep.iter();
        self.rows.retain(|_| *flags.next().unwrap_or(&false));
        for column in &mut self.columns {
            let mut flags = keep.iter();
            column.values.retain(|_| *flags.next().unwrap_or(&false));
        }

        let removed = before - self.rows.len();
        tracing::trace!(removed, remaining = self.rows.len(), "retained rows");
        removed
    }
}

fn raw_column(name: &str, records: &[PlayerSeasonRecord]) -> Column {
    Column::new(
        name,
        ColumnKind::Raw,
        records.iter().map(|r| r.stats.get(name)).collect(),
    )
}

/// Center and spread fitted for one normalized column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingParams {
    pub source: String,
    pub column: String,
    pub center: f64,
    pub spread: f64,
    /// True when the fitted spread was zero and scaling fell back to 1
    pub degenerate: bool,
}

impl ScalingParams {
    pub fn apply(&self, value: f64) -> f64 {
        let scale = if self.degenerate { 1.0 } else { self.spread };
        (value - self.center) / scale
    }
}

/// A feature table extended with normalized (`*_z`) columns and the scaling
/// parameters they were fitted with. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct NormalizedFeatureTable {
    table: FeatureTable,
    scaling: Vec<ScalingParams>,
}

impl NormalizedFeatureTable {
    pub fn new(table: FeatureTable, scaling: Vec<ScalingParams>) -> Self {
        Self { table, scaling }
    }

    pub fn table(&self) -> &FeatureTable {
        &self.table
    }

    pub fn scaling(&self) -> &[ScalingParams] {
        &self.scaling
    }

    /// Normalized feature names in table order
    pub fn normalized_columns(&self) -> Vec<String> {
        self.table.column_names(ColumnKind::Normalized)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
