//! Candidate filtering
//!
//! Filters narrow the candidate pool before scoring. They return row
//! selections and never modify the table.

use ahash::AHashSet;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use stattwin_core::{CategoricalField, Error, FeatureTable, PositionSet, PositionTag, Result};

/// Row predicate over a feature table
pub trait RowFilter: Sync {
    fn matches(&self, table: &FeatureTable, row: usize) -> bool;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Predicate {
    /// Inclusive numeric range; a missing value fails
    Range {
        column: String,
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
    },
    /// Inclusive lexicographic range on a text field
    LabelRange {
        field: CategoricalField,
        #[serde(default)]
        min: Option<String>,
        #[serde(default)]
        max: Option<String>,
    },
    /// Case-insensitive membership on a text field
    In {
        field: CategoricalField,
        values: Vec<String>,
    },
    /// Canonical position tags, matched by intersection
    PositionIn { tags: Vec<PositionTag> },
}

/// Predicates combined with AND. Empty matches every row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSpec {
    pub predicates: Vec<Predicate>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn with(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn range(self, column: &str, min: Option<f64>, max: Option<f64>) -> Self {
        self.with(Predicate::Range {
            column: column.to_string(),
            min,
            max,
        })
    }

    pub fn age_range(self, min: Option<u32>, max: Option<u32>) -> Self {
        self.range("age", min.map(f64::from), max.map(f64::from))
    }

    pub fn minutes_range(self, min: Option<f64>, max: Option<f64>) -> Self {
        self.range("minutes", min, max)
    }

    pub fn label_range(self, field: CategoricalField, min: Option<&str>, max: Option<&str>) -> Self {
        self.with(Predicate::LabelRange {
            field,
            min: min.map(str::to_string),
            max: max.map(str::to_string),
        })
    }

    pub fn field_in<I, S>(self, field: CategoricalField, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(Predicate::In {
            field,
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    pub fn league_in<I, S>(self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_in(CategoricalField::League, values)
    }

    pub fn continent_in<I, S>(self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_in(CategoricalField::Continent, values)
    }

    pub fn season_in<I, S>(self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.field_in(CategoricalField::Season, values)
    }

    pub fn position_in(self, tags: &[PositionTag]) -> Self {
        self.with(Predicate::PositionIn {
            tags: tags.to_vec(),
        })
    }

    /// Reject malformed predicates before any table is touched
    pub fn validate(&self) -> Result<()> {
        for predicate in &self.predicates {
            match predicate {
                Predicate::Range { column, min, max } => {
                    if min.is_some_and(f64::is_nan) || max.is_some_and(f64::is_nan) {
                        return Err(Error::InvalidFilter(format!("NaN bound on '{}'", column)));
                    }
                    if let (Some(lo), Some(hi)) = (min, max) {
                        if lo > hi {
                            return Err(Error::InvalidFilter(format!(
                                "range on '{}' has min {} > max {}",
                                column, lo, hi
                            )));
                        }
                    }
                }
                Predicate::LabelRange { field, min, max } => {
                    if let (Some(lo), Some(hi)) = (min, max) {
                        if lo > hi {
                            return Err(Error::InvalidFilter(format!(
                                "range on '{}' has min '{}' > max '{}'",
                                field.as_str(),
                                lo,
                                hi
                            )));
                        }
                    }
                }
                Predicate::In { .. } | Predicate::PositionIn { .. } => {}
            }
        }
        Ok(())
    }

    /// Validate and bind the predicates to a table
    pub fn compile(&self, table: &FeatureTable) -> Result<CompiledFilter> {
        self.validate()?;
        let predicates = self
            .predicates
            .iter()
            .map(|p| match p {
                Predicate::Range { column, min, max } => {
                    if !table.has_numeric(column) {
                        return Err(Error::UnknownColumn(column.clone()));
                    }
                    Ok(Compiled::Range {
                        column: column.clone(),
                        min: *min,
                        max: *max,
                    })
                }
                Predicate::LabelRange { field, min, max } => Ok(Compiled::LabelRange {
                    field: *field,
                    min: min.clone(),
                    max: max.clone(),
                }),
                Predicate::In { field, values } => Ok(Compiled::In {
                    field: *field,
                    values: values.iter().map(|v| v.trim().to_lowercase()).collect(),
                }),
                Predicate::PositionIn { tags } => {
                    Ok(Compiled::PositionIn(tags.iter().copied().collect()))
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(CompiledFilter { predicates })
    }
}

#[derive(Debug, Clone)]
enum Compiled {
    Range {
        column: String,
        min: Option<f64>,
        max: Option<f64>,
    },
    LabelRange {
        field: CategoricalField,
        min: Option<String>,
        max: Option<String>,
    },
    In {
        field: CategoricalField,
        values: AHashSet<String>,
    },
    PositionIn(PositionSet),
}

impl Compiled {
    fn matches(&self, table: &FeatureTable, row: usize) -> bool {
        match self {
            Compiled::Range { column, min, max } => match table.numeric_value(row, column) {
                Some(v) if !v.is_nan() => {
                    min.map_or(true, |lo| v >= lo) && max.map_or(true, |hi| v <= hi)
                }
                _ => false,
            },
            Compiled::LabelRange { field, min, max } => match field.get(table.row(row)) {
                Some(v) => {
                    min.as_deref().map_or(true, |lo| v >= lo)
                        && max.as_deref().map_or(true, |hi| v <= hi)
                }
                None => false,
            },
            Compiled::In { field, values } => field
                .get(table.row(row))
                .is_some_and(|v| values.contains(&v.trim().to_lowercase())),
            Compiled::PositionIn(tags) => table.row(row).positions.intersects(tags),
        }
    }
}

/// A [`FilterSpec`] bound to a table
#[derive(Debug, Clone)]
pub struct CompiledFilter {
    predicates: Vec<Compiled>,
}

impl RowFilter for CompiledFilter {
    fn matches(&self, table: &FeatureTable, row: usize) -> bool {
        self.predicates.iter().all(|p| p.matches(table, row))
    }
}

/// Keeps rows whose position tags intersect the query's
#[derive(Debug, Clone, Copy)]
pub struct PositionRestriction {
    tags: PositionSet,
}

impl PositionRestriction {
    /// `None` when the field has no recognizable position, which disables
    /// the restriction
    pub fn from_field(field: Option<&str>) -> Option<Self> {
        let tags = PositionSet::parse(field?);
        if tags.is_empty() {
            None
        } else {
            Some(Self { tags })
        }
    }
}

impl RowFilter for PositionRestriction {
    fn matches(&self, table: &FeatureTable, row: usize) -> bool {
        table.row(row).positions.intersects(&self.tags)
    }
}

/// Rows passing every filter, in table order
pub fn select_rows(table: &FeatureTable, filters: &[&dyn RowFilter]) -> Vec<usize> {
    (0..table.len())
        .into_par_iter()
        .filter(|&row| filters.iter().all(|f| f.matches(table, row)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use stattwin_core::{PlayerSeasonRecord, StatLine};

    fn table() -> FeatureTable {
        let rows = [
            ("a", "FW", 24, "Premier League", "Europe", "2023-2024", 2500.0),
            ("b", "MF,FW", 31, "Serie A", "Europe", "2022-2023", 1200.0),
            ("c", "CB", 19, "MLS", "North America", "2023-2024", 300.0),
            ("d", "GK", 28, "premier league", "Europe", "2023-2024", 3000.0),
        ];
        let mut records: Vec<_> = rows
            .iter()
            .map(|&(id, pos, age, league, continent, season, minutes)| {
                let mut r = PlayerSeasonRecord::new(id);
                r.position = Some(pos.into());
                r.age = Some(age);
                r.league = Some(league.into());
                r.continent = Some(continent.into());
                r.season = Some(season.into());
                r.minutes = minutes;
                r.stats = StatLine::default().with("shots", minutes / 100.0);
                r
            })
            .collect();
        records.push(PlayerSeasonRecord::new("e"));
        FeatureTable::from_records(&records)
    }

    fn ids(table: &FeatureTable, spec: &FilterSpec) -> Vec<String> {
        let filter = spec.compile(table).unwrap();
        select_rows(table, &[&filter])
            .into_iter()
            .map(|i| table.row(i).player_id.clone())
            .collect()
    }

    #[test]
    fn test_age_range_excludes_missing() {
        let t = table();
        let spec = FilterSpec::new().age_range(Some(20), Some(30));
        assert_eq!(ids(&t, &spec), vec!["a", "d"]);
        let spec = FilterSpec::new().age_range(None, Some(24));
        assert_eq!(ids(&t, &spec), vec!["a", "c"]);
    }

    #[test]
    fn test_membership_is_case_insensitive() {
        let t = table();
        let spec = FilterSpec::new().league_in(["Premier League"]);
        assert_eq!(ids(&t, &spec), vec!["a", "d"]);
        let spec = FilterSpec::new().continent_in(["europe"]).season_in(["2023-2024"]);
        assert_eq!(ids(&t, &spec), vec!["a", "d"]);
    }

    #[test]
    fn test_position_in_uses_tags() {
        let t = table();
        let spec = FilterSpec::new().position_in(&[PositionTag::Forward]);
        assert_eq!(ids(&t, &spec), vec!["a", "b"]);
    }

    #[test]
    fn test_numeric_column_and_label_range() {
        let t = table();
        let spec = FilterSpec::new().range("shots", Some(12.0), None);
        assert_eq!(ids(&t, &spec), vec!["a", "b", "d"]);
        let spec = FilterSpec::new().minutes_range(Some(1000.0), Some(2500.0));
        assert_eq!(ids(&t, &spec), vec!["a", "b"]);
        let spec = FilterSpec::new().label_range(CategoricalField::Season, Some("2023"), None);
        assert_eq!(ids(&t, &spec), vec!["a", "c", "d"]);
    }

    #[test]
    fn test_invalid_ranges() {
        let t = table();
        let err = FilterSpec::new().age_range(Some(30), Some(20)).compile(&t).unwrap_err();
        assert!(matches!(err, Error::InvalidFilter(_)));

        let err = FilterSpec::new().range("dribbles", Some(1.0), None).compile(&t).unwrap_err();
        assert!(matches!(err, Error::UnknownColumn(ref c) if c == "dribbles"));
    }

    #[test]
    fn test_position_restriction() {
        let t = table();
        assert!(PositionRestriction::from_field(Some("??")).is_none());
        assert!(PositionRestriction::from_field(None).is_none());

        let restriction = PositionRestriction::from_field(Some("ST / AM")).unwrap();
        let rows = select_rows(&t, &[&restriction]);
        assert_eq!(rows, vec![0, 1]);
    }

    #[test]
    fn test_spec_serde() {
        let spec: FilterSpec = serde_json::from_str(
            r#"[
                {"type": "range", "column": "age", "min": 20, "max": 30},
                {"type": "in", "field": "league", "values": ["Serie A"]},
                {"type": "position_in", "tags": ["forward"]}
            ]"#,
        )
        .unwrap();
        assert_eq!(spec.predicates.len(), 3);
        assert_eq!(ids(&table(), &spec), Vec::<String>::new());
    }
}
