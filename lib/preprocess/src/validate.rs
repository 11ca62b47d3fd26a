use stattwin_core::{ColumnKind, FeatureTable};

use crate::report::{RangeViolation, ValidationReport};

/// Whether a column holds a percentage expected within [0, 100]
pub fn is_percentage(name: &str) -> bool {
    name.ends_with("_pct") || name == "pass_completion"
}

/// Sanity checks over the finished table. Never modifies it.
pub fn validate(table: &FeatureTable) -> ValidationReport {
    let mut report = ValidationReport {
        invalid_minutes: table.rows().iter().filter(|r| r.minutes < 0.0).count(),
        ..Default::default()
    };

    for column in table.columns() {
        let missing = column.missing_count();
        if missing > 0 {
            report.missing_counts.insert(column.name.clone(), missing);
        }

        if column.kind == ColumnKind::Normalized || !is_percentage(&column.name) {
            continue;
        }
        let mut violation = RangeViolation::default();
        for value in column.present() {
            if value < 0.0 {
                violation.below_zero += 1;
            } else if value > 100.0 {
                violation.above_hundred += 1;
            }
        }
        if violation != RangeViolation::default() {
            report.out_of_range.insert(column.name.clone(), violation);
        }
    }

    if report.invalid_minutes > 0 || !report.out_of_range.is_empty() {
        tracing::warn!(
            invalid_minutes = report.invalid_minutes,
            out_of_range = report.out_of_range.len(),
            "validation found suspicious values"
        );
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use stattwin_core::{PlayerSeasonRecord, StatLine};

    #[test]
    fn test_validation_counts() {
        let mut a = PlayerSeasonRecord::new("a");
        a.minutes = -10.0;
        a.stats = StatLine::default().with("dribble_pct", 120.0).with("shots", 2.0);
        let mut b = PlayerSeasonRecord::new("b");
        b.minutes = 900.0;
        b.stats = StatLine::default().with("dribble_pct", -1.0);
        let mut c = PlayerSeasonRecord::new("c");
        c.stats = StatLine::default().with("dribble_pct", 55.0);

        let report = validate(&FeatureTable::from_records(&[a, b, c]));
        assert_eq!(report.invalid_minutes, 1);
        assert_eq!(
            report.out_of_range["dribble_pct"],
            RangeViolation { below_zero: 1, above_hundred: 1 }
        );
        assert_eq!(report.missing_counts.get("shots"), Some(&2));
        assert_eq!(report.missing_counts.get("dribble_pct"), None);
    }

    #[test]
    fn test_percentage_names() {
        assert!(is_percentage("pass_completion"));
        assert!(is_percentage("take_on_pct"));
        assert!(!is_percentage("pass_completion_z"));
        assert!(!is_percentage("shots"));
    }
}
