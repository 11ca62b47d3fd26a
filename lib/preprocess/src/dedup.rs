use ahash::AHashMap;

use stattwin_core::{PlayerSeasonRecord, RecordKey, StatLine};

use crate::config::DedupPolicy;

/// Collapse records sharing (player, league, season) into one row each,
/// preserving first-occurrence order. Returns the rows and the number of
/// collapsed duplicates.
pub fn deduplicate(
    records: Vec<PlayerSeasonRecord>,
    policy: DedupPolicy,
) -> (Vec<PlayerSeasonRecord>, usize) {
    let mut out: Vec<PlayerSeasonRecord> = Vec::with_capacity(records.len());
    let mut seen: AHashMap<RecordKey, usize> = AHashMap::with_capacity(records.len());
    let mut collapsed = 0;

    for record in records {
        let key = record.key();
        match seen.get(&key).copied() {
            None => {
                seen.insert(key, out.len());
                out.push(record);
            }
            Some(idx) => {
                collapsed += 1;
                let existing = &mut out[idx];
                match policy {
                    DedupPolicy::KeepFirst => {}
                    DedupPolicy::KeepMostMinutes => {
                        if record.minutes > existing.minutes {
                            *existing = record;
                        }
                    }
                    DedupPolicy::Aggregate => {
                        existing.minutes += record.minutes;
                        merge_sum(&mut existing.stats, &record.stats);
                    }
                }
            }
        }
    }

    if collapsed > 0 {
        tracing::debug!(collapsed, ?policy, "collapsed duplicate player-season rows");
    }
    (out, collapsed)
}

fn merge_sum(into: &mut StatLine, other: &StatLine) {
    for name in other.declared_names() {
        let merged = match (into.get(name), other.get(name)) {
            (Some(a), Some(b)) => Some(a + b),
            (a, b) => a.or(b),
        };
        into.set(name, merged);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, season: &str, minutes: f64, shots: f64) -> PlayerSeasonRecord {
        let mut r = PlayerSeasonRecord::new(id);
        r.league = Some("EPL".into());
        r.season = Some(season.into());
        r.minutes = minutes;
        r.stats = StatLine::default().with("shots", shots);
        r
    }

    fn transfer_rows() -> Vec<PlayerSeasonRecord> {
        let mut second = record("p1", "2023-2024", 900.0, 6.0);
        second.stats.set("tackles", Some(3.0));
        vec![
            record("p1", "2023-2024", 600.0, 4.0),
            record("p2", "2023-2024", 1000.0, 1.0),
            second,
            record("p1", "2022-2023", 2000.0, 20.0),
        ]
    }

    #[test]
    fn test_aggregate_sums() {
        let (rows, collapsed) = deduplicate(transfer_rows(), DedupPolicy::Aggregate);
        assert_eq!(collapsed, 1);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].minutes, 1500.0);
        assert_eq!(rows[0].stats.get("shots"), Some(10.0));
        assert_eq!(rows[0].stats.get("tackles"), Some(3.0));
        assert_eq!(rows[1].player_id, "p2");
        assert_eq!(rows[2].season.as_deref(), Some("2022-2023"));
    }

    #[test]
    fn test_keep_first_and_most_minutes() {
        let (first, _) = deduplicate(transfer_rows(), DedupPolicy::KeepFirst);
        assert_eq!(first[0].minutes, 600.0);

        let (most, _) = deduplicate(transfer_rows(), DedupPolicy::KeepMostMinutes);
        assert_eq!(most[0].minutes, 900.0);
        assert_eq!(most[0].stats.get("shots"), Some(6.0));
    }

    #[test]
    fn test_first_occurrence_order_with_many_keys() {
        let records: Vec<_> = (0..200)
            .map(|i| record(&format!("p{}", i % 50), "2023-2024", 90.0, 1.0))
            .collect();
        let (rows, collapsed) = deduplicate(records, DedupPolicy::Aggregate);
        assert_eq!(collapsed, 150);
        let ids: Vec<_> = rows.iter().map(|r| r.player_id.clone()).collect();
        let expected: Vec<_> = (0..50).map(|i| format!("p{}", i)).collect();
        assert_eq!(ids, expected);
        assert!(rows.iter().all(|r| r.minutes == 360.0 && r.stats.get("shots") == Some(4.0)));
    }
}
