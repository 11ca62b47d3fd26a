// Integration tests for StatTwin
use stattwin::input::{parse_records, read_records};
use stattwin::prelude::*;
use stattwin_core::{Column, ColumnKind, FeatureTable, RowMeta};
use stattwin_preprocess::OutlierPolicy;
use std::io::Write;

fn record(id: &str, position: &str, minutes: f64, stats: StatLine) -> PlayerSeasonRecord {
    let mut r = PlayerSeasonRecord::new(id);
    r.name = Some(id.to_uppercase());
    r.position = Some(position.to_string());
    r.league = Some("EPL".into());
    r.continent = Some("Europe".into());
    r.season = Some("2023-2024".into());
    r.age = Some(24);
    r.minutes = minutes;
    r.stats = stats;
    r
}

/// Normalized table built directly from feature values
fn normalized(rows: &[(&str, &str, [f64; 2])], features: [&str; 2]) -> NormalizedFeatureTable {
    let meta = rows
        .iter()
        .map(|(id, pos, _)| {
            let mut r = PlayerSeasonRecord::new(*id);
            r.position = Some(pos.to_string());
            r.league = Some("EPL".into());
            r.season = Some("2023-2024".into());
            RowMeta::from_record(&r)
        })
        .collect();
    let mut table = FeatureTable::new(meta);
    for (i, name) in features.iter().enumerate() {
        let values: Vec<f64> = rows.iter().map(|(_, _, v)| v[i]).collect();
        table.push_column(Column::dense(*name, ColumnKind::Normalized, &values));
    }
    NormalizedFeatureTable::new(table, Vec::new())
}

fn squad() -> Vec<PlayerSeasonRecord> {
    let line = |shots: f64, tackles: f64| {
        StatLine::default()
            .with("shots", shots)
            .with("tackles", tackles)
    };
    vec![
        record("f1", "FW", 1800.0, line(30.0, 5.0)),
        record("f2", "FW", 1800.0, line(28.0, 6.0)),
        record("d1", "DF", 1800.0, line(2.0, 40.0)),
        record("m1", "MF", 1800.0, line(15.0, 20.0)),
    ]
}

fn plain_config() -> PreprocessConfig {
    PreprocessConfig {
        outliers: OutlierPolicy::None,
        ..Default::default()
    }
}

#[test]
fn test_end_to_end_position_restriction() {
    let table = normalized(
        &[
            ("A", "FW", [2.0, 0.0]),
            ("B", "FW", [1.8, 0.1]),
            ("C", "GK", [0.0, 0.0]),
        ],
        ["shots_per90_z", "tackles_per90_z"],
    );
    let query = SimilarityQuery::by_id("A")
        .with_metric(Metric::Cosine)
        .restrict_positions(true)
        .with_top_k(5);

    let result = similar_to_query(&table, &query).unwrap();
    assert_eq!(result.ids(), vec!["B"]);
    assert_eq!(result.stats.candidates_count, 1);
}

#[test]
fn test_role_weighting_changes_order() {
    let table = normalized(
        &[
            ("Q", "MF", [0.7, 0.7]),
            ("B", "FW", [0.9, 0.6]),
            ("C", "MF", [0.6, 0.9]),
        ],
        ["shots_per90_z", "passes_completed_per90_z"],
    );
    let query = SimilarityQuery::by_id("Q").with_top_k(2);

    let forward = query
        .clone()
        .with_weights(WeightSpec::for_role(PositionTag::Forward));
    assert_eq!(similar_to_query(&table, &forward).unwrap().ids(), vec!["B", "C"]);

    let midfield = query.with_weights(WeightSpec::for_role(PositionTag::Midfielder));
    assert_eq!(similar_to_query(&table, &midfield).unwrap().ids(), vec!["C", "B"]);
}

#[test]
fn test_preprocess_then_rank() {
    let (table, report) = preprocess(squad(), &plain_config()).unwrap();
    assert_eq!(report.output_rows, 4);
    assert!(table
        .normalized_columns()
        .iter()
        .any(|c| c == "shots_per90_z"));

    let query = SimilarityQuery::by_id("f1").with_top_k(10).with_explain(true);
    let result = similar_to_query(&table, &query).unwrap();
    assert_eq!(result.len(), 3);
    assert_eq!(result.ids()[0], "f2");
    assert_eq!(result.ids()[2], "d1");
    assert!(result.hits.iter().all(|h| h.contributions.is_some()));
    assert_eq!(result.stats.best_score, result.hits[0].score);

    let restricted = similar_to_query(&table, &query.clone().restrict_positions(true)).unwrap();
    assert_eq!(restricted.ids(), vec!["f2"]);
}

#[test]
fn test_filters_on_preprocessed_table() {
    let (table, _) = preprocess(squad(), &plain_config()).unwrap();
    let query = SimilarityQuery::by_id("f1")
        .with_filters(FilterSpec::new().position_in(&[PositionTag::Midfielder]));
    assert_eq!(similar_to_query(&table, &query).unwrap().ids(), vec!["m1"]);

    let nobody = SimilarityQuery::by_id("f1").with_filters(FilterSpec::new().age_range(Some(30), None));
    let result = similar_to_query(&table, &nobody).unwrap();
    assert!(result.is_empty());
    assert_eq!(result.stats.candidates_count, 0);
}

#[test]
fn test_rank_all_and_determinism() {
    let store = TableStore::load(squad(), &plain_config()).unwrap();
    let template = SimilarityQuery::by_id("").with_top_k(2);

    let first = store.rank_all(&template).unwrap();
    let second = store.rank_all(&template).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.len(), 4);
    for (key, result) in &first {
        assert_eq!(result.len(), 2);
        assert!(!result.ids().contains(&key.player_id.as_str()));
    }

    let query = SimilarityQuery::by_id("m1");
    assert_eq!(store.similar(&query).unwrap(), store.similar(&query).unwrap());
}

#[test]
fn test_unknown_player_is_reported() {
    let (table, _) = preprocess(squad(), &plain_config()).unwrap();
    let err = similar_to_query(&table, &SimilarityQuery::by_id("nobody")).unwrap_err();
    assert!(matches!(err, Error::QueryNotFound(_)));
}

#[test]
fn test_records_from_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("players.json");
    let mut file = std::fs::File::create(&path).unwrap();
    write!(
        file,
        r#"[
            {{"player_id": "a", "position": "FW", "minutes": 900, "stats": {{"shots": 10, "passes_completed": 40, "passes_attempted": 80}}}},
            {{"player_id": "b", "position": "FW", "minutes": 90, "stats": {{"shots": 9, "passes_completed": 30, "passes_attempted": 40}}}},
            {{"player_id": "c", "position": "DF", "minutes": 0, "stats": {{"shots": 2, "passes_completed": 10, "passes_attempted": 20}}}}
        ]"#
    )
    .unwrap();

    let records = read_records(&path).unwrap();
    assert_eq!(records, parse_records(&std::fs::read_to_string(&path).unwrap()).unwrap());

    let (table, report) = preprocess(records, &plain_config()).unwrap();
    let shots = table.table().column("shots_per90").unwrap();
    assert_eq!(shots.values, vec![Some(1.0), Some(9.0), Some(0.0)]);
    let completion = table.table().column("pass_completion").unwrap();
    assert_eq!(completion.values[0], Some(50.0));
    assert_eq!(report.per90["shots_per90"].zero_minutes, 1);
}
