//! Record and config input
//!
//! Records are read from a JSON array or from JSON lines (one record per
//! line, blank lines skipped).

use std::fs;
use std::path::Path;

use stattwin_core::{Error, PlayerSeasonRecord, Result};
use stattwin_preprocess::PreprocessConfig;

pub fn read_records(path: &Path) -> Result<Vec<PlayerSeasonRecord>> {
    let text = fs::read_to_string(path)?;
    let records = parse_records(&text)?;
    tracing::debug!(path = %path.display(), records = records.len(), "read records");
    Ok(records)
}

pub fn parse_records(text: &str) -> Result<Vec<PlayerSeasonRecord>> {
    if text.trim_start().starts_with('[') {
        return Ok(serde_json::from_str(text)?);
    }
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line)
                .map_err(|e| Error::Serialization(format!("line {}: {}", n + 1, e)))
        })
        .collect()
}

/// Preprocessing config from a JSON file; omitted fields keep their defaults
pub fn read_config(path: &Path) -> Result<PreprocessConfig> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_array_and_lines() {
        let array = r#"[{"player_id": "a", "minutes": 900, "stats": {"shots": 10}},
                        {"player_id": "b"}]"#;
        let records = parse_records(array).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].stats.get("shots"), Some(10.0));

        let lines = "{\"player_id\": \"a\"}\n\n{\"player_id\": \"b\", \"age\": 22}\n";
        let records = parse_records(lines).unwrap();
        assert_eq!(records[1].age, Some(22));
    }

    #[test]
    fn test_bad_line_reports_number() {
        let err = parse_records("{\"player_id\": \"a\"}\n{oops}\n").unwrap_err();
        assert!(matches!(err, Error::Serialization(ref m) if m.starts_with("line 2")));
    }

    #[test]
    fn test_read_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.jsonl");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "{{\"player_id\": \"a\", \"position\": \"FW\"}}").unwrap();
        assert_eq!(read_records(&path).unwrap()[0].position.as_deref(), Some("FW"));

        let cfg_path = dir.path().join("config.json");
        fs::write(&cfg_path, r#"{"normalization": "robust"}"#).unwrap();
        let cfg = read_config(&cfg_path).unwrap();
        assert_eq!(cfg.normalization, stattwin_preprocess::NormalizationMethod::Robust);

        assert!(matches!(read_records(&dir.path().join("missing.json")), Err(Error::Io(_))));
    }
}
