use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::position::PositionSet;

/// One player's aggregated statistics for one league-season
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerSeasonRecord {
    pub player_id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Free-text position field, e.g. "FW,MF"
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub league: Option<String>,
    #[serde(default)]
    pub continent: Option<String>,
    #[serde(default)]
    pub season: Option<String>,
    #[serde(default)]
    pub minutes: f64,
    #[serde(default)]
    pub stats: StatLine,
}

impl PlayerSeasonRecord {
    pub fn new(player_id: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
            name: None,
            position: None,
            age: None,
            league: None,
            continent: None,
            season: None,
            minutes: 0.0,
            stats: StatLine::default(),
        }
    }

    pub fn key(&self) -> RecordKey {
        RecordKey {
            player_id: self.player_id.clone(),
            league: self.league.clone().unwrap_or_default(),
            season: self.season.clone().unwrap_or_default(),
        }
    }

    pub fn positions(&self) -> PositionSet {
        self.position.as_deref().map(PositionSet::parse).unwrap_or_default()
    }
}

/// Identity of a row after deduplication: identifier + league + season
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey {
    pub player_id: String,
    pub league: String,
    pub season: String,
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.player_id, self.league, self.season)
    }
}

/// Raw per-season statistics: known provider fields plus an extension map
/// for anything else the provider reports.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StatLine {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goals: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assists: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shots: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shots_on_target: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub npxg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xag: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_passes: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passes_completed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passes_attempted: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progressive_passes: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progressive_carries: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tackles: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tackles_won: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interceptions: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clearances: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocks: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aerials_won: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aerials_contested: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saves: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shots_on_target_against: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goals_against: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub psxg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crosses_claimed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sweeper_actions: Option<f64>,
    /// Provider-specific stats outside the known schema
    #[serde(default, flatten)]
    pub extra: BTreeMap<String, Option<f64>>,
}

impl StatLine {
    /// Names of the known fields, in schema order
    pub const KNOWN: [&'static str; 25] = [
        "goals",
        "assists",
        "shots",
        "shots_on_target",
        "xg",
        "npxg",
        "xag",
        "key_passes",
        "passes_completed",
        "passes_attempted",
        "progressive_passes",
        "progressive_carries",
        "tackles",
        "tackles_won",
        "interceptions",
        "clearances",
        "blocks",
        "aerials_won",
        "aerials_contested",
        "saves",
        "shots_on_target_against",
        "goals_against",
        "psxg",
        "crosses_claimed",
        "sweeper_actions",
    ];

    fn known_slot(&self, name: &str) -> Option<&Option<f64>> {
        let slot = match name {
            "goals" => &self.goals,
            "assists" => &self.assists,
            "shots" => &self.shots,
            "shots_on_target" => &self.shots_on_target,
            "xg" => &self.xg,
            "npxg" => &self.npxg,
            "xag" => &self.xag,
            "key_passes" => &self.key_passes,
            "passes_completed" => &self.passes_completed,
            "passes_attempted" => &self.passes_attempted,
            "progressive_passes" => &self.progressive_passes,
            "progressive_carries" => &self.progressive_carries,
            "tackles" => &self.tackles,
            "tackles_won" => &self.tackles_won,
            "interceptions" => &self.interceptions,
            "clearances" => &self.clearances,
            "blocks" => &self.blocks,
            "aerials_won" => &self.aerials_won,
            "aerials_contested" => &self.aerials_contested,
            "saves" => &self.saves,
            "shots_on_target_against" => &self.shots_on_target_against,
            "goals_against" => &self.goals_against,
            "psxg" => &self.psxg,
            "crosses_claimed" => &self.crosses_claimed,
            "sweeper_actions" => &self.sweeper_actions,
            _ => return None,
        };
        Some(slot)
    }

    fn known_slot_mut(&mut self, name: &str) -> Option<&mut Option<f64>> {
        let slot = match name {
            "goals" => &mut self.goals,
            "assists" => &mut self.assists,
            "shots" => &mut self.shots,
            "shots_on_target" => &mut self.shots_on_target,
            "xg" => &mut self.xg,
            "npxg" => &mut self.npxg,
            "xag" => &mut self.xag,
            "key_passes" => &mut self.key_passes,
            "passes_completed" => &mut self.passes_completed,
            "passes_attempted" => &mut self.passes_attempted,
            "progressive_passes" => &mut self.progressive_passes,
            "progressive_carries" => &mut self.progressive_carries,
            "tackles" => &mut self.tackles,
            "tackles_won" => &mut self.tackles_won,
            "interceptions" => &mut self.interceptions,
            "clearances" => &mut self.clearances,
            "blocks" => &mut self.blocks,
            "aerials_won" => &mut self.aerials_won,
            "aerials_contested" => &mut self.aerials_contested,
            "saves" => &mut self.saves,
            "shots_on_target_against" => &mut self.shots_on_target_against,
            "goals_against" => &mut self.goals_against,
            "psxg" => &mut self.psxg,
            "crosses_claimed" => &mut self.crosses_claimed,
            "sweeper_actions" => &mut self.sweeper_actions,
            _ => return None,
        };
        Some(slot)
    }

    /// Value of a stat, known or extra. `None` when missing.
    pub fn get(&self, name: &str) -> Option<f64> {
        match self.known_slot(name) {
            Some(slot) => *slot,
            None => self.extra.get(name).copied().flatten(),
        }
    }

    /// Set a stat value. Unknown names go to the extension map.
    pub fn set(&mut self, name: &str, value: Option<f64>) {
        match self.known_slot_mut(name) {
            Some(slot) => *slot = value,
            None => {
                self.extra.insert(name.to_string(), value);
            }
        }
    }

    /// Builder-style setter
    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.set(name, Some(value));
        self
    }

    /// Whether this line carries the stat: a value for known fields, the key
    /// for extra fields (an explicit null still declares the column).
    pub fn declares(&self, name: &str) -> bool {
        match self.known_slot(name) {
            Some(slot) => slot.is_some(),
            None => self.extra.contains_key(name),
        }
    }

    /// Names of every stat carried by this line, known fields first
    pub fn declared_names(&self) -> impl Iterator<Item = &str> {
        Self::KNOWN
            .iter()
            .copied()
            .filter(move |name| self.declares(name))
            .chain(self.extra.keys().map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_line_known_and_extra() {
        let mut stats = StatLine::default().with("shots", 12.0).with("pressures", 140.0);
        assert_eq!(stats.shots, Some(12.0));
        assert_eq!(stats.get("shots"), Some(12.0));
        assert_eq!(stats.get("pressures"), Some(140.0));
        assert_eq!(stats.get("tackles"), None);

        stats.set("pressures", None);
        assert!(stats.declares("pressures"));
        assert_eq!(stats.get("pressures"), None);
        assert!(!stats.declares("tackles"));
    }

    #[test]
    fn test_declared_names_order() {
        let stats = StatLine::default()
            .with("tackles", 3.0)
            .with("goals", 1.0)
            .with("ball_recoveries", 9.0);
        let names: Vec<_> = stats.declared_names().collect();
        assert_eq!(names, vec!["goals", "tackles", "ball_recoveries"]);
    }

    #[test]
    fn test_record_deserialize_with_extras() {
        let json = serde_json::json!({
            "player_id": "92e7e919",
            "name": "Son Heung-min",
            "position": "FW,MF",
            "age": 31,
            "league": "Premier League",
            "season": "2023-2024",
            "minutes": 2700.0,
            "stats": { "shots": 80.0, "xg": null, "touches_att_pen": 150.0 }
        });
        let record: PlayerSeasonRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.stats.get("shots"), Some(80.0));
        assert_eq!(record.stats.get("xg"), None);
        assert_eq!(record.stats.get("touches_att_pen"), Some(150.0));
        assert_eq!(record.positions().len(), 2);
        assert_eq!(record.key().to_string(), "92e7e919/Premier League/2023-2024");
    }
}
