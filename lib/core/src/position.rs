//! Canonical position tags
//!
//! Free-text position fields ("FW,MF", "CB / DM", "Forward") are parsed into a
//! small set of canonical tags. Unrecognized tokens are ignored, so an
//! unparseable field yields an empty set rather than an error.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// One of the four canonical positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionTag {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
}

impl PositionTag {
    pub const ALL: [PositionTag; 4] = [
        PositionTag::Goalkeeper,
        PositionTag::Defender,
        PositionTag::Midfielder,
        PositionTag::Forward,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PositionTag::Goalkeeper => "goalkeeper",
            PositionTag::Defender => "defender",
            PositionTag::Midfielder => "midfielder",
            PositionTag::Forward => "forward",
        }
    }

    /// Map a single token to a tag. Matching is ASCII case-insensitive and
    /// covers both group names and detailed roles (CB, DM, ST, ...).
    pub fn from_token(token: &str) -> Option<Self> {
        let lower = token.trim().to_ascii_lowercase();
        let tag = match lower.as_str() {
            "gk" | "goalkeeper" | "goalkeepers" | "keeper" | "goalie" => PositionTag::Goalkeeper,
            "df" | "def" | "defender" | "defenders" | "defence" | "defense" | "cb" | "lb"
            | "rb" | "wb" | "lwb" | "rwb" | "sw" | "fb" => PositionTag::Defender,
            "mf" | "mid" | "midfielder" | "midfielders" | "midfield" | "dm" | "cdm" | "cm"
            | "am" | "cam" | "lm" | "rm" | "wm" => PositionTag::Midfielder,
            "fw" | "fwd" | "forward" | "forwards" | "attacker" | "st" | "cf" | "lw" | "rw"
            | "ss" | "striker" | "winger" => PositionTag::Forward,
            _ => return None,
        };
        Some(tag)
    }

    /// First recognized tag of a free-text field, in text order
    pub fn primary(field: &str) -> Option<Self> {
        tokens(field).next()
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for PositionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PositionTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PositionTag::from_token(s).ok_or_else(|| Error::UnknownRole(s.to_string()))
    }
}

/// Recognized tags of a position field, in text order
fn tokens(field: &str) -> impl Iterator<Item = PositionTag> + '_ {
    field
        .split(|c: char| matches!(c, ',' | '/' | ';' | '+' | '-' | '|') || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .filter_map(PositionTag::from_token)
}

/// Set of canonical tags, stored as a bitmask
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PositionSet(u8);

impl PositionSet {
    pub fn empty() -> Self {
        Self(0)
    }

    /// Parse a free-text position field. Tokens are split on commas,
    /// slashes, semicolons, plus signs, hyphens and whitespace.
    pub fn parse(field: &str) -> Self {
        tokens(field).collect()
    }

    pub fn insert(&mut self, tag: PositionTag) {
        self.0 |= tag.bit();
    }

    pub fn contains(&self, tag: PositionTag) -> bool {
        self.0 & tag.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn intersects(&self, other: &PositionSet) -> bool {
        self.0 & other.0 != 0
    }

    pub fn iter(&self) -> impl Iterator<Item = PositionTag> + '_ {
        PositionTag::ALL.into_iter().filter(move |t| self.contains(*t))
    }
}

impl FromIterator<PositionTag> for PositionSet {
    fn from_iter<I: IntoIterator<Item = PositionTag>>(iter: I) -> Self {
        let mut set = PositionSet::empty();
        for tag in iter {
            set.insert(tag);
        }
        set
    }
}
