//! Position-aware feature weighting
//!
//! A [`WeightSpec`] resolves against the ordered feature list of a query into
//! a complete [`WeightVector`]: every feature gets a weight, 1.0 unless an
//! explicit map or a role boost says otherwise.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use stattwin_core::{Error, PositionTag, Result};

pub const DEFAULT_BOOST: f32 = 1.5;

/// Feature-name keywords emphasized for each role, matched
/// case-insensitively as substrings
pub const ROLE_KEYWORDS: [(PositionTag, &[&str]); 4] = [
    (PositionTag::Forward, &["shot", "xg", "goal", "sot"]),
    (PositionTag::Midfielder, &["pass", "assist", "key_pass", "prog", "kp"]),
    (
        PositionTag::Defender,
        &["tackle", "interception", "clear", "block", "aerial", "press"],
    ),
    (PositionTag::Goalkeeper, &["save", "psxg", "stop", "claim", "sweep"]),
];

pub fn role_keywords(role: PositionTag) -> &'static [&'static str] {
    ROLE_KEYWORDS
        .iter()
        .find(|(tag, _)| *tag == role)
        .map(|(_, keywords)| *keywords)
        .unwrap_or(&[])
}

/// Which role to emphasize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RoleChoice {
    Fixed(PositionTag),
    /// The query's first position tag; uniform weights if it has none
    FromQuery,
}

impl FromStr for RoleChoice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "from_query" | "auto" => Ok(RoleChoice::FromQuery),
            _ => s.parse().map(RoleChoice::Fixed),
        }
    }
}

impl TryFrom<String> for RoleChoice {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<RoleChoice> for String {
    fn from(role: RoleChoice) -> Self {
        role.to_string()
    }
}

impl fmt::Display for RoleChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleChoice::Fixed(tag) => write!(f, "{}", tag),
            RoleChoice::FromQuery => f.write_str("from_query"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightSpec {
    /// Feature name to weight; takes precedence over `role`
    pub explicit: Option<BTreeMap<String, f32>>,
    pub role: Option<RoleChoice>,
    pub boost: f32,
}

impl Default for WeightSpec {
    fn default() -> Self {
        Self {
            explicit: None,
            role: None,
            boost: DEFAULT_BOOST,
        }
    }
}

impl WeightSpec {
    pub fn uniform() -> Self {
        Self::default()
    }

    pub fn for_role(role: PositionTag) -> Self {
        Self {
            role: Some(RoleChoice::Fixed(role)),
            ..Self::default()
        }
    }

    pub fn from_query_role() -> Self {
        Self {
            role: Some(RoleChoice::FromQuery),
            ..Self::default()
        }
    }

    pub fn explicit<I, S>(weights: I) -> Self
    where
        I: IntoIterator<Item = (S, f32)>,
        S: Into<String>,
    {
        Self {
            explicit: Some(weights.into_iter().map(|(k, v)| (k.into(), v)).collect()),
            ..Self::default()
        }
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.boost.is_finite() || self.boost <= 0.0 {
            return Err(Error::InvalidBoost(self.boost));
        }
        if let Some(explicit) = &self.explicit {
            for (feature, &weight) in explicit {
                if !weight.is_finite() || weight <= 0.0 {
                    return Err(Error::InvalidWeight {
                        feature: feature.clone(),
                        weight,
                    });
                }
            }
        }
        Ok(())
    }

    /// Resolve to one weight per feature. `query_position` is the query's
    /// free-text position field, used by [`RoleChoice::FromQuery`].
    pub fn resolve(&self, features: &[String], query_position: Option<&str>) -> Result<WeightVector> {
        self.validate()?;

        if let Some(explicit) = &self.explicit {
            let ignored = explicit
                .keys()
                .filter(|k| !features.iter().any(|f| f == *k))
                .count();
            if ignored > 0 {
                tracing::debug!(ignored, "explicit weights for features not in the query");
            }
            let weights = features
                .iter()
                .map(|f| explicit.get(f).copied().unwrap_or(1.0))
                .collect();
            return Ok(WeightVector::new(features.to_vec(), weights));
        }

        let role = match self.role {
            Some(RoleChoice::Fixed(tag)) => Some(tag),
            Some(RoleChoice::FromQuery) => query_position.and_then(PositionTag::primary),
            None => None,
        };
        let Some(role) = role else {
            return Ok(WeightVector::uniform(features));
        };

        let keywords = role_keywords(role);
        let weights = features
            .iter()
            .map(|f| {
                let lower = f.to_ascii_lowercase();
                if keywords.iter().any(|k| lower.contains(k)) {
                    self.boost
                } else {
                    1.0
                }
            })
            .collect();
        Ok(WeightVector::new(features.to_vec(), weights))
    }
}

/// One weight per feature, aligned with the feature order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightVector {
    features: Vec<String>,
    weights: Vec<f32>,
}

impl WeightVector {
    fn new(features: Vec<String>, weights: Vec<f32>) -> Self {
        debug_assert_eq!(features.len(), weights.len());
        Self { features, weights }
    }

    pub fn uniform(features: &[String]) -> Self {
        Self::new(features.to_vec(), vec![1.0; features.len()])
    }

    /// Weights in feature order
    pub fn aligned(&self) -> &[f32] {
        &self.weights
    }

    pub fn get(&self, feature: &str) -> Option<f32> {
        self.features
            .iter()
            .position(|f| f == feature)
            .map(|i| self.weights[i])
    }

    pub fn is_uniform(&self) -> bool {
        self.weights.iter().all(|&w| w == 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features() -> Vec<String> {
        ["shots_per90_z", "passes_completed_per90_z", "tackles_per90_z", "saves_per90_z"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_role_boosts_matching_features() {
        let w = WeightSpec::for_role(PositionTag::Forward)
            .resolve(&features(), None)
            .unwrap();
        assert_eq!(w.aligned(), &[1.5, 1.0, 1.0, 1.0]);

        let w = WeightSpec::for_role(PositionTag::Defender)
            .with_boost(2.0)
            .resolve(&features(), None)
            .unwrap();
        assert_eq!(w.get("tackles_per90_z"), Some(2.0));
        assert_eq!(w.get("shots_per90_z"), Some(1.0));
    }

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        let names = vec!["PSxG_per90_z".to_string()];
        let w = WeightSpec::for_role(PositionTag::Goalkeeper).resolve(&names, None).unwrap();
        assert_eq!(w.aligned(), &[1.5]);
    }

    #[test]
    fn test_explicit_overrides_role() {
        let mut spec = WeightSpec::explicit([("tackles_per90_z", 3.0), ("not_a_feature", 9.0)]);
        spec.role = Some(RoleChoice::Fixed(PositionTag::Forward));
        let w = spec.resolve(&features(), None).unwrap();
        assert_eq!(w.aligned(), &[1.0, 1.0, 3.0, 1.0]);
    }

    #[test]
    fn test_from_query_uses_first_tag() {
        let spec = WeightSpec::from_query_role();
        let w = spec.resolve(&features(), Some("MF,FW")).unwrap();
        assert_eq!(w.get("passes_completed_per90_z"), Some(1.5));
        assert_eq!(w.get("shots_per90_z"), Some(1.0));

        assert!(spec.resolve(&features(), Some("??")).unwrap().is_uniform());
        assert!(spec.resolve(&features(), None).unwrap().is_uniform());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = WeightSpec::uniform().with_boost(0.0).resolve(&features(), None).unwrap_err();
        assert!(matches!(err, Error::InvalidBoost(_)));

        let err = WeightSpec::explicit([("shots_per90_z", -1.0)])
            .resolve(&features(), None)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidWeight { ref feature, .. } if feature == "shots_per90_z"));

        assert!(WeightSpec::uniform().with_boost(f32::NAN).validate().is_err());
    }

    #[test]
    fn test_role_choice_parse_and_serde() {
        assert_eq!("FW".parse::<RoleChoice>().unwrap(), RoleChoice::Fixed(PositionTag::Forward));
        assert_eq!("from_query".parse::<RoleChoice>().unwrap(), RoleChoice::FromQuery);
        assert!(matches!("libero".parse::<RoleChoice>(), Err(Error::UnknownRole(_))));

        let spec: WeightSpec = serde_json::from_str(r#"{"role": "goalkeeper"}"#).unwrap();
        assert_eq!(spec.role, Some(RoleChoice::Fixed(PositionTag::Goalkeeper)));
        assert_eq!(spec.boost, DEFAULT_BOOST);
        assert!(serde_json::from_str::<WeightSpec>(r#"{"role": "libero"}"#).is_err());
        assert_eq!(serde_json::to_string(&RoleChoice::FromQuery).unwrap(), "\"from_query\"");
    }
}
