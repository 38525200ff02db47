//! Engine tunables.
//!
//! Every field has a default; a JSON file only needs the fields it changes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Variables with more options than this are dropped (or, for unit
    /// value, degraded to a numeric bracket question).
    pub max_options: usize,
    pub confidence: ConfidencePolicy,
    pub duty: DutyPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_options: 6,
            confidence: ConfidencePolicy::default(),
            duty: DutyPolicy::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, EngineError> {
        let raw = std::fs::read_to_string(path).map_err(|source| EngineError::Config {
            path: path.to_path_buf(),
            reason: source.to_string(),
        })?;
        serde_json::from_str(&raw).map_err(|source| EngineError::Config {
            path: path.to_path_buf(),
            reason: source.to_string(),
        })
    }
}

/// Confidence scores per detection source, and the aggregation bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidencePolicy {
    pub previous_answer: u8,
    pub numeric_value: u8,
    pub direct_match: u8,
    pub synonym_match: u8,
    pub assumed: u8,
    /// Subtracted from the aggregate once per assumed variable.
    pub assumption_penalty: u8,
    pub confirmed: u8,
    pub floor: u8,
    pub ceiling: u8,
    pub single_leaf: u8,
    pub empty_branch: u8,
    /// Aggregate when no variable contributed to the likely candidate.
    pub neutral: u8,
    /// Every question must reach this for a lone likely leaf to rate low.
    pub low_level_floor: u8,
}

impl Default for ConfidencePolicy {
    fn default() -> Self {
        Self {
            previous_answer: 100,
            numeric_value: 95,
            direct_match: 90,
            synonym_match: 80,
            assumed: 40,
            assumption_penalty: 10,
            confirmed: 98,
            floor: 30,
            ceiling: 95,
            single_leaf: 95,
            empty_branch: 30,
            neutral: 50,
            low_level_floor: 80,
        }
    }
}

/// Country-dependent duty adjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DutyPolicy {
    /// Percentage points added for watch-listed origins.
    pub surcharge: f64,
    /// ISO 3166-1 alpha-2 codes, compared case-insensitively.
    pub watch_list: Vec<String>,
}

impl Default for DutyPolicy {
    fn default() -> Self {
        Self {
            surcharge: 25.0,
            watch_list: vec!["CN".to_string()],
        }
    }
}

impl DutyPolicy {
    pub fn surcharge_for(&self, country: Option<&str>) -> f64 {
        match country {
            Some(c) if self.watch_list.iter().any(|w| w.eq_ignore_ascii_case(c.trim())) => {
                self.surcharge
            }
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_options, 6);
        assert_eq!(config.confidence.direct_match, 90);
        assert_eq!(config.confidence.confirmed, 98);
        assert_eq!(config.duty.watch_list, vec!["CN"]);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"confidence": {"assumed": 35}, "duty": {"surcharge": 7.5}}"#)
                .unwrap();
        assert_eq!(config.confidence.assumed, 35);
        assert_eq!(config.confidence.synonym_match, 80);
        assert_eq!(config.duty.surcharge, 7.5);
        assert_eq!(config.duty.watch_list, vec!["CN"]);
        assert_eq!(config.max_options, 6);
    }

    #[test]
    fn surcharge_is_case_insensitive() {
        let duty = DutyPolicy::default();
        assert_eq!(duty.surcharge_for(Some("cn")), 25.0);
        assert_eq!(duty.surcharge_for(Some("VN")), 0.0);
        assert_eq!(duty.surcharge_for(None), 0.0);
    }

    #[test]
    fn load_from_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("engine.json");
        std::fs::write(&path, r#"{"max_options": 4}"#).unwrap();
        assert_eq!(EngineConfig::from_json_file(&path).unwrap().max_options, 4);
    }

    #[test]
    fn bad_file_is_a_config_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("engine.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            EngineConfig::from_json_file(&path),
            Err(EngineError::Config { .. })
        ));
        assert!(matches!(
            EngineConfig::from_json_file(&tmp.path().join("missing.json")),
            Err(EngineError::Config { .. })
        ));
    }
}
