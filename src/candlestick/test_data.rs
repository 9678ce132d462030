use super::timeframe::TimeframeAliases;
use crate::common::ConformanceError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_TEST_DATA_FILE: &str = "config/test_data_rest_candlestick.json";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CaseInput {
    pub timeframe: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Limits {
    pub large_count: CaseInput,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Negatives {
    pub invalid_timeframe: CaseInput,
    pub count_zero: CaseInput,
    pub start_after_end: CaseInput,
    pub invalid_instrument_literal: String,
}

/// Inputs for the REST candlestick scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TestData {
    /// Empty means "use the built-in alias table".
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    /// `(timeframe, count)` pairs.
    pub valid_cases: Vec<(String, i64)>,
    pub time_range_cases: Vec<(String, i64)>,
    pub limits: Limits,
    pub negatives: Negatives,
}

impl Default for TestData {
    fn default() -> Self {
        let case = |tf: &str, count: i64| CaseInput {
            timeframe: tf.to_string(),
            count,
        };
        Self {
            aliases: BTreeMap::new(),
            valid_cases: vec![
                ("M1".to_string(), 10),
                ("5m".to_string(), 20),
                ("1h".to_string(), 24),
                ("1D".to_string(), 7),
            ],
            time_range_cases: vec![("M1".to_string(), 100), ("5m".to_string(), 50)],
            limits: Limits {
                large_count: case("M1", 300),
            },
            negatives: Negatives {
                invalid_timeframe: case("X9", 5),
                count_zero: case("M5", 0),
                start_after_end: case("M5", 10),
                invalid_instrument_literal: "NOT_A_REAL_INSTRUMENT".to_string(),
            },
        }
    }
}

impl TestData {
    /// Reads the test-data file; a missing file falls back to [TestData::default].
    pub fn load(path: &Path) -> Result<Self, ConformanceError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("Test data file not found: {}; using built-in cases", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&raw).map_err(|e| {
            ConformanceError::ConfigError(format!("invalid test data {}: {}", path.display(), e))
        })
    }

    pub fn timeframe_aliases(&self) -> Result<TimeframeAliases, ConformanceError> {
        if self.aliases.is_empty() {
            return Ok(TimeframeAliases::default());
        }
        TimeframeAliases::from_map(self.aliases.clone())
    }
}
