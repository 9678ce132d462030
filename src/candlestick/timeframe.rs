use crate::common::ConformanceError;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Interval used for codes outside the table.
pub const FALLBACK_INTERVAL_MS: i64 = MINUTE_MS;

/// Canonical candlestick timeframe codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Timeframe {
    M1,
    M5,
    M15,
    M30,
    H1,
    H2,
    H4,
    H12,
    D1,
    D7,
    D14,
    /// Calendar month, approximated as 30 days.
    Month1,
}

impl Timeframe {
    pub const ALL: [Timeframe; 12] = [
        Timeframe::M1,
        Timeframe::M5,
        Timeframe::M15,
        Timeframe::M30,
        Timeframe::H1,
        Timeframe::H2,
        Timeframe::H4,
        Timeframe::H12,
        Timeframe::D1,
        Timeframe::D7,
        Timeframe::D14,
        Timeframe::Month1,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Timeframe::M1 => "M1",
            Timeframe::M5 => "M5",
            Timeframe::M15 => "M15",
            Timeframe::M30 => "M30",
            Timeframe::H1 => "H1",
            Timeframe::H2 => "H2",
            Timeframe::H4 => "H4",
            Timeframe::H12 => "H12",
            Timeframe::D1 => "D1",
            Timeframe::D7 => "D7",
            Timeframe::D14 => "D14",
            Timeframe::Month1 => "1M",
        }
    }

    pub fn duration_ms(&self) -> i64 {
        match self {
            Timeframe::M1 => MINUTE_MS,
            Timeframe::M5 => 5 * MINUTE_MS,
            Timeframe::M15 => 15 * MINUTE_MS,
            Timeframe::M30 => 30 * MINUTE_MS,
            Timeframe::H1 => HOUR_MS,
            Timeframe::H2 => 2 * HOUR_MS,
            Timeframe::H4 => 4 * HOUR_MS,
            Timeframe::H12 => 12 * HOUR_MS,
            Timeframe::D1 => DAY_MS,
            Timeframe::D7 => 7 * DAY_MS,
            Timeframe::D14 => 14 * DAY_MS,
            Timeframe::Month1 => 30 * DAY_MS,
        }
    }
}

impl FromStr for Timeframe {
    type Err = ConformanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Timeframe::ALL
            .iter()
            .copied()
            .find(|tf| tf.code() == s)
            .ok_or_else(|| ConformanceError::ConfigError(format!("unknown timeframe code: {}", s)))
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Milliseconds for a canonical code; unknown codes fall back to one minute.
pub fn interval_ms(code: &str) -> i64 {
    code.parse::<Timeframe>()
        .map(|tf| tf.duration_ms())
        .unwrap_or(FALLBACK_INTERVAL_MS)
}

/// Alternate spelling -> canonical code table (`5m` -> `M5`). Lookups are
/// case-sensitive since `1m` (minute) and `1M` (month) differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeframeAliases {
    map: BTreeMap<String, String>,
}

impl Default for TimeframeAliases {
    fn default() -> Self {
        let pairs = [
            ("1m", "M1"),
            ("5m", "M5"),
            ("15m", "M15"),
            ("30m", "M30"),
            ("1h", "H1"),
            ("2h", "H2"),
            ("4h", "H4"),
            ("12h", "H12"),
            ("1D", "D1"),
            ("7D", "D7"),
            ("14D", "D14"),
        ];
        Self {
            map: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl TimeframeAliases {
    /// Builds a table, rejecting chains (`a -> b` where `b` is itself an
    /// alias for something else) so that normalizing twice equals normalizing once.
    pub fn from_map(map: BTreeMap<String, String>) -> Result<Self, ConformanceError> {
        for (alias, target) in &map {
            if let Some(next) = map.get(target) {
                if next != target {
                    return Err(ConformanceError::ConfigError(format!(
                        "timeframe alias {} -> {} chains to {}",
                        alias, target, next
                    )));
                }
            }
        }
        Ok(Self { map })
    }

    /// Maps an alias to its canonical code; unmapped input passes through unchanged.
    pub fn normalize(&self, tf: &str) -> String {
        self.map.get(tf).cloned().unwrap_or_else(|| tf.to_string())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
