//! Environment configuration.
//!
//! One [EnvConfig] is resolved per run from, in increasing precedence:
//! built-in defaults, the JSON run file, environment variables (with `.env`
//! loaded first) and explicit overrides such as CLI flags.

use crate::common::ConformanceError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_INSTRUMENT: &str = "BTCUSD-PERP";
pub const DEFAULT_DEPTH: u32 = 50;
pub const DEFAULT_BOOK_UPDATE_FREQUENCY: u32 = 100;
pub const DEFAULT_RUN_FILE: &str = "config/run.json";

const PROD_REST_BASE: &str = "https://api.crypto.com/exchange/v1/";
const PROD_WS_MARKET: &str = "wss://stream.crypto.com/exchange/v1/market";
const UAT_REST_BASE: &str = "https://uat-api.3ona.co/exchange/v1/";
const UAT_WS_MARKET: &str = "wss://uat-stream.3ona.co/exchange/v1/market";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Prod,
    Uat,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Prod => "prod",
            Environment::Uat => "uat",
        }
    }

    fn default_rest_base(&self) -> &'static str {
        match self {
            Environment::Prod => PROD_REST_BASE,
            Environment::Uat => UAT_REST_BASE,
        }
    }

    fn default_ws_market(&self) -> &'static str {
        match self {
            Environment::Prod => PROD_WS_MARKET,
            Environment::Uat => UAT_WS_MARKET,
        }
    }
}

impl FromStr for Environment {
    type Err = ConformanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prod" => Ok(Environment::Prod),
            "uat" => Ok(Environment::Uat),
            other => Err(ConformanceError::ConfigError(format!(
                "unknown environment '{}' (expected prod | uat)",
                other
            ))),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `book_subscription_type` subscribe parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionType {
    Snapshot,
    SnapshotAndUpdate,
}

impl SubscriptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionType::Snapshot => "SNAPSHOT",
            SubscriptionType::SnapshotAndUpdate => "SNAPSHOT_AND_UPDATE",
        }
    }
}

impl FromStr for SubscriptionType {
    type Err = ConformanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SNAPSHOT" => Ok(SubscriptionType::Snapshot),
            "SNAPSHOT_AND_UPDATE" => Ok(SubscriptionType::SnapshotAndUpdate),
            other => Err(ConformanceError::ConfigError(format!(
                "unknown book subscription type '{}' (expected SNAPSHOT | SNAPSHOT_AND_UPDATE)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsOptions {
    /// Skip certificate and hostname verification.
    pub insecure: bool,
    /// Extra PEM root certificate to trust.
    pub cafile: Option<PathBuf>,
}

/// Defaults section of the run file. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileDefaults {
    pub env: Option<String>,
    pub instrument_name: Option<String>,
    pub depth: Option<u32>,
    pub book_subscription_type: Option<String>,
    pub book_update_frequency: Option<u32>,
    pub insecure: Option<bool>,
    pub cafile: Option<PathBuf>,
}

/// Contents of `config/run.json`: per-environment endpoints plus defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunFile {
    #[serde(default)]
    pub rest: BTreeMap<String, String>,
    #[serde(default)]
    pub ws_market: BTreeMap<String, String>,
    #[serde(default)]
    pub defaults: FileDefaults,
}

impl RunFile {
    /// Reads a run file. A missing file is not an error: it is logged and
    /// `None` is returned so built-in defaults apply.
    pub fn load(path: &Path) -> Result<Option<Self>, ConformanceError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("Run file not found: {}; using built-in defaults", path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let file: RunFile = serde_json::from_str(&raw).map_err(|e| {
            ConformanceError::ConfigError(format!("invalid run file {}: {}", path.display(), e))
        })?;
        Ok(Some(file))
    }

    fn endpoint(
        map: &BTreeMap<String, String>,
        section: &str,
        env: Environment,
    ) -> Result<Option<String>, ConformanceError> {
        if map.is_empty() {
            return Ok(None);
        }
        map.iter()
            .find(|(k, _)| k.trim().eq_ignore_ascii_case(env.as_str()))
            .map(|(_, v)| Some(v.trim().to_string()))
            .ok_or_else(|| {
                ConformanceError::ConfigError(format!(
                    "environment '{}' not found in [{}]; available: {:?}",
                    env,
                    section,
                    map.keys().collect::<Vec<_>>()
                ))
            })
    }
}

/// Values supplied by the environment or the command line. `None` means
/// "not given here"; the next lower layer decides.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub env: Option<String>,
    pub instrument_name: Option<String>,
    pub depth: Option<u32>,
    pub book_subscription_type: Option<String>,
    pub book_update_frequency: Option<u32>,
    /// `ws(s)://` replaces the market stream URL, `http(s)://` the REST base.
    pub base_url: Option<String>,
    pub insecure: Option<bool>,
    pub cafile: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Reads `CDC_*` / `INSTRUMENT_NAME` variables. Call [load_dotenv] first
    /// to pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConformanceError> {
        Ok(Self {
            env: env_string("CDC_ENV"),
            instrument_name: env_string("INSTRUMENT_NAME"),
            depth: env_parsed("CDC_DEPTH")?,
            book_subscription_type: env_string("CDC_BOOK_SUBSCRIPTION_TYPE"),
            book_update_frequency: env_parsed("CDC_BOOK_UPDATE_FREQUENCY")?,
            base_url: env_string("CDC_BASE_URL"),
            insecure: match env_string("CDC_INSECURE") {
                Some(v) => Some(parse_bool(&v).ok_or_else(|| {
                    ConformanceError::ConfigError(format!("invalid CDC_INSECURE value: {}", v))
                })?),
                None => None,
            },
            cafile: env_string("CDC_CAFILE").map(PathBuf::from),
        })
    }

    /// Layers `higher` on top of `self`; fields set in `higher` win.
    pub fn merge(self, higher: ConfigOverrides) -> ConfigOverrides {
        ConfigOverrides {
            env: higher.env.or(self.env),
            instrument_name: higher.instrument_name.or(self.instrument_name),
            depth: higher.depth.or(self.depth),
            book_subscription_type: higher.book_subscription_type.or(self.book_subscription_type),
            book_update_frequency: higher.book_update_frequency.or(self.book_update_frequency),
            base_url: higher.base_url.or(self.base_url),
            insecure: higher.insecure.or(self.insecure),
            cafile: higher.cafile.or(self.cafile),
        }
    }
}

/// Resolved configuration, built once per run and passed by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvConfig {
    pub env: Environment,
    pub instrument_name: String,
    pub depth: u32,
    pub book_subscription_type: SubscriptionType,
    pub book_update_frequency: u32,
    /// Always ends with `/`.
    pub rest_base: String,
    pub ws_market_url: String,
    pub insecure: bool,
    pub cafile: Option<PathBuf>,
}

impl EnvConfig {
    pub fn resolve(
        file: Option<&RunFile>,
        overrides: &ConfigOverrides,
    ) -> Result<Self, ConformanceError> {
        let defaults = file.map(|f| f.defaults.clone()).unwrap_or_default();

        let env: Environment = overrides
            .env
            .as_deref()
            .or(defaults.env.as_deref())
            .unwrap_or("prod")
            .parse()?;

        let instrument_name = overrides
            .instrument_name
            .clone()
            .or(defaults.instrument_name)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_INSTRUMENT.to_string());

        let book_subscription_type = match overrides
            .book_subscription_type
            .as_deref()
            .or(defaults.book_subscription_type.as_deref())
        {
            Some(s) => s.parse()?,
            None => SubscriptionType::SnapshotAndUpdate,
        };

        let (mut rest_base, mut ws_market_url) = match file {
            Some(f) => (
                RunFile::endpoint(&f.rest, "rest", env)?,
                RunFile::endpoint(&f.ws_market, "ws_market", env)?,
            ),
            None => (None, None),
        };

        if let Some(base_url) = overrides.base_url.as_deref().map(str::trim) {
            let lower = base_url.to_ascii_lowercase();
            if lower.starts_with("ws://") || lower.starts_with("wss://") {
                ws_market_url = Some(base_url.to_string());
            } else if lower.starts_with("http://") || lower.starts_with("https://") {
                rest_base = Some(base_url.to_string());
            } else {
                return Err(ConformanceError::ConfigError(format!(
                    "base URL '{}' must start with ws://, wss://, http:// or https://",
                    base_url
                )));
            }
        }

        let mut rest_base = rest_base.unwrap_or_else(|| env.default_rest_base().to_string());
        if !rest_base.ends_with('/') {
            rest_base.push('/');
        }

        Ok(Self {
            env,
            instrument_name,
            depth: overrides.depth.or(defaults.depth).unwrap_or(DEFAULT_DEPTH),
            book_subscription_type,
            book_update_frequency: overrides
                .book_update_frequency
                .or(defaults.book_update_frequency)
                .unwrap_or(DEFAULT_BOOK_UPDATE_FREQUENCY),
            rest_base,
            ws_market_url: ws_market_url.unwrap_or_else(|| env.default_ws_market().to_string()),
            insecure: overrides.insecure.or(defaults.insecure).unwrap_or(false),
            cafile: overrides.cafile.clone().or(defaults.cafile),
        })
    }

    /// Full chain used by tests and the CLI: `.env`, run file, environment,
    /// then `cli` on top.
    pub fn load(run_file: &Path, cli: ConfigOverrides) -> Result<Self, ConformanceError> {
        load_dotenv();
        let file = RunFile::load(run_file)?;
        let overrides = ConfigOverrides::from_env()?.merge(cli);
        Self::resolve(file.as_ref(), &overrides)
    }

    pub fn tls(&self) -> TlsOptions {
        TlsOptions {
            insecure: self.insecure,
            cafile: self.cafile.clone(),
        }
    }
}

/// Loads `.env` from the current or project directory.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parsed<T: FromStr>(key: &str) -> Result<Option<T>, ConformanceError> {
    match env_string(key) {
        Some(v) => v
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConformanceError::ConfigError(format!("invalid {} value: {}", key, v))),
        None => Ok(None),
    }
}

pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}
