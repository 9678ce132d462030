//! Scenario runners. Every scenario resolves to Passed, Failed or
//! Inconclusive; only Failed counts against a run.

pub mod rest;
pub mod ws;

use crate::book::SequenceOutcome;
use crate::candlestick::TestData;
use crate::common::{ConformanceError, EnvConfig};
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioOutcome {
    Passed,
    Failed(String),
    /// Could not be decided from the observed traffic (e.g. a quiet market).
    Inconclusive(String),
}

impl ScenarioOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ScenarioOutcome::Failed(_))
    }
}

impl From<()> for ScenarioOutcome {
    fn from(_: ()) -> Self {
        ScenarioOutcome::Passed
    }
}

impl From<SequenceOutcome> for ScenarioOutcome {
    fn from(outcome: SequenceOutcome) -> Self {
        match outcome {
            SequenceOutcome::Consistent { .. } => ScenarioOutcome::Passed,
            SequenceOutcome::Inconclusive { rounds } => ScenarioOutcome::Inconclusive(format!(
                "no consistent delta in {} rounds; market may be quiet or throttled",
                rounds
            )),
        }
    }
}

impl fmt::Display for ScenarioOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioOutcome::Passed => f.write_str("PASS"),
            ScenarioOutcome::Failed(msg) => write!(f, "FAIL: {}", msg),
            ScenarioOutcome::Inconclusive(msg) => write!(f, "XFAIL: {}", msg),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub name: String,
    pub outcome: ScenarioOutcome,
    pub duration: Duration,
}

/// Everything a run needs, resolved once up front.
#[derive(Debug, Clone)]
pub struct ScenarioContext {
    pub config: EnvConfig,
    pub test_data: TestData,
}

/// Awaits one scenario and turns its result into a report.
pub async fn run_scenario<F, T>(name: impl Into<String>, scenario: F) -> ScenarioReport
where
    F: Future<Output = Result<T, ConformanceError>>,
    T: Into<ScenarioOutcome>,
{
    let name = name.into();
    let started = Instant::now();
    let outcome = match scenario.await {
        Ok(value) => value.into(),
        Err(e) => ScenarioOutcome::Failed(e.to_string()),
    };
    let duration = started.elapsed();
    match &outcome {
        ScenarioOutcome::Failed(msg) => tracing::warn!("{} failed: {}", name, msg),
        _ => tracing::info!("{} -> {} ({:?})", name, outcome, duration),
    }
    ScenarioReport {
        name,
        outcome,
        duration,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub passed: usize,
    pub failed: usize,
    pub inconclusive: usize,
}

pub fn summarize(reports: &[ScenarioReport]) -> Summary {
    reports.iter().fold(Summary::default(), |mut acc, r| {
        match r.outcome {
            ScenarioOutcome::Passed => acc.passed += 1,
            ScenarioOutcome::Failed(_) => acc.failed += 1,
            ScenarioOutcome::Inconclusive(_) => acc.inconclusive += 1,
        }
        acc
    })
}
