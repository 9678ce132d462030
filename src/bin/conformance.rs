//! Runs the Crypto.com candlestick REST and order-book WebSocket scenarios
//! against one environment and prints a PASS/FAIL/XFAIL line per scenario.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use market_conformance_rs::candlestick::{DEFAULT_TEST_DATA_FILE, TestData};
use market_conformance_rs::cex::Cryptocom;
use market_conformance_rs::common::config::{DEFAULT_RUN_FILE, parse_bool};
use market_conformance_rs::common::{
    ConfigOverrides, ConformanceError, EnvConfig, ExchangeTrait, init_tracing,
};
use market_conformance_rs::scenarios::{
    ScenarioContext, ScenarioReport, rest::run_rest_suite, summarize, ws::run_ws_suite,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Suite {
    Rest,
    Ws,
}

#[derive(Parser)]
#[command(
    name = "conformance",
    version,
    about = "Conformance checks for the Crypto.com Exchange market-data API"
)]
struct Cli {
    /// Target environment (prod | uat)
    #[arg(long)]
    env: Option<String>,

    /// Instrument under test, e.g. BTCUSD-PERP
    #[arg(long)]
    instrument: Option<String>,

    /// Order-book depth for the delta sequence scenario
    #[arg(long)]
    depth: Option<u32>,

    /// SNAPSHOT | SNAPSHOT_AND_UPDATE
    #[arg(long)]
    book_subscription_type: Option<String>,

    /// book_update_frequency subscribe parameter
    #[arg(long)]
    book_update_frequency: Option<u32>,

    /// ws(s):// overrides the market stream, http(s):// the REST base
    #[arg(long)]
    base_url: Option<String>,

    /// Skip TLS certificate and hostname verification
    #[arg(long, value_parser = parse_flag, num_args = 0..=1, default_missing_value = "true")]
    insecure: Option<bool>,

    /// Extra PEM root certificate to trust
    #[arg(long)]
    cafile: Option<PathBuf>,

    /// Endpoint/defaults file
    #[arg(long, default_value = DEFAULT_RUN_FILE)]
    run_file: PathBuf,

    /// Candlestick test-data file
    #[arg(long, default_value = DEFAULT_TEST_DATA_FILE)]
    test_data: PathBuf,

    /// Run only one suite
    #[arg(long, value_enum)]
    only: Option<Suite>,
}

fn parse_flag(s: &str) -> Result<bool, String> {
    parse_bool(s).ok_or_else(|| format!("expected a boolean, got '{}'", s))
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            env: self.env.clone(),
            instrument_name: self.instrument.clone(),
            depth: self.depth,
            book_subscription_type: self.book_subscription_type.clone(),
            book_update_frequency: self.book_update_frequency,
            base_url: self.base_url.clone(),
            insecure: self.insecure,
            cafile: self.cafile.clone(),
        }
    }

    fn runs(&self, suite: Suite) -> bool {
        self.only.is_none_or(|only| only == suite)
    }
}

async fn run(cli: &Cli) -> Result<Vec<ScenarioReport>, ConformanceError> {
    let config = EnvConfig::load(&cli.run_file, cli.overrides())?;
    let test_data = TestData::load(&cli.test_data)?;
    tracing::info!(
        env = %config.env,
        instrument = %config.instrument_name,
        rest = %config.rest_base,
        ws = %config.ws_market_url,
        "resolved configuration"
    );

    let ctx = ScenarioContext { config, test_data };
    let mut reports = Vec::new();

    if cli.runs(Suite::Rest) {
        let api = Cryptocom::new(&ctx.config)?;
        if let Err(e) = api.health_check().await {
            tracing::warn!("REST health check failed: {}", e);
        }
        reports.extend(run_rest_suite(&api, &ctx).await?);
    }
    if cli.runs(Suite::Ws) {
        reports.extend(run_ws_suite(&ctx).await);
    }
    Ok(reports)
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let reports = match run(&cli).await {
        Ok(reports) => reports,
        Err(e) => {
            eprintln!("[error] {}", e);
            return ExitCode::from(2);
        }
    };

    for report in &reports {
        println!(
            "{:<48} {} ({:.2}s)",
            report.name,
            report.outcome,
            report.duration.as_secs_f64()
        );
    }
    let summary = summarize(&reports);
    println!(
        "\n{} passed, {} failed, {} inconclusive",
        summary.passed, summary.failed, summary.inconclusive
    );

    if summary.failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
