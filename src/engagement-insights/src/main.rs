//! Engagement Insights — dashboard KPIs, engagement trends and A/B
//! significance from exported contact/campaign/event snapshots.
//!
//! Reads a JSON snapshot, runs the requested derivation and prints the
//! result as JSON on stdout. Logs go to stderr.

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use insights_core::config::{AppConfig, LoggingConfig};
use insights_core::types::{Snapshot, VariantSummary};
use insights_reporting::{InsightsEngine, TracingSink};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "engagement-insights")]
#[command(about = "Dashboard KPIs, engagement trends and A/B significance")]
#[command(version)]
struct Cli {
    /// TOML config file (environment variables still override it)
    #[arg(long, env = "ENGAGEMENT_INSIGHTS_CONFIG")]
    config: Option<PathBuf>,

    /// Print single-line JSON instead of pretty output
    #[arg(long, default_value_t = false)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// KPIs and trend for the dashboard
    Dashboard {
        /// JSON snapshot with contacts, campaigns and events
        #[arg(long)]
        snapshot: PathBuf,
        /// Time range: 7d, 30d, 90d or all (overrides config)
        #[arg(long)]
        range: Option<String>,
        /// Channel: all, instagram or facebook (overrides config)
        #[arg(long)]
        channel: Option<String>,
        /// Reference instant, RFC 3339 (defaults to now)
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },
    /// Daily engagement counts
    Trend {
        #[arg(long)]
        snapshot: PathBuf,
        /// Window length in days (defaults to trend.default_days)
        #[arg(long)]
        days: Option<u32>,
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },
    /// Two-proportion significance test on raw counts
    Significance {
        #[arg(long)]
        a_clicks: u64,
        #[arg(long)]
        a_sent: u64,
        #[arg(long)]
        b_clicks: u64,
        #[arg(long)]
        b_sent: u64,
    },
    /// Significance test between two campaigns of a snapshot
    Compare {
        #[arg(long)]
        snapshot: PathBuf,
        /// Campaign id or exact name
        #[arg(long)]
        campaign_a: String,
        #[arg(long)]
        campaign_b: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let loaded = AppConfig::load(cli.config.as_deref());
    let config = loaded.as_ref().cloned().unwrap_or_default();
    init_tracing(&config.logging);
    if let Err(e) = &loaded {
        warn!(error = %e, "Failed to load config, using defaults");
    }

    info!(
        default_days = config.trend.default_days,
        utc_offset_minutes = config.trend.utc_offset_minutes,
        "Configuration loaded"
    );

    let engine = InsightsEngine::new(config, Arc::new(TracingSink));

    match cli.command {
        Command::Dashboard {
            snapshot,
            range,
            channel,
            now,
        } => {
            let snapshot = read_snapshot(&snapshot)?;
            let defaults = &engine.config().query;
            let query = engine.query(
                range.as_deref().unwrap_or(&defaults.time_range),
                channel.as_deref().unwrap_or(&defaults.channel),
                now.unwrap_or_else(Utc::now),
            );
            let report = engine.dashboard(&snapshot, &query)?;
            print_json(&report, cli.compact)
        }
        Command::Trend {
            snapshot,
            days,
            now,
        } => {
            let snapshot = read_snapshot(&snapshot)?;
            let days = days.unwrap_or(engine.config().trend.default_days);
            let points = engine.trend(&snapshot.events, days, now.unwrap_or_else(Utc::now))?;
            print_json(&points, cli.compact)
        }
        Command::Significance {
            a_clicks,
            a_sent,
            b_clicks,
            b_sent,
        } => {
            let result = engine.significance(
                &VariantSummary::new(a_clicks, a_sent),
                &VariantSummary::new(b_clicks, b_sent),
            )?;
            print_json(&result, cli.compact)
        }
        Command::Compare {
            snapshot,
            campaign_a,
            campaign_b,
        } => {
            let snapshot = read_snapshot(&snapshot)?;
            let a = find_campaign(&snapshot, &campaign_a)?;
            let b = find_campaign(&snapshot, &campaign_b)?;
            let result = engine.compare_campaigns(a, b)?;
            print_json(&result, cli.compact)
        }
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| logging.filter.as_str().into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn read_snapshot(path: &Path) -> anyhow::Result<Snapshot> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    let snapshot: Snapshot = serde_json::from_str(&raw)
        .with_context(|| format!("parsing snapshot {}", path.display()))?;
    info!(
        contacts = snapshot.contacts.len(),
        campaigns = snapshot.campaigns.len(),
        events = snapshot.events.len(),
        "Snapshot loaded"
    );
    Ok(snapshot)
}

fn find_campaign<'a>(
    snapshot: &'a Snapshot,
    key: &str,
) -> anyhow::Result<&'a insights_core::types::Campaign> {
    snapshot
        .campaigns
        .iter()
        .find(|c| c.id.to_string() == key || c.name == key)
        .with_context(|| format!("campaign {} not found in snapshot", key))
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> anyhow::Result<()> {
    let out = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{}", out);
    Ok(())
}
