use std::time::Duration as StdDuration;

use chrono::Duration;
use clap::{ArgAction, Parser};
use tracing::Level;

use crate::campaign::validation::ValidationPolicy;

/// Upper bound on `--minimum-campaign-days`, one hundred years.
const MAX_CAMPAIGN_DAYS: i64 = 36_500;

/// Campaign lifecycle server.
#[derive(Clone, Debug, Parser)]
#[command(version, about)]
pub struct Config {
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    #[arg(long, env = "DATABASE_NAME", default_value = "campaigns")]
    pub database_name: String,

    #[arg(long, env = "BIND_ADDRESS", default_value = "127.0.0.1:8080")]
    pub bind_address: String,

    /// Minimum number of days between a campaign's start and end.
    #[arg(
        long,
        env = "MINIMUM_CAMPAIGN_DAYS",
        default_value_t = 1,
        value_parser = clap::value_parser!(i64).range(0..=MAX_CAMPAIGN_DAYS)
    )]
    pub minimum_campaign_days: i64,

    /// Derive `active` from the clock on create and update instead of trusting the client.
    #[arg(long, env = "DERIVE_ACTIVE", default_value_t = true, action = ArgAction::Set)]
    pub derive_active: bool,

    /// Ignore updated dates that are earlier than the stored ones.
    #[arg(long, env = "EXTEND_ONLY_UPDATES", default_value_t = true, action = ArgAction::Set)]
    pub extend_only_updates: bool,

    #[arg(
        long,
        env = "RECONCILE_INTERVAL_SECS",
        default_value_t = 3600,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub reconcile_interval_secs: u64,

    #[arg(long, env = "LOG_LEVEL", default_value_t = Level::INFO)]
    pub log_level: Level,
}

impl Config {
    pub fn validation_policy(&self) -> ValidationPolicy {
        ValidationPolicy {
            minimum_duration: Duration::days(self.minimum_campaign_days),
            derive_active: self.derive_active,
            extend_only_updates: self.extend_only_updates,
        }
    }

    pub fn reconcile_interval(&self) -> StdDuration {
        StdDuration::from_secs(self.reconcile_interval_secs)
    }
}
