//! Time-triggered loop that drives the weekly rollover.
//!
//! The loop only decides WHEN to look; the rollover itself decides whether
//! anything is due via the week marker, so overlapping deployments or a
//! restart mid-week never double-apply a rollover.

use crate::{
    config::settings::SchedulerConfig,
    core::rollover::{format_rollover_summary, run_weekly_rollover},
};
use sea_orm::DatabaseConnection;
use std::time::Duration;
use tracing::{debug, error, info};

/// Runs the rollover check loop forever.
///
/// Each tick calls [`run_weekly_rollover`]; failures are logged and the
/// loop keeps going, so a transient store error only delays the rollover
/// until the next tick.
pub async fn run_rollover_loop(db: DatabaseConnection, config: SchedulerConfig) {
    let period = Duration::from_secs(config.check_interval_secs.max(1));
    let mut ticker = tokio::time::interval(period);

    info!(
        interval_secs = period.as_secs(),
        "starting weekly rollover scheduler"
    );

    loop {
        ticker.tick().await;

        match run_weekly_rollover(&db).await {
            Ok(Some(summary)) => {
                info!("{}", format_rollover_summary(&summary));
            }
            Ok(None) => {
                debug!("weekly rollover already applied for the current week");
            }
            Err(error) => {
                error!(%error, "weekly rollover check failed");
            }
        }
    }
}
