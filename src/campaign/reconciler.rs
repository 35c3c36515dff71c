use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::database::Database;
use crate::error::Error;

/// Outcome of a single reconciliation pass.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconciliationReport {
    pub checked: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// Brings every campaign's `active` flag in line with `now`.
///
/// Only the flag of campaigns whose value changed is written. A campaign that
/// cannot be evaluated or saved is logged and counted as skipped; it does not
/// stop the rest of the run. Failing to list the campaigns aborts the run.
#[tracing::instrument(skip(db))]
pub async fn reconcile_once(
    db: &dyn Database,
    now: DateTime<Utc>,
) -> Result<ReconciliationReport, Error> {
    let campaigns = db.campaigns().fetch_campaigns().await?;

    let mut report = ReconciliationReport {
        checked: campaigns.len(),
        ..ReconciliationReport::default()
    };

    for campaign in campaigns {
        let window = match campaign.window() {
            Some(window) => window,
            None => {
                warn!(
                    campaign_id = %campaign.id,
                    start_date = %campaign.start_date,
                    end_date = %campaign.end_date,
                    "campaign has a malformed activation window, skipping"
                );
                report.skipped += 1;
                continue;
            }
        };

        let active = window.contains(now);
        if active == campaign.active {
            continue;
        }

        let campaign_id = campaign.id;
        match db.campaigns().update_campaign_active(campaign, active).await {
            Ok(campaign) => {
                info!(campaign_id = %campaign.id, active, "updated campaign activation");
                report.updated += 1;
            }
            Err(err) => {
                warn!(
                    campaign_id = %campaign_id,
                    error = %err,
                    "failed to update campaign activation"
                );
                report.skipped += 1;
            }
        }
    }

    Ok(report)
}

/// Runs `reconcile_once` every `period`, starting immediately.
pub async fn run(db: Box<dyn Database>, period: StdDuration) {
    let mut interval = time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;

        match reconcile_once(&*db, Utc::now()).await {
            Ok(report) => info!(
                checked = report.checked,
                updated = report.updated,
                skipped = report.skipped,
                "reconciled campaign activation"
            ),
            Err(err) => error!(error = %err, "failed to fetch campaigns for reconciliation"),
        }
    }
}
