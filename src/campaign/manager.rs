use chrono::Utc;

use crate::database::Database;
use crate::error::Error;

use super::validation::{self, ValidationPolicy};
use super::{Campaign, CampaignDraft, CampaignId};

#[tracing::instrument(skip(db))]
pub async fn create_campaign(
    db: &dyn Database,
    policy: &ValidationPolicy,
    draft: CampaignDraft,
) -> Result<Campaign, Error> {
    let now = Utc::now();
    let settings = validation::validate_for_create(&draft, now, policy)?;

    let campaign_id = db.campaigns().next_campaign_id().await?;
    let campaign = Campaign::new(campaign_id, settings, now);

    db.campaigns().insert_campaign(&campaign).await?;

    Ok(campaign)
}

#[tracing::instrument(skip(db))]
pub async fn get_campaigns(db: &dyn Database) -> Result<Vec<Campaign>, Error> {
    let campaigns = db.campaigns().fetch_campaigns().await?;

    Ok(campaigns)
}

#[tracing::instrument(skip(db))]
pub async fn get_campaign_by_id(
    db: &dyn Database,
    campaign_id: CampaignId,
) -> Result<Campaign, Error> {
    let campaign = db
        .campaigns()
        .fetch_campaign_by_id(campaign_id)
        .await?
        .ok_or(Error::CampaignNotFound { campaign_id })?;

    Ok(campaign)
}

#[tracing::instrument(skip(db))]
pub async fn update_campaign(
    db: &dyn Database,
    policy: &ValidationPolicy,
    campaign_id: CampaignId,
    draft: CampaignDraft,
) -> Result<Campaign, Error> {
    let existing = get_campaign_by_id(db, campaign_id).await?;

    let settings = validation::validate_for_update(&existing, &draft, Utc::now(), policy)?;

    db.campaigns().replace_campaign(existing, settings).await
}

#[tracing::instrument(skip(db))]
pub async fn delete_campaign_by_id(
    db: &dyn Database,
    campaign_id: CampaignId,
) -> Result<(), Error> {
    if !db.campaigns().campaign_exists_by_id(campaign_id).await? {
        return Err(Error::CampaignNotFound { campaign_id });
    }

    db.campaigns().delete_campaign_by_id(campaign_id).await
}

/// Deletes every campaign with the given name, returning how many were removed.
#[tracing::instrument(skip(db))]
pub async fn delete_campaigns_by_name(db: &dyn Database, name: String) -> Result<u64, Error> {
    if !db.campaigns().campaign_exists_by_name(&name).await? {
        return Err(Error::CampaignNameNotFound { name });
    }

    // another request may have removed them since the check
    match db.campaigns().delete_campaigns_by_name(&name).await? {
        0 => Err(Error::CampaignNameNotFound { name }),
        deleted => Ok(deleted),
    }
}
