use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{self, Document};
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use mongodb::{Collection, Database};

use crate::error::Error;

use super::{Campaign, CampaignId, CampaignSettings};

pub const CAMPAIGNS: &str = "campaigns";
pub const COUNTERS: &str = "counters";

#[async_trait]
pub trait CampaignStore: Send + Sync {
    async fn next_campaign_id(&self) -> Result<CampaignId, Error>;

    async fn insert_campaign(&self, campaign: &Campaign) -> Result<(), Error>;

    async fn fetch_campaigns(&self) -> Result<Vec<Campaign>, Error>;

    async fn fetch_campaign_by_id(&self, campaign_id: CampaignId)
        -> Result<Option<Campaign>, Error>;

    async fn campaign_exists_by_id(&self, campaign_id: CampaignId) -> Result<bool, Error>;

    async fn campaign_exists_by_name(&self, name: &str) -> Result<bool, Error>;

    /// Replaces every client-controlled field, failing if the campaign was
    /// modified since it was read.
    async fn replace_campaign(
        &self,
        campaign: Campaign,
        settings: CampaignSettings,
    ) -> Result<Campaign, Error>;

    /// Writes only the `active` flag, failing if the campaign was modified
    /// since it was read.
    async fn update_campaign_active(
        &self,
        campaign: Campaign,
        active: bool,
    ) -> Result<Campaign, Error>;

    async fn delete_campaign_by_id(&self, campaign_id: CampaignId) -> Result<(), Error>;

    async fn delete_campaigns_by_name(&self, name: &str) -> Result<u64, Error>;
}

#[derive(Debug, Clone)]
pub struct MongoCampaignStore {
    campaigns: Collection<Campaign>,
    counters: Collection<Document>,
}

impl MongoCampaignStore {
    pub fn new(db: &Database) -> MongoCampaignStore {
        MongoCampaignStore {
            campaigns: db.collection(CAMPAIGNS),
            counters: db.collection(COUNTERS),
        }
    }
}

pub async fn initialize(db: &Database) -> Result<(), Error> {
    db.run_command(
        bson::doc! {
            "createIndexes": CAMPAIGNS,
            "indexes": [
                { "key": { "name": 1 }, "name": "by_name" },
            ]
        },
        None,
    )
    .await?;

    Ok(())
}

#[async_trait]
impl CampaignStore for MongoCampaignStore {
    #[tracing::instrument(skip(self))]
    async fn next_campaign_id(&self) -> Result<CampaignId, Error> {
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        let counter = self
            .counters
            .find_one_and_update(
                bson::doc! { "_id": CAMPAIGNS },
                bson::doc! { "$inc": { "seq": 1_i64 } },
                options,
            )
            .await?
            .ok_or_else(|| Error::ExistentialState("campaign counter was not upserted".into()))?;

        let seq = counter
            .get_i64("seq")
            .map_err(|err| Error::ExistentialState(format!("campaign counter: {}", err)))?;

        Ok(CampaignId(seq))
    }

    #[tracing::instrument(skip(self))]
    async fn insert_campaign(&self, campaign: &Campaign) -> Result<(), Error> {
        self.campaigns.insert_one(campaign, None).await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_campaigns(&self) -> Result<Vec<Campaign>, Error> {
        let campaigns: Vec<Campaign> = self
            .campaigns
            .find(bson::doc! {}, None)
            .await?
            .try_collect()
            .await?;

        Ok(campaigns)
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_campaign_by_id(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Option<Campaign>, Error> {
        let campaign = self
            .campaigns
            .find_one(bson::doc! { "_id": campaign_id }, None)
            .await?;

        Ok(campaign)
    }

    #[tracing::instrument(skip(self))]
    async fn campaign_exists_by_id(&self, campaign_id: CampaignId) -> Result<bool, Error> {
        let count = self
            .campaigns
            .count_documents(bson::doc! { "_id": campaign_id }, None)
            .await?;

        Ok(count > 0)
    }

    #[tracing::instrument(skip(self))]
    async fn campaign_exists_by_name(&self, name: &str) -> Result<bool, Error> {
        let count = self
            .campaigns
            .count_documents(bson::doc! { "name": name }, None)
            .await?;

        Ok(count > 0)
    }

    #[tracing::instrument(skip(self))]
    async fn replace_campaign(
        &self,
        campaign: Campaign,
        settings: CampaignSettings,
    ) -> Result<Campaign, Error> {
        let old_modified_at = bson::DateTime::from_chrono(campaign.modified_at);
        let campaign_id = campaign.id;
        let campaign = campaign.with_settings(settings, Utc::now());

        let result = self
            .campaigns
            .replace_one(
                bson::doc! { "_id": campaign_id, "modified_at": old_modified_at },
                &campaign,
                None,
            )
            .await?;

        if result.matched_count == 0 {
            return Err(Error::ConcurrentModificationDetected);
        }

        Ok(campaign)
    }

    #[tracing::instrument(skip(self))]
    async fn update_campaign_active(
        &self,
        mut campaign: Campaign,
        active: bool,
    ) -> Result<Campaign, Error> {
        let now = Utc::now();
        let old_modified_at = bson::DateTime::from_chrono(campaign.modified_at);
        let new_modified_at = bson::DateTime::from_chrono(now);

        let result = self
            .campaigns
            .update_one(
                bson::doc! { "_id": campaign.id, "modified_at": old_modified_at },
                bson::doc! { "$set": { "active": active, "modified_at": new_modified_at } },
                None,
            )
            .await?;

        if result.matched_count == 0 {
            return Err(Error::ConcurrentModificationDetected);
        }

        campaign.modified_at = now;
        campaign.active = active;

        Ok(campaign)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_campaign_by_id(&self, campaign_id: CampaignId) -> Result<(), Error> {
        self.campaigns
            .delete_one(bson::doc! { "_id": campaign_id }, None)
            .await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_campaigns_by_name(&self, name: &str) -> Result<u64, Error> {
        let result = self
            .campaigns
            .delete_many(bson::doc! { "name": name }, None)
            .await?;

        Ok(result.deleted_count)
    }
}
