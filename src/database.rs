use mongodb::Database as MongoClientDatabase;

use crate::campaign::db::{self as campaign_db, CampaignStore, MongoCampaignStore};
use crate::error::Error;

pub trait Database: Send + Sync {
    fn campaigns(&self) -> &dyn CampaignStore;
}

#[derive(Debug, Clone)]
pub struct MongoDatabase {
    campaigns: MongoCampaignStore,
}

impl MongoDatabase {
    pub async fn initialize(db: MongoClientDatabase) -> Result<MongoDatabase, Error> {
        campaign_db::initialize(&db).await?;

        Ok(MongoDatabase {
            campaigns: MongoCampaignStore::new(&db),
        })
    }
}

impl Database for MongoDatabase {
    fn campaigns(&self) -> &dyn CampaignStore {
        &self.campaigns
    }
}
