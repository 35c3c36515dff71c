use actix_web::web::{Data, Json, Path, Query};
use actix_web::{delete, get, post, put};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::error::Error;

use super::validation::ValidationPolicy;
use super::{manager, Campaign, CampaignDraft, CampaignId, CampaignPhase};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CampaignBody {
    pub id: CampaignId,
    pub name: String,
    pub short_name: Option<String>,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub max_attempts: i32,
    pub pass_percentage: i32,
    pub active: bool,
    pub archived: bool,
    pub phase: Option<CampaignPhase>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl CampaignBody {
    pub fn render(campaign: Campaign, now: DateTime<Utc>) -> CampaignBody {
        CampaignBody {
            phase: campaign.window().map(|window| window.phase_at(now)),
            id: campaign.id,
            name: campaign.name,
            short_name: campaign.short_name,
            description: campaign.description,
            start_date: campaign.start_date,
            end_date: campaign.end_date,
            max_attempts: campaign.max_attempts,
            pass_percentage: campaign.pass_percentage,
            active: campaign.active,
            archived: campaign.archived,
            created_at: campaign.created_at,
            modified_at: campaign.modified_at,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct DeleteCampaignsQuery {
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeletedCampaignsBody {
    pub deleted: u64,
}

#[post("/campaigns")]
#[tracing::instrument(skip(db, policy))]
pub async fn create_campaign(
    db: Data<Box<dyn Database>>,
    policy: Data<ValidationPolicy>,
    body: Json<CampaignDraft>,
) -> Result<Json<CampaignBody>, Error> {
    let draft = body.into_inner();

    let campaign = manager::create_campaign(&***db, &policy, draft).await?;

    Ok(Json(CampaignBody::render(campaign, Utc::now())))
}

#[get("/campaigns")]
#[tracing::instrument(skip(db))]
pub async fn get_campaigns(
    db: Data<Box<dyn Database>>,
) -> Result<Json<Vec<CampaignBody>>, Error> {
    let campaigns = manager::get_campaigns(&***db).await?;

    let now = Utc::now();
    let body = campaigns
        .into_iter()
        .map(|campaign| CampaignBody::render(campaign, now))
        .collect();

    Ok(Json(body))
}

#[get("/campaigns/{campaign_id}")]
#[tracing::instrument(skip(db))]
pub async fn get_campaign_by_id(
    db: Data<Box<dyn Database>>,
    params: Path<CampaignId>,
) -> Result<Json<CampaignBody>, Error> {
    let campaign_id = params.into_inner();

    let campaign = manager::get_campaign_by_id(&***db, campaign_id).await?;

    Ok(Json(CampaignBody::render(campaign, Utc::now())))
}

#[put("/campaigns/{campaign_id}")]
#[tracing::instrument(skip(db, policy))]
pub async fn update_campaign(
    db: Data<Box<dyn Database>>,
    policy: Data<ValidationPolicy>,
    params: Path<CampaignId>,
    body: Json<CampaignDraft>,
) -> Result<Json<CampaignBody>, Error> {
    let campaign_id = params.into_inner();
    let draft = body.into_inner();

    let campaign = manager::update_campaign(&***db, &policy, campaign_id, draft).await?;

    Ok(Json(CampaignBody::render(campaign, Utc::now())))
}

#[delete("/campaigns/{campaign_id}")]
#[tracing::instrument(skip(db))]
pub async fn delete_campaign_by_id(
    db: Data<Box<dyn Database>>,
    params: Path<CampaignId>,
) -> Result<Json<DeletedCampaignsBody>, Error> {
    let campaign_id = params.into_inner();

    manager::delete_campaign_by_id(&***db, campaign_id).await?;

    Ok(Json(DeletedCampaignsBody { deleted: 1 }))
}

#[delete("/campaigns")]
#[tracing::instrument(skip(db))]
pub async fn delete_campaigns_by_name(
    db: Data<Box<dyn Database>>,
    query: Query<DeleteCampaignsQuery>,
) -> Result<Json<DeletedCampaignsBody>, Error> {
    let name = query.into_inner().name;

    let deleted = manager::delete_campaigns_by_name(&***db, name).await?;

    Ok(Json(DeletedCampaignsBody { deleted }))
}
