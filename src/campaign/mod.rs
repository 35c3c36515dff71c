use std::fmt::{Debug, Display};

use chrono::{DateTime, Utc};
use mongodb::bson::Bson;
use serde::{Deserialize, Serialize};

pub mod db;
pub mod endpoints;
pub mod manager;
pub mod reconciler;
pub mod validation;

/// Maximum number of characters allowed in a campaign description.
pub const MAX_DESCRIPTION_LENGTH: usize = 1000;

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct CampaignId(pub i64);

impl Display for CampaignId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{}", self.0)
    }
}

impl Debug for CampaignId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        Display::fmt(self, f)
    }
}

impl From<CampaignId> for Bson {
    fn from(id: CampaignId) -> Bson {
        Bson::Int64(id.0)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Campaign {
    #[serde(rename = "_id")]
    pub id: CampaignId,
    pub name: String,
    pub short_name: Option<String>,
    pub description: Option<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub start_date: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub end_date: DateTime<Utc>,
    pub max_attempts: i32,
    pub pass_percentage: i32,
    pub active: bool,
    pub archived: bool,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub modified_at: DateTime<Utc>,
}

impl Campaign {
    pub fn new(id: CampaignId, settings: CampaignSettings, now: DateTime<Utc>) -> Campaign {
        Campaign {
            id,
            name: settings.name,
            short_name: settings.short_name,
            description: settings.description,
            start_date: settings.start_date,
            end_date: settings.end_date,
            max_attempts: settings.max_attempts,
            pass_percentage: settings.pass_percentage,
            active: settings.active,
            archived: settings.archived,
            created_at: now,
            modified_at: now,
        }
    }

    /// Overwrites every client-controlled field, keeping identity and creation time.
    pub fn with_settings(self, settings: CampaignSettings, now: DateTime<Utc>) -> Campaign {
        Campaign {
            modified_at: now,
            ..Campaign::new(self.id, settings, self.created_at)
        }
    }

    /// Returns `None` if the stored dates do not form a valid window.
    pub fn window(&self) -> Option<ActivationWindow> {
        ActivationWindow::new(self.start_date, self.end_date)
    }
}

/// The payload a client submits to create or update a campaign.
///
/// Every field is optional here so that a missing value is reported as a
/// constraint violation on that field rather than as unparseable json.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CampaignDraft {
    pub name: String,
    pub short_name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub max_attempts: Option<i32>,
    pub pass_percentage: Option<i32>,
    pub active: bool,
    pub archived: bool,
}

/// A draft that has passed validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CampaignSettings {
    pub name: String,
    pub short_name: Option<String>,
    pub description: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub max_attempts: i32,
    pub pass_percentage: i32,
    pub active: bool,
    pub archived: bool,
}

/// The half-open interval `[start, end)` in which a campaign is active.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ActivationWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl ActivationWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<ActivationWindow> {
        if end > start {
            Some(ActivationWindow { start, end })
        } else {
            None
        }
    }

    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        is_active_at(self.start, self.end, now)
    }

    pub fn phase_at(&self, now: DateTime<Utc>) -> CampaignPhase {
        if now < self.start {
            CampaignPhase::Pending
        } else if now < self.end {
            CampaignPhase::Active
        } else {
            CampaignPhase::Expired
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum CampaignPhase {
    Pending,
    Active,
    Expired,
}

pub fn is_active_at(start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    start <= now && now < end
}
