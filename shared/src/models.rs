//! Data models for the BandSync application

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User account as exposed to clients
///
/// The password digest lives only in the backend's store record and has
/// no field here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub profile_image_url: Option<String>,
    pub timezone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A band a user can belong to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Band {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Membership of a user in a band, with the band attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BandMembership {
    pub id: Uuid,
    pub band_id: Uuid,
    pub role: String,
    pub joined_at: DateTime<Utc>,
    pub band: Band,
}

/// Current user profile together with their memberships
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWithMemberships {
    #[serde(flatten)]
    pub user: User,
    pub band_memberships: Vec<BandMembership>,
}
