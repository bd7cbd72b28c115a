use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Farmer {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub village: Option<String>,
    pub pincode: Option<String>,
    pub district: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}
