use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::event::{ChangeKind, Table};
use crate::models::farmer::Farmer;
use crate::state::AppState;
use crate::validation;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/farmers", post(upsert_farmer).get(list_farmers))
        .route("/farmers/:phone", get(get_farmer))
}

#[derive(Deserialize)]
pub struct FarmerRequest {
    pub name: String,
    pub phone: String,
    pub village: Option<String>,
    pub pincode: Option<String>,
    pub district: Option<String>,
    pub address: Option<String>,
}

async fn upsert_farmer(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<FarmerRequest>,
) -> Result<Json<Farmer>, AppError> {
    let pincode = validation::optional_text(payload.pincode)
        .map(|raw| validation::pincode(&raw))
        .transpose()?;

    let farmer = Farmer {
        id: Uuid::new_v4(),
        name: validation::required("name", &payload.name)?,
        phone: validation::phone(&payload.phone)?,
        village: validation::optional_text(payload.village),
        pincode,
        district: validation::optional_text(payload.district),
        address: validation::optional_text(payload.address),
        created_at: Utc::now(),
    };

    let phone = farmer.phone.clone();
    let saved = state
        .store
        .upsert_farmer(farmer)
        .await
        .map_err(|err| AppError::from_store("upsert_farmer", &phone, err))?;

    state.publish(Table::Farmers, ChangeKind::Update, saved.id);
    Ok(Json(saved))
}

async fn list_farmers(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Farmer>>, AppError> {
    let farmers = state
        .store
        .list_farmers()
        .await
        .map_err(|err| AppError::from_store("list_farmers", "farmers", err))?;

    Ok(Json(farmers))
}

async fn get_farmer(
    State(state): State<Arc<AppState>>,
    Path(phone): Path<String>,
) -> Result<Json<Farmer>, AppError> {
    let phone = validation::phone(&phone)?;

    state
        .store
        .get_farmer_by_phone(&phone)
        .await
        .map_err(|err| AppError::from_store("get_farmer", &phone, err))?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("farmer {phone} not found")))
}
