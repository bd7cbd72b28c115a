use std::collections::BTreeSet;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, post};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::event::{ChangeKind, Table};
use crate::models::operator::{Operator, OperatorPatch, OperatorStatus};
use crate::state::AppState;
use crate::store::OperatorFilter;
use crate::validation;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/operators", post(create_operator).get(list_operators))
        .route(
            "/operators/:id",
            get(get_operator)
                .patch(edit_operator)
                .delete(delete_operator),
        )
        .route("/operators/:id/status", patch(update_operator_status))
}

#[derive(Deserialize)]
pub struct CreateOperatorRequest {
    pub name: String,
    pub phone: String,
    pub location: String,
    pub district: Option<String>,
    #[serde(default)]
    pub service_pincodes: Vec<String>,
    #[serde(default)]
    pub service_villages: Vec<String>,
    #[serde(default)]
    pub available_dates: BTreeSet<NaiveDate>,
}

#[derive(Deserialize)]
pub struct EditOperatorRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub district: Option<String>,
    pub service_pincodes: Option<Vec<String>>,
    pub service_villages: Option<Vec<String>>,
    pub available_dates: Option<BTreeSet<NaiveDate>>,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OperatorStatus,
}

#[derive(Deserialize, Default)]
pub struct ListOperatorsQuery {
    #[serde(default)]
    pub active: bool,
}

async fn create_operator(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateOperatorRequest>,
) -> Result<Json<Operator>, AppError> {
    let now = Utc::now();
    let operator = Operator {
        id: Uuid::new_v4(),
        name: validation::required("name", &payload.name)?,
        phone: validation::phone(&payload.phone)?,
        status: OperatorStatus::Idle,
        location: payload.location.trim().to_string(),
        district: validation::optional_text(payload.district),
        service_pincodes: validation::pincodes(payload.service_pincodes)?,
        service_villages: validation::villages(payload.service_villages),
        available_dates: payload.available_dates,
        created_at: now,
        updated_at: now,
    };

    let saved = state
        .store
        .insert_operator(operator)
        .await
        .map_err(|err| AppError::from_store("create_operator", "operators", err))?;

    info!(operator_id = %saved.id, name = %saved.name, "operator onboarded");
    state.publish(Table::Operators, ChangeKind::Insert, saved.id);
    Ok(Json(saved))
}

async fn list_operators(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListOperatorsQuery>,
) -> Result<Json<Vec<Operator>>, AppError> {
    let filter = if query.active {
        OperatorFilter::active()
    } else {
        OperatorFilter::default()
    };

    let operators = state
        .store
        .list_operators(filter)
        .await
        .map_err(|err| AppError::from_store("list_operators", "operators", err))?;

    Ok(Json(operators))
}

async fn get_operator(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Operator>, AppError> {
    let operator = state
        .store
        .get_operator(id)
        .await
        .map_err(|err| AppError::from_store("get_operator", id, err))?;

    Ok(Json(operator))
}

async fn edit_operator(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EditOperatorRequest>,
) -> Result<Json<Operator>, AppError> {
    let patch = OperatorPatch {
        name: payload
            .name
            .map(|name| validation::required("name", &name))
            .transpose()?,
        phone: payload
            .phone
            .map(|phone| validation::phone(&phone))
            .transpose()?,
        status: None,
        location: payload.location.map(|loc| loc.trim().to_string()),
        district: validation::optional_text(payload.district),
        service_pincodes: payload
            .service_pincodes
            .map(validation::pincodes)
            .transpose()?,
        service_villages: payload.service_villages.map(validation::villages),
        available_dates: payload.available_dates,
    };

    let updated = state
        .store
        .update_operator(id, patch)
        .await
        .map_err(|err| AppError::from_store("edit_operator", id, err))?;

    state.publish(Table::Operators, ChangeKind::Update, id);
    Ok(Json(updated))
}

async fn update_operator_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Operator>, AppError> {
    let patch = OperatorPatch {
        status: Some(payload.status),
        ..OperatorPatch::default()
    };

    let updated = state
        .store
        .update_operator(id, patch)
        .await
        .map_err(|err| AppError::from_store("update_operator_status", id, err))?;

    info!(operator_id = %id, status = ?updated.status, "operator status changed");
    state.publish(Table::Operators, ChangeKind::Update, id);
    Ok(Json(updated))
}

async fn delete_operator(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Operator>, AppError> {
    let removed = state
        .store
        .delete_operator(id)
        .await
        .map_err(|err| AppError::from_store("delete_operator", id, err))?;

    info!(operator_id = %id, "operator removed");
    state.publish(Table::Operators, ChangeKind::Delete, id);
    Ok(Json(removed))
}
