use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::engine::lifecycle::{self, Transition};
use crate::engine::matching::get_pilot_matches;
use crate::error::AppError;
use crate::models::event::{ChangeKind, Table};
use crate::models::farmer::Farmer;
use crate::models::matching::MatchingResult;
use crate::models::request::{
    Location, RequestPatch, RequestSource, RequestStatus, ServiceRequest,
};
use crate::state::AppState;
use crate::validation;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/requests", post(create_request).get(list_requests))
        .route("/requests/:id", get(get_request).patch(edit_request))
        .route("/requests/:id/matches", get(get_matches))
        .route("/requests/:id/assign", post(assign))
        .route("/requests/:id/confirm", post(confirm))
        .route("/requests/:id/reject", post(reject))
        .route("/requests/:id/complete", post(complete))
}

#[derive(Deserialize)]
pub struct CreateRequest {
    pub farmer_phone: String,
    pub farmer_name: Option<String>,
    pub crop: Option<String>,
    pub acres: f64,
    pub preferred_date: NaiveDate,
    pub pincode: Option<String>,
    pub village: Option<String>,
    pub district: Option<String>,
    pub address: Option<String>,
    pub source: Option<RequestSource>,
}

#[derive(Deserialize)]
pub struct EditRequest {
    pub farmer_phone: Option<String>,
    pub crop: Option<String>,
    pub acres: Option<f64>,
    pub preferred_date: Option<NaiveDate>,
    pub pincode: Option<String>,
    pub village: Option<String>,
    pub district: Option<String>,
    pub address: Option<String>,
}

#[derive(Deserialize)]
pub struct OperatorAction {
    pub operator_id: Uuid,
}

async fn create_request(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateRequest>,
) -> Result<Json<ServiceRequest>, AppError> {
    let phone = validation::phone(&payload.farmer_phone)?;
    let location = Location {
        pincode: validation::optional_text(payload.pincode)
            .map(|raw| validation::pincode(&raw))
            .transpose()?,
        village: validation::optional_text(payload.village),
        district: validation::optional_text(payload.district),
        address: validation::optional_text(payload.address),
    };

    let source = payload.source.unwrap_or(RequestSource::Manual);
    let crop = match (payload.crop, source) {
        (Some(crop), _) => validation::crop(&crop)?,
        (None, RequestSource::Ivr) => validation::PHONE_BOOKING_CROP.to_string(),
        (None, _) => return Err(AppError::Validation("crop cannot be empty".to_string())),
    };

    let now = Utc::now();
    let request = ServiceRequest {
        id: Uuid::new_v4(),
        farmer_phone: phone.clone(),
        crop,
        acres: validation::acres(payload.acres)?,
        preferred_date: payload.preferred_date,
        location,
        source,
        status: RequestStatus::Pending,
        assigned_operator: None,
        created_at: now,
        updated_at: now,
    };

    ensure_farmer(&state, &request, payload.farmer_name).await?;

    let saved = state
        .store
        .insert_request(request)
        .await
        .map_err(|err| AppError::from_store("create_request", &phone, err))?;

    info!(request_id = %saved.id, farmer_phone = %phone, source = ?saved.source, "request created");
    state.publish(Table::Requests, ChangeKind::Insert, saved.id);
    Ok(Json(saved))
}

/// Bookings for a phone number nobody has registered yet create the farmer
/// profile on the fly.
async fn ensure_farmer(
    state: &AppState,
    request: &ServiceRequest,
    farmer_name: Option<String>,
) -> Result<(), AppError> {
    let phone = &request.farmer_phone;
    let existing = state
        .store
        .get_farmer_by_phone(phone)
        .await
        .map_err(|err| AppError::from_store("create_request", phone, err))?;
    if existing.is_some() {
        return Ok(());
    }

    let name = farmer_name.ok_or_else(|| {
        AppError::Validation(format!("farmer_name is required for new farmer {phone}"))
    })?;

    let farmer = Farmer {
        id: Uuid::new_v4(),
        name: validation::required("farmer_name", &name)?,
        phone: phone.clone(),
        village: request.location.village.clone(),
        pincode: request.location.pincode.clone(),
        district: request.location.district.clone(),
        address: request.location.address.clone(),
        created_at: Utc::now(),
    };

    let saved = state
        .store
        .upsert_farmer(farmer)
        .await
        .map_err(|err| AppError::from_store("create_request", phone, err))?;

    state.publish(Table::Farmers, ChangeKind::Insert, saved.id);
    Ok(())
}

async fn list_requests(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ServiceRequest>>, AppError> {
    let requests = state
        .store
        .list_requests()
        .await
        .map_err(|err| AppError::from_store("list_requests", "requests", err))?;

    Ok(Json(requests))
}

async fn get_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ServiceRequest>, AppError> {
    let request = state
        .store
        .get_request(id)
        .await
        .map_err(|err| AppError::from_store("get_request", id, err))?;

    Ok(Json(request))
}

async fn edit_request(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EditRequest>,
) -> Result<Json<ServiceRequest>, AppError> {
    let patch = RequestPatch {
        farmer_phone: payload
            .farmer_phone
            .map(|raw| validation::phone(&raw))
            .transpose()?,
        crop: payload
            .crop
            .map(|raw| validation::crop(&raw))
            .transpose()?,
        acres: payload.acres.map(validation::acres).transpose()?,
        preferred_date: payload.preferred_date,
        pincode: validation::optional_text(payload.pincode)
            .map(|raw| validation::pincode(&raw))
            .transpose()?,
        village: validation::optional_text(payload.village),
        district: validation::optional_text(payload.district),
        address: validation::optional_text(payload.address),
        ..RequestPatch::default()
    };
    debug_assert!(!patch.touches_lifecycle());

    let updated = state
        .store
        .update_request(id, patch, None)
        .await
        .map_err(|err| AppError::from_store("edit_request", id, err))?;

    state.publish(Table::Requests, ChangeKind::Update, id);
    Ok(Json(updated))
}

async fn get_matches(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<MatchingResult>, AppError> {
    let start = Instant::now();
    let outcome = get_pilot_matches(state.store.as_ref(), id).await;
    let elapsed = start.elapsed().as_secs_f64();

    match outcome {
        Ok(result) => {
            state.metrics.observe_match("success", elapsed);
            state.metrics.observe_tiers(&result);
            Ok(Json(result))
        }
        Err(err) => {
            state.metrics.observe_match("error", elapsed);
            warn!(request_id = %id, error = %err, "pilot matching failed");
            Err(err)
        }
    }
}

async fn assign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<OperatorAction>,
) -> Result<Json<ServiceRequest>, AppError> {
    run_transition(&state, id, payload.operator_id, Transition::Assign).await
}

async fn confirm(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<OperatorAction>,
) -> Result<Json<ServiceRequest>, AppError> {
    run_transition(&state, id, payload.operator_id, Transition::Confirm).await
}

async fn reject(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<OperatorAction>,
) -> Result<Json<ServiceRequest>, AppError> {
    run_transition(&state, id, payload.operator_id, Transition::Reject).await
}

async fn complete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<OperatorAction>,
) -> Result<Json<ServiceRequest>, AppError> {
    run_transition(&state, id, payload.operator_id, Transition::Complete).await
}

async fn run_transition(
    state: &AppState,
    request_id: Uuid,
    operator_id: Uuid,
    transition: Transition,
) -> Result<Json<ServiceRequest>, AppError> {
    let name = transition.as_str();

    match lifecycle::apply(state.store.as_ref(), request_id, operator_id, transition).await {
        Ok(updated) => {
            state.metrics.observe_transition(name, "success");
            state.publish(Table::Requests, ChangeKind::Update, request_id);
            Ok(Json(updated))
        }
        Err(err) => {
            state.metrics.observe_transition(name, "error");
            match &err {
                AppError::Store { .. } | AppError::Internal(_) => {
                    error!(request_id = %request_id, transition = name, error = %err, "transition failed")
                }
                _ => {
                    warn!(request_id = %request_id, transition = name, error = %err, "transition refused")
                }
            }
            Err(err)
        }
    }
}
