//! Booking lifecycle.
//!
//! ```text
//!   Pending ──assign──▶ Assigned ──confirm──▶ Confirmed
//!                          │  │                   │
//!                          │  └──────complete─────┤
//!                       reject                    ▼
//!                          ▼                  Completed
//!                      Rejected
//! ```
//!
//! `Completed` and `Rejected` are terminal. Every write is conditional on the
//! status read just before it, so a concurrent transition makes the slower
//! caller fail with `Conflict` instead of silently overwriting.

use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::request::{RequestPatch, RequestStatus, ServiceRequest};
use crate::store::RecordStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Assign,
    Confirm,
    Reject,
    Complete,
}

impl Transition {
    pub fn target(self) -> RequestStatus {
        match self {
            Transition::Assign => RequestStatus::Assigned,
            Transition::Confirm => RequestStatus::Confirmed,
            Transition::Reject => RequestStatus::Rejected,
            Transition::Complete => RequestStatus::Completed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Transition::Assign => "assign",
            Transition::Confirm => "confirm",
            Transition::Reject => "reject",
            Transition::Complete => "complete",
        }
    }
}

/// Checks `from -> to` against the transition table.
pub fn validate_transition(from: RequestStatus, to: RequestStatus) -> Result<(), AppError> {
    if next_valid_states(from).contains(&to) {
        Ok(())
    } else {
        Err(AppError::IllegalTransition { from, to })
    }
}

pub fn next_valid_states(from: RequestStatus) -> &'static [RequestStatus] {
    use RequestStatus::*;

    match from {
        Pending => &[Assigned],
        Assigned => &[Confirmed, Rejected, Completed],
        Confirmed => &[Completed],
        Completed | Rejected => &[],
    }
}

/// Dispatcher picks a pilot for a pending request.
///
/// The pilot does not have to come from the match list, but must exist and
/// must not be off duty.
pub async fn assign_operator(
    store: &dyn RecordStore,
    request_id: Uuid,
    operator_id: Uuid,
) -> Result<ServiceRequest, AppError> {
    let op = Transition::Assign.as_str();

    let current = store
        .get_request(request_id)
        .await
        .map_err(|err| AppError::from_store(op, request_id, err))?;
    validate_transition(current.status, RequestStatus::Assigned)?;

    let operator = store
        .get_operator(operator_id)
        .await
        .map_err(|err| AppError::from_store(op, operator_id, err))?;
    if !operator.status.is_active() {
        warn!(request_id = %request_id, operator_id = %operator_id, "refusing off-duty operator");
        return Err(AppError::OperatorOffDuty(operator_id));
    }

    let updated = store
        .update_request(
            request_id,
            RequestPatch::assignment(operator_id),
            Some(current.status),
        )
        .await
        .map_err(|err| AppError::from_store(op, request_id, err))?;

    info!(
        request_id = %request_id,
        operator_id = %operator_id,
        operator = %operator.name,
        "request assigned"
    );

    Ok(updated)
}

pub async fn confirm(
    store: &dyn RecordStore,
    request_id: Uuid,
    operator_id: Uuid,
) -> Result<ServiceRequest, AppError> {
    operator_transition(store, request_id, operator_id, Transition::Confirm).await
}

/// The assigned pilot declines. The pilot stays recorded on the request.
pub async fn reject(
    store: &dyn RecordStore,
    request_id: Uuid,
    operator_id: Uuid,
) -> Result<ServiceRequest, AppError> {
    operator_transition(store, request_id, operator_id, Transition::Reject).await
}

/// Allowed straight from `Assigned` as well as from `Confirmed`.
pub async fn complete(
    store: &dyn RecordStore,
    request_id: Uuid,
    operator_id: Uuid,
) -> Result<ServiceRequest, AppError> {
    operator_transition(store, request_id, operator_id, Transition::Complete).await
}

pub async fn apply(
    store: &dyn RecordStore,
    request_id: Uuid,
    operator_id: Uuid,
    transition: Transition,
) -> Result<ServiceRequest, AppError> {
    match transition {
        Transition::Assign => assign_operator(store, request_id, operator_id).await,
        other => operator_transition(store, request_id, operator_id, other).await,
    }
}

async fn operator_transition(
    store: &dyn RecordStore,
    request_id: Uuid,
    operator_id: Uuid,
    transition: Transition,
) -> Result<ServiceRequest, AppError> {
    let op = transition.as_str();
    let target = transition.target();

    let current = store
        .get_request(request_id)
        .await
        .map_err(|err| AppError::from_store(op, request_id, err))?;
    validate_transition(current.status, target)?;

    if current.assigned_operator != Some(operator_id) {
        return Err(AppError::Forbidden(format!(
            "operator {operator_id} is not assigned to request {request_id}"
        )));
    }

    let updated = store
        .update_request(
            request_id,
            RequestPatch::status(target),
            Some(current.status),
        )
        .await
        .map_err(|err| AppError::from_store(op, request_id, err))?;

    info!(
        request_id = %request_id,
        operator_id = %operator_id,
        from = %current.status,
        to = %target,
        "request status changed"
    );

    Ok(updated)
}
