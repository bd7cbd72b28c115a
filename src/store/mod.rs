pub mod memory;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::farmer::Farmer;
use crate::models::operator::{Operator, OperatorPatch, OperatorStatus};
use crate::models::request::{RequestPatch, RequestStatus, ServiceRequest};

pub use memory::MemoryStore;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("{table} {id} not found")]
    NotFound { table: &'static str, id: String },

    #[error("expected status {expected}, found {actual}")]
    Conflict {
        expected: RequestStatus,
        actual: RequestStatus,
    },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OperatorFilter {
    pub status_not_equal: Option<OperatorStatus>,
}

impl OperatorFilter {
    pub fn active() -> Self {
        Self {
            status_not_equal: Some(OperatorStatus::OffDuty),
        }
    }

    pub fn accepts(&self, operator: &Operator) -> bool {
        self.status_not_equal
            .is_none_or(|excluded| operator.status != excluded)
    }
}

/// Row storage for requests, operators and farmer profiles.
///
/// Every call may suspend on I/O and may fail; callers retry, the store does not.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get_request(&self, id: Uuid) -> Result<ServiceRequest, StoreError>;

    /// Newest first.
    async fn list_requests(&self) -> Result<Vec<ServiceRequest>, StoreError>;

    async fn insert_request(&self, request: ServiceRequest) -> Result<ServiceRequest, StoreError>;

    /// Applies `patch` to the request. When `expected` is set the write only
    /// happens if the stored status still equals it; otherwise the call fails
    /// with `StoreError::Conflict` and nothing is written.
    async fn update_request(
        &self,
        id: Uuid,
        patch: RequestPatch,
        expected: Option<RequestStatus>,
    ) -> Result<ServiceRequest, StoreError>;

    /// Roster-insertion order.
    async fn list_operators(&self, filter: OperatorFilter) -> Result<Vec<Operator>, StoreError>;

    async fn get_operator(&self, id: Uuid) -> Result<Operator, StoreError>;

    async fn insert_operator(&self, operator: Operator) -> Result<Operator, StoreError>;

    async fn update_operator(&self, id: Uuid, patch: OperatorPatch)
    -> Result<Operator, StoreError>;

    async fn delete_operator(&self, id: Uuid) -> Result<Operator, StoreError>;

    async fn get_farmer_by_phone(&self, phone: &str) -> Result<Option<Farmer>, StoreError>;

    /// Newest first.
    async fn list_farmers(&self) -> Result<Vec<Farmer>, StoreError>;

    async fn upsert_farmer(&self, farmer: Farmer) -> Result<Farmer, StoreError>;

    async fn counts(&self) -> Result<StoreCounts, StoreError>;
}

#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct StoreCounts {
    pub requests: usize,
    pub operators: usize,
    pub farmers: usize,
}
