use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::models::farmer::Farmer;
use crate::models::operator::{Operator, OperatorPatch};
use crate::models::request::{RequestPatch, RequestStatus, ServiceRequest};
use crate::store::{OperatorFilter, RecordStore, StoreCounts, StoreError};

struct Row<T> {
    seq: u64,
    value: T,
}

/// In-process store. Conditional writes hold the shard lock of the row for
/// the whole check-and-set, so two racing assignments cannot both commit.
#[derive(Default)]
pub struct MemoryStore {
    next_seq: AtomicU64,
    requests: DashMap<Uuid, Row<ServiceRequest>>,
    operators: DashMap<Uuid, Row<Operator>>,
    farmers: DashMap<String, Row<Farmer>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::Relaxed)
    }
}

fn request_not_found(id: Uuid) -> StoreError {
    StoreError::NotFound {
        table: "request",
        id: id.to_string(),
    }
}

fn operator_not_found(id: Uuid) -> StoreError {
    StoreError::NotFound {
        table: "operator",
        id: id.to_string(),
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get_request(&self, id: Uuid) -> Result<ServiceRequest, StoreError> {
        self.requests
            .get(&id)
            .map(|row| row.value.clone())
            .ok_or_else(|| request_not_found(id))
    }

    async fn list_requests(&self) -> Result<Vec<ServiceRequest>, StoreError> {
        let mut rows: Vec<(u64, ServiceRequest)> = self
            .requests
            .iter()
            .map(|entry| (entry.seq, entry.value.clone()))
            .collect();
        rows.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(rows.into_iter().map(|(_, request)| request).collect())
    }

    async fn insert_request(&self, request: ServiceRequest) -> Result<ServiceRequest, StoreError> {
        let row = Row {
            seq: self.seq(),
            value: request.clone(),
        };
        self.requests.insert(request.id, row);
        Ok(request)
    }

    async fn update_request(
        &self,
        id: Uuid,
        patch: RequestPatch,
        expected: Option<RequestStatus>,
    ) -> Result<ServiceRequest, StoreError> {
        let mut row = self
            .requests
            .get_mut(&id)
            .ok_or_else(|| request_not_found(id))?;

        if let Some(expected) = expected {
            if row.value.status != expected {
                return Err(StoreError::Conflict {
                    expected,
                    actual: row.value.status,
                });
            }
        }

        patch.apply(&mut row.value);
        Ok(row.value.clone())
    }

    async fn list_operators(&self, filter: OperatorFilter) -> Result<Vec<Operator>, StoreError> {
        let mut rows: Vec<(u64, Operator)> = self
            .operators
            .iter()
            .filter(|entry| filter.accepts(&entry.value))
            .map(|entry| (entry.seq, entry.value.clone()))
            .collect();
        rows.sort_by_key(|(seq, _)| *seq);

        Ok(rows.into_iter().map(|(_, operator)| operator).collect())
    }

    async fn get_operator(&self, id: Uuid) -> Result<Operator, StoreError> {
        self.operators
            .get(&id)
            .map(|row| row.value.clone())
            .ok_or_else(|| operator_not_found(id))
    }

    async fn insert_operator(&self, operator: Operator) -> Result<Operator, StoreError> {
        let row = Row {
            seq: self.seq(),
            value: operator.clone(),
        };
        self.operators.insert(operator.id, row);
        Ok(operator)
    }

    async fn update_operator(
        &self,
        id: Uuid,
        patch: OperatorPatch,
    ) -> Result<Operator, StoreError> {
        let mut row = self
            .operators
            .get_mut(&id)
            .ok_or_else(|| operator_not_found(id))?;

        patch.apply(&mut row.value);
        row.value.updated_at = Utc::now();
        Ok(row.value.clone())
    }

    async fn delete_operator(&self, id: Uuid) -> Result<Operator, StoreError> {
        self.operators
            .remove(&id)
            .map(|(_, row)| row.value)
            .ok_or_else(|| operator_not_found(id))
    }

    async fn get_farmer_by_phone(&self, phone: &str) -> Result<Option<Farmer>, StoreError> {
        Ok(self.farmers.get(phone).map(|row| row.value.clone()))
    }

    async fn list_farmers(&self) -> Result<Vec<Farmer>, StoreError> {
        let mut rows: Vec<(u64, Farmer)> = self
            .farmers
            .iter()
            .map(|entry| (entry.seq, entry.value.clone()))
            .collect();
        rows.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(rows.into_iter().map(|(_, farmer)| farmer).collect())
    }

    async fn upsert_farmer(&self, farmer: Farmer) -> Result<Farmer, StoreError> {
        let mut row = self
            .farmers
            .entry(farmer.phone.clone())
            .or_insert_with(|| Row {
                seq: self.seq(),
                value: farmer.clone(),
            });

        // A known phone number keeps its first id and creation time.
        let id = row.value.id;
        let created_at = row.value.created_at;
        row.value = Farmer {
            id,
            created_at,
            ..farmer
        };

        Ok(row.value.clone())
    }

    async fn counts(&self) -> Result<StoreCounts, StoreError> {
        Ok(StoreCounts {
            requests: self.requests.len(),
            operators: self.operators.len(),
            farmers: self.farmers.len(),
        })
    }
}
