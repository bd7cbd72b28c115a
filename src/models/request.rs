use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RequestStatus {
    Pending,
    Assigned,
    Confirmed,
    Completed,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "Pending",
            RequestStatus::Assigned => "Assigned",
            RequestStatus::Confirmed => "Confirmed",
            RequestStatus::Completed => "Completed",
            RequestStatus::Rejected => "Rejected",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RequestStatus::Completed | RequestStatus::Rejected)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RequestSource {
    Manual,
    SelfService,
    Ivr,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Location {
    pub pincode: Option<String>,
    pub village: Option<String>,
    pub district: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub id: Uuid,
    pub farmer_phone: String,
    pub crop: String,
    pub acres: f64,
    pub preferred_date: NaiveDate,
    pub location: Location,
    pub source: RequestSource,
    pub status: RequestStatus,
    pub assigned_operator: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update of a request row. The lifecycle controller is the only
/// caller that sets `status` or `assigned_operator`.
///
/// `None` leaves a field untouched. Location fields (`pincode`, `village`,
/// `district`, `address`) can be replaced but never cleared once set.
#[derive(Debug, Clone, Default)]
pub struct RequestPatch {
    pub status: Option<RequestStatus>,
    pub assigned_operator: Option<Uuid>,
    pub crop: Option<String>,
    pub acres: Option<f64>,
    pub preferred_date: Option<NaiveDate>,
    pub farmer_phone: Option<String>,
    pub pincode: Option<String>,
    pub village: Option<String>,
    pub district: Option<String>,
    pub address: Option<String>,
}

impl RequestPatch {
    pub fn status(status: RequestStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn assignment(operator_id: Uuid) -> Self {
        Self {
            status: Some(RequestStatus::Assigned),
            assigned_operator: Some(operator_id),
            ..Self::default()
        }
    }

    pub fn touches_lifecycle(&self) -> bool {
        self.status.is_some() || self.assigned_operator.is_some()
    }

    pub fn apply(self, request: &mut ServiceRequest) {
        if let Some(status) = self.status {
            request.status = status;
        }
        if let Some(operator_id) = self.assigned_operator {
            request.assigned_operator = Some(operator_id);
        }
        if let Some(crop) = self.crop {
            request.crop = crop;
        }
        if let Some(acres) = self.acres {
            request.acres = acres;
        }
        if let Some(date) = self.preferred_date {
            request.preferred_date = date;
        }
        if let Some(phone) = self.farmer_phone {
            request.farmer_phone = phone;
        }
        if let Some(pincode) = self.pincode {
            request.location.pincode = Some(pincode);
        }
        if let Some(village) = self.village {
            request.location.village = Some(village);
        }
        if let Some(district) = self.district {
            request.location.district = Some(district);
        }
        if let Some(address) = self.address {
            request.location.address = Some(address);
        }
        request.updated_at = Utc::now();
    }
}
