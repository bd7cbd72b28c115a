use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OperatorStatus {
    Idle,
    #[serde(rename = "In-Field")]
    InField,
    #[serde(rename = "Off-Duty")]
    OffDuty,
}

impl OperatorStatus {
    /// Off-duty pilots are never offered for a job, not even as a manual pick.
    pub fn is_active(self) -> bool {
        self != OperatorStatus::OffDuty
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operator {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub status: OperatorStatus,
    pub location: String,
    pub district: Option<String>,
    pub service_pincodes: Vec<String>,
    pub service_villages: Vec<String>,
    pub available_dates: BTreeSet<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Operator {
    pub fn serves_village(&self, village: &str) -> bool {
        self.service_villages
            .iter()
            .any(|served| served.eq_ignore_ascii_case(village))
    }

    pub fn serves_pincode(&self, pincode: &str) -> bool {
        self.service_pincodes.iter().any(|served| served == pincode)
    }

    pub fn in_district(&self, district: &str) -> bool {
        self.district
            .as_deref()
            .is_some_and(|own| own.eq_ignore_ascii_case(district))
    }

    pub fn available_on(&self, date: NaiveDate) -> bool {
        self.available_dates.contains(&date)
    }
}

/// Partial update of an operator's profile and service area. `None` leaves a
/// field untouched, so a `district` that has been set cannot be cleared
/// through a patch, only replaced.
#[derive(Debug, Clone, Default)]
pub struct OperatorPatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub status: Option<OperatorStatus>,
    pub location: Option<String>,
    pub district: Option<String>,
    pub service_pincodes: Option<Vec<String>>,
    pub service_villages: Option<Vec<String>>,
    pub available_dates: Option<BTreeSet<NaiveDate>>,
}

impl OperatorPatch {
    pub fn apply(self, operator: &mut Operator) {
        if let Some(name) = self.name {
            operator.name = name;
        }
        if let Some(phone) = self.phone {
            operator.phone = phone;
        }
        if let Some(status) = self.status {
            operator.status = status;
        }
        if let Some(location) = self.location {
            operator.location = location;
        }
        if let Some(district) = self.district {
            operator.district = Some(district);
        }
        if let Some(pincodes) = self.service_pincodes {
            operator.service_pincodes = pincodes;
        }
        if let Some(villages) = self.service_villages {
            operator.service_villages = villages;
        }
        if let Some(dates) = self.available_dates {
            operator.available_dates = dates;
        }
    }
}
