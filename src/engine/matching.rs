use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::debug;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::farmer::Farmer;
use crate::models::matching::{MatchingResult, Tier};
use crate::models::operator::Operator;
use crate::models::request::ServiceRequest;
use crate::store::{OperatorFilter, RecordStore};

/// Where and when the job has to be flown, after falling back from the
/// request's own fields to the farmer's registered profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchTarget {
    pub village: Option<String>,
    pub pincode: Option<String>,
    pub district: Option<String>,
    pub date: Option<NaiveDate>,
}

impl MatchTarget {
    pub fn resolve(request: &ServiceRequest, farmer: Option<&Farmer>) -> Self {
        let location = &request.location;
        Self {
            village: non_blank(location.village.as_deref())
                .or_else(|| farmer.and_then(|f| non_blank(f.village.as_deref()))),
            pincode: non_blank(location.pincode.as_deref())
                .or_else(|| farmer.and_then(|f| non_blank(f.pincode.as_deref()))),
            district: non_blank(location.district.as_deref())
                .or_else(|| farmer.and_then(|f| non_blank(f.district.as_deref()))),
            date: Some(request.preferred_date),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

struct Signals {
    village: bool,
    pincode: bool,
    district: bool,
    date: bool,
}

impl Signals {
    fn of(operator: &Operator, target: &MatchTarget) -> Self {
        Self {
            village: target
                .village
                .as_deref()
                .is_some_and(|v| operator.serves_village(v)),
            pincode: target
                .pincode
                .as_deref()
                .is_some_and(|p| operator.serves_pincode(p)),
            district: target
                .district
                .as_deref()
                .is_some_and(|d| operator.in_district(d)),
            date: target.date.is_some_and(|d| operator.available_on(d)),
        }
    }

    fn qualifies(&self, tier: Tier) -> bool {
        match tier {
            Tier::VillageAndDate => self.village && self.date,
            Tier::Village => self.village,
            Tier::PincodeAndDate => self.pincode && self.date,
            Tier::Pincode => self.pincode,
            Tier::District => self.district,
            Tier::Manual => true,
        }
    }
}

/// Partitions the roster into the six priority tiers. Each operator lands in
/// the first tier it qualifies for; off-duty operators are dropped. Within a
/// tier the roster order is kept.
pub fn rank_operators(target: &MatchTarget, roster: &[Operator]) -> MatchingResult {
    let candidates: Vec<(&Operator, Signals)> = roster
        .iter()
        .filter(|op| op.status.is_active())
        .map(|op| (op, Signals::of(op, target)))
        .collect();

    let mut result = MatchingResult::default();
    let mut seen: HashSet<Uuid> = HashSet::with_capacity(candidates.len());

    for tier in Tier::ALL {
        for (operator, signals) in &candidates {
            if signals.qualifies(tier) && seen.insert(operator.id) {
                result.tier_mut(tier).push((*operator).clone());
            }
        }
    }

    result
}

pub async fn get_pilot_matches(
    store: &dyn RecordStore,
    request_id: Uuid,
) -> Result<MatchingResult, AppError> {
    let request = store
        .get_request(request_id)
        .await
        .map_err(|err| AppError::from_store("match", request_id, err))?;

    let farmer = store
        .get_farmer_by_phone(&request.farmer_phone)
        .await
        .map_err(|err| AppError::from_store("match", request_id, err))?;

    let target = MatchTarget::resolve(&request, farmer.as_ref());

    let roster = store
        .list_operators(OperatorFilter::active())
        .await
        .map_err(|err| AppError::from_store("match", request_id, err))?;

    let result = rank_operators(&target, &roster);

    debug!(
        request_id = %request_id,
        village = ?target.village,
        pincode = ?target.pincode,
        district = ?target.district,
        candidates = result.total(),
        perfect = result.perfect_matches.len(),
        "pilot matches computed"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashSet};

    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    use super::{MatchTarget, get_pilot_matches, rank_operators};
    use crate::error::AppError;
    use crate::models::farmer::Farmer;
    use crate::models::matching::Tier;
    use crate::models::operator::{Operator, OperatorStatus};
    use crate::models::request::{
        Location, RequestSource, RequestStatus, ServiceRequest,
    };
    use crate::store::{MemoryStore, RecordStore};

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    fn pilot(name: &str) -> Operator {
        Operator {
            id: Uuid::new_v4(),
            name: name.to_string(),
            phone: "9000000000".to_string(),
            status: OperatorStatus::Idle,
            location: "base".to_string(),
            district: None,
            service_pincodes: Vec::new(),
            service_villages: Vec::new(),
            available_dates: BTreeSet::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn with_village(mut op: Operator, village: &str) -> Operator {
        op.service_villages.push(village.to_string());
        op
    }

    fn with_pincode(mut op: Operator, pincode: &str) -> Operator {
        op.service_pincodes.push(pincode.to_string());
        op
    }

    fn with_date(mut op: Operator, raw: &str) -> Operator {
        op.available_dates.insert(date(raw));
        op
    }

    fn with_district(mut op: Operator, district: &str) -> Operator {
        op.district = Some(district.to_string());
        op
    }

    fn with_status(mut op: Operator, status: OperatorStatus) -> Operator {
        op.status = status;
        op
    }

    fn anaikatti_target() -> MatchTarget {
        MatchTarget {
            village: Some("Anaikatti".to_string()),
            pincode: Some("641108".to_string()),
            district: Some("Coimbatore".to_string()),
            date: Some(date("2024-06-10")),
        }
    }

    #[test]
    fn village_pincode_and_off_duty_scenario() {
        let o1 = with_date(with_village(pilot("O1"), "Anaikatti"), "2024-06-10");
        let o2 = with_date(with_pincode(pilot("O2"), "641108"), "2024-06-11");
        let o3 = with_status(with_village(pilot("O3"), "Anaikatti"), OperatorStatus::OffDuty);

        let result = rank_operators(&anaikatti_target(), &[o1.clone(), o2.clone(), o3.clone()]);

        assert_eq!(result.tier_of(o1.id), Some(Tier::VillageAndDate));
        assert_eq!(result.tier_of(o2.id), Some(Tier::Pincode));
        assert_eq!(result.tier_of(o3.id), None);
        assert_eq!(result.total(), 2);
    }

    #[test]
    fn district_match_ignores_case_and_rest_fall_to_manual() {
        let target = MatchTarget {
            village: None,
            pincode: None,
            district: Some("Coimbatore".to_string()),
            date: Some(date("2024-06-10")),
        };
        let o4 = with_district(pilot("O4"), "coimbatore");
        let o5 = with_district(pilot("O5"), "Madurai");

        let result = rank_operators(&target, &[o4.clone(), o5.clone()]);

        assert_eq!(result.tier_of(o4.id), Some(Tier::District));
        assert_eq!(result.tier_of(o5.id), Some(Tier::Manual));
    }

    #[test]
    fn operator_lands_only_in_highest_qualifying_tier() {
        let everything = with_district(
            with_date(
                with_pincode(with_village(pilot("all"), "ANAIKATTI"), "641108"),
                "2024-06-10",
            ),
            "Coimbatore",
        );
        let pincode_and_date = with_date(with_pincode(pilot("pd"), "641108"), "2024-06-10");
        let village_only = with_pincode(with_village(pilot("v"), "anaikatti"), "641108");

        let result = rank_operators(
            &anaikatti_target(),
            &[everything.clone(), pincode_and_date.clone(), village_only.clone()],
        );

        assert_eq!(result.tier_of(everything.id), Some(Tier::VillageAndDate));
        assert_eq!(result.tier_of(village_only.id), Some(Tier::Village));
        assert_eq!(result.tier_of(pincode_and_date.id), Some(Tier::PincodeAndDate));
        assert!(result.pincode_matches.is_empty());
        assert!(result.district_matches.is_empty());
        assert!(result.manual.is_empty());
    }

    #[test]
    fn tiers_partition_the_active_roster() {
        let roster = vec![
            with_village(pilot("a"), "Anaikatti"),
            with_status(with_village(pilot("b"), "Anaikatti"), OperatorStatus::OffDuty),
            with_status(with_pincode(pilot("c"), "641108"), OperatorStatus::InField),
            with_date(pilot("d"), "2024-06-10"),
            with_district(pilot("e"), "COIMBATORE"),
            with_status(pilot("f"), OperatorStatus::OffDuty),
            pilot("g"),
        ];

        let result = rank_operators(&anaikatti_target(), &roster);

        let mut seen = HashSet::new();
        for tier in Tier::ALL {
            for op in result.tier(tier) {
                assert!(seen.insert(op.id), "{} appears twice", op.name);
                assert_ne!(op.status, OperatorStatus::OffDuty);
            }
        }
        let active: HashSet<Uuid> = roster
            .iter()
            .filter(|op| op.status != OperatorStatus::OffDuty)
            .map(|op| op.id)
            .collect();
        assert_eq!(seen, active);
    }

    #[test]
    fn missing_location_fields_skip_their_tiers() {
        let target = MatchTarget {
            date: Some(date("2024-06-10")),
            ..MatchTarget::default()
        };
        let roster = vec![
            with_date(with_village(pilot("v"), "Anaikatti"), "2024-06-10"),
            with_pincode(pilot("p"), "641108"),
        ];

        let result = rank_operators(&target, &roster);

        assert_eq!(result.manual.len(), 2);
        assert_eq!(result.total(), 2);
    }

    #[test]
    fn empty_roster_yields_empty_tiers() {
        let result = rank_operators(&anaikatti_target(), &[]);

        for tier in Tier::ALL {
            assert!(result.tier(tier).is_empty());
        }
    }

    #[test]
    fn roster_order_is_kept_within_a_tier() {
        let names = ["zeta", "alpha", "mid"];
        let roster: Vec<Operator> = names
            .iter()
            .map(|name| with_village(pilot(name), "Anaikatti"))
            .collect();

        let result = rank_operators(&anaikatti_target(), &roster);

        let ranked: Vec<&str> = result
            .village_matches
            .iter()
            .map(|op| op.name.as_str())
            .collect();
        assert_eq!(ranked, names);
    }

    fn request(location: Location) -> ServiceRequest {
        ServiceRequest {
            id: Uuid::new_v4(),
            farmer_phone: "9876543210".to_string(),
            crop: "Paddy".to_string(),
            acres: 3.5,
            preferred_date: date("2024-06-10"),
            location,
            source: RequestSource::SelfService,
            status: RequestStatus::Pending,
            assigned_operator: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn request_fields_take_precedence_over_farmer_profile() {
        let farmer = Farmer {
            id: Uuid::new_v4(),
            name: "Murugan".to_string(),
            phone: "9876543210".to_string(),
            village: Some("Thondamuthur".to_string()),
            pincode: Some("641109".to_string()),
            district: Some("Coimbatore".to_string()),
            address: None,
            created_at: Utc::now(),
        };
        let req = request(Location {
            pincode: Some("641108".to_string()),
            village: Some("  ".to_string()),
            ..Location::default()
        });

        let target = MatchTarget::resolve(&req, Some(&farmer));

        assert_eq!(target.pincode.as_deref(), Some("641108"));
        assert_eq!(target.village.as_deref(), Some("Thondamuthur"));
        assert_eq!(target.district.as_deref(), Some("Coimbatore"));
        assert_eq!(target.date, Some(date("2024-06-10")));
    }

    #[tokio::test]
    async fn unknown_request_is_not_found() {
        let store = MemoryStore::new();

        let err = get_pilot_matches(&store, Uuid::new_v4()).await.unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn matches_use_farmer_profile_when_request_has_no_village() {
        let store = MemoryStore::new();
        store
            .upsert_farmer(Farmer {
                id: Uuid::new_v4(),
                name: "Murugan".to_string(),
                phone: "9876543210".to_string(),
                village: Some("Anaikatti".to_string()),
                pincode: None,
                district: None,
                address: None,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        let local = store
            .insert_operator(with_village(pilot("local"), "anaikatti"))
            .await
            .unwrap();
        let req = store.insert_request(request(Location::default())).await.unwrap();

        let result = get_pilot_matches(&store, req.id).await.unwrap();

        assert_eq!(result.tier_of(local.id), Some(Tier::Village));
    }
}
