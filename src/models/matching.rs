use serde::{Deserialize, Serialize};

use crate::models::operator::Operator;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    VillageAndDate,
    Village,
    PincodeAndDate,
    Pincode,
    District,
    Manual,
}

impl Tier {
    /// Highest priority first.
    pub const ALL: [Tier; 6] = [
        Tier::VillageAndDate,
        Tier::Village,
        Tier::PincodeAndDate,
        Tier::Pincode,
        Tier::District,
        Tier::Manual,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Tier::VillageAndDate => "village_and_date",
            Tier::Village => "village",
            Tier::PincodeAndDate => "pincode_and_date",
            Tier::Pincode => "pincode",
            Tier::District => "district",
            Tier::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchingResult {
    pub perfect_matches: Vec<Operator>,
    pub village_matches: Vec<Operator>,
    pub pincode_perfect_matches: Vec<Operator>,
    pub pincode_matches: Vec<Operator>,
    pub district_matches: Vec<Operator>,
    pub manual: Vec<Operator>,
}

impl MatchingResult {
    pub fn tier(&self, tier: Tier) -> &[Operator] {
        match tier {
            Tier::VillageAndDate => &self.perfect_matches,
            Tier::Village => &self.village_matches,
            Tier::PincodeAndDate => &self.pincode_perfect_matches,
            Tier::Pincode => &self.pincode_matches,
            Tier::District => &self.district_matches,
            Tier::Manual => &self.manual,
        }
    }

    pub fn tier_mut(&mut self, tier: Tier) -> &mut Vec<Operator> {
        match tier {
            Tier::VillageAndDate => &mut self.perfect_matches,
            Tier::Village => &mut self.village_matches,
            Tier::PincodeAndDate => &mut self.pincode_perfect_matches,
            Tier::Pincode => &mut self.pincode_matches,
            Tier::District => &mut self.district_matches,
            Tier::Manual => &mut self.manual,
        }
    }

    pub fn total(&self) -> usize {
        Tier::ALL.iter().map(|tier| self.tier(*tier).len()).sum()
    }

    /// The tier an operator landed in, if any.
    pub fn tier_of(&self, operator_id: uuid::Uuid) -> Option<Tier> {
        Tier::ALL
            .into_iter()
            .find(|tier| self.tier(*tier).iter().any(|op| op.id == operator_id))
    }
}
