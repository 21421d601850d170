use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Province-to-province parcel zones for the mainland.
///
/// Each origin lists its destinations in buckets; the 1-based bucket
/// index is the zone number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvinceZoneTable {
    pub version: String,
    pub provinces: BTreeMap<String, Vec<Vec<String>>>,
}

fn province_code(code: &str) -> &str {
    code.strip_prefix("CN-").unwrap_or(code)
}

impl ProvinceZoneTable {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Catalog(format!("invalid province zone table: {}", e)))
    }

    /// Zone between two provinces, accepting either `CN-XX` or bare `XX` codes.
    ///
    /// Pairs missing from the table resolve to `unmapped`, except a province
    /// to itself which is always local (zone 1).
    pub fn zone_between(&self, from: &str, to: &str, unmapped: Option<u32>) -> Option<u32> {
        let from = province_code(from);
        let to = province_code(to);

        let Some(buckets) = self.provinces.get(from) else {
            return unmapped;
        };

        if let Some(idx) = buckets.iter().position(|b| b.iter().any(|p| p == to)) {
            return Some(idx as u32 + 1);
        }
        if from == to {
            return Some(1);
        }
        unmapped
    }

    pub fn contains(&self, code: &str) -> bool {
        self.provinces.contains_key(province_code(code))
    }

    /// Pairs whose zone differs by direction. Empty for a consistent table.
    pub fn asymmetries(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        for from in self.provinces.keys() {
            for to in self.provinces.keys() {
                if from < to && self.zone_between(from, to, None) != self.zone_between(to, from, None)
                {
                    out.push((from.clone(), to.clone()));
                }
            }
        }
        out
    }
}
