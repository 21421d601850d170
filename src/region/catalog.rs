use crate::error::{Error, Result};
use crate::region::{LetterClass, MailCategory, RegionType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Continent {
    #[serde(rename = "AS")]
    Asia,
    #[serde(rename = "EU")]
    Europe,
    #[serde(rename = "AF")]
    Africa,
    #[serde(rename = "NA")]
    NorthAmerica,
    #[serde(rename = "SA")]
    SouthAmerica,
    #[serde(rename = "OC")]
    Oceania,
    #[serde(rename = "AN")]
    Antarctica,
}

/// A zone number, either shared by all mail or split letters / other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ZoneValue {
    Uniform(u32),
    Split { letter: u32, other: u32 },
}

impl ZoneValue {
    pub fn for_class(&self, class: LetterClass) -> u32 {
        match (self, class) {
            (ZoneValue::Uniform(zone), _) => *zone,
            (ZoneValue::Split { letter, .. }, LetterClass::Letter) => *letter,
            (ZoneValue::Split { other, .. }, LetterClass::Other) => *other,
        }
    }
}

/// Zone numbers a region has from one origin administration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air: Option<ZoneValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sal: Option<ZoneValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface: Option<ZoneValue>,
}

impl ZoneInfo {
    pub fn for_category(&self, category: MailCategory) -> Option<ZoneValue> {
        match category {
            MailCategory::Air => self.air,
            MailCategory::Sal => self.sal,
            MailCategory::Surface => self.surface,
        }
    }
}

/// Per-origin zone assignments of a destination region.
pub type PostalZone = BTreeMap<RegionType, ZoneInfo>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub code: String,
    /// Display names keyed by locale (`zh-CN`, `zh-TW`, `en`).
    pub names: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continent: Option<Continent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_zone: Option<PostalZone>,
}

impl Region {
    /// Localized display name, falling back to English and then the code.
    pub fn name(&self, locale: &str) -> &str {
        self.names
            .get(locale)
            .or_else(|| self.names.get("en"))
            .map(String::as_str)
            .unwrap_or(&self.code)
    }

    pub fn zone_info(&self, origin: RegionType) -> Option<&ZoneInfo> {
        self.postal_zone.as_ref().and_then(|zones| zones.get(&origin))
    }

    pub fn is_province(&self) -> bool {
        self.code.starts_with("CN-")
    }
}

#[derive(Deserialize)]
struct RegionFile {
    regions: Vec<Region>,
}

/// Static region catalog with lookup by code.
#[derive(Debug, Clone, Default)]
pub struct RegionCatalog {
    regions: Vec<Region>,
    index: HashMap<String, usize>,
}

impl RegionCatalog {
    pub fn new(regions: Vec<Region>) -> Result<Self> {
        let mut index = HashMap::with_capacity(regions.len());
        for (i, region) in regions.iter().enumerate() {
            if index.insert(region.code.clone(), i).is_some() {
                return Err(Error::Catalog(format!(
                    "duplicate region code {}",
                    region.code
                )));
            }
        }
        Ok(RegionCatalog { regions, index })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let file: RegionFile = serde_json::from_str(json)
            .map_err(|e| Error::Catalog(format!("invalid region catalog: {}", e)))?;
        RegionCatalog::new(file.regions)
    }

    pub fn get(&self, code: &str) -> Option<&Region> {
        self.index.get(code).map(|&i| &self.regions[i])
    }

    /// Zone record for mail from `origin` to the region `code`, if any.
    pub fn postal_zone(&self, origin: RegionType, code: &str) -> Option<&ZoneInfo> {
        self.get(code).and_then(|region| region.zone_info(origin))
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn provinces(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter().filter(|r| r.is_province())
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
