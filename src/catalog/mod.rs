//! Immutable postal catalog: rate tables, regions and province zones.

pub mod legacy;
pub mod source;

pub use source::{CatalogSource, EmbeddedCatalog, FileCatalog};

use crate::error::{Error, Result};
use crate::rate::RateSlot;
use crate::region::{
    ClassifierPolicy, DestinationType, LetterClass, MailCategory, MailType, RegionCatalog,
    RegionType,
};
use crate::sha256_digest;
use crate::zone::{ProvinceZoneTable, ZoneResolver};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::info;

pub(crate) const BUILTIN_CANONICAL: &str = include_str!("../../data/catalog_v2.json");
pub(crate) const BUILTIN_LEGACY: &str = include_str!("../../data/legacy/rates_v1.json");
pub(crate) const BUILTIN_REGIONS: &str = include_str!("../../data/regions.json");
pub(crate) const BUILTIN_PROVINCES: &str = include_str!("../../data/mainland_zones.json");

/// On-disk layout of a rate catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSchema {
    #[default]
    Canonical,
    Legacy,
}

impl CatalogSchema {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogSchema::Canonical => "canonical",
            CatalogSchema::Legacy => "legacy",
        }
    }
}

impl fmt::Display for CatalogSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CatalogSchema {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "canonical" | "v2" => Ok(CatalogSchema::Canonical),
            "legacy" | "v1" => Ok(CatalogSchema::Legacy),
            other => Err(Error::Config(format!("unknown catalog schema: {}", other))),
        }
    }
}

/// Behaviour that differs between catalog revisions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogPolicy {
    /// Macau -> Taiwan routes use their own `regional_tw` table.
    #[serde(default)]
    pub regional_tw: bool,
    /// Zone for mainland province pairs missing from the adjacency table.
    /// `None` makes such routes fail.
    #[serde(default)]
    pub unmapped_province_zone: Option<u32>,
}

impl CatalogPolicy {
    pub fn classifier(&self) -> ClassifierPolicy {
        ClassifierPolicy {
            regional_tw: self.regional_tw,
        }
    }
}

/// Rate slots for one destination type of a service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DestinationTable {
    pub rates: BTreeMap<MailType, RateSlot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insurance: Option<RateSlot>,
}

impl DestinationTable {
    pub fn rate(&self, mail_type: MailType) -> Option<&RateSlot> {
        self.rates.get(&mail_type)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryZoneDescriptions {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub zones: BTreeMap<u32, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub letter: BTreeMap<u32, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub other: BTreeMap<u32, String>,
}

/// Display text for zone numbers of one destination type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneDescriptions {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub zones: BTreeMap<u32, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub by_category: BTreeMap<MailCategory, CategoryZoneDescriptions>,
}

impl ZoneDescriptions {
    /// Most specific text for a zone: category and letter class, then
    /// category, then the flat table.
    pub fn describe(
        &self,
        category: Option<MailCategory>,
        class: LetterClass,
        zone: u32,
    ) -> Option<&str> {
        let by_category = category.and_then(|c| self.by_category.get(&c)).and_then(|d| {
            let by_class = match class {
                LetterClass::Letter => &d.letter,
                LetterClass::Other => &d.other,
            };
            by_class.get(&zone).or_else(|| d.zones.get(&zone))
        });
        by_category
            .or_else(|| self.zones.get(&zone))
            .map(String::as_str)
    }
}

/// One postal administration's offering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub currency: String,
    pub destinations: BTreeMap<DestinationType, DestinationTable>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub zone_descriptions: BTreeMap<DestinationType, ZoneDescriptions>,
}

impl Service {
    pub fn destination(&self, destination: DestinationType) -> Option<&DestinationTable> {
        self.destinations.get(&destination)
    }

    pub fn zone_descriptions(&self, destination: DestinationType) -> Option<&ZoneDescriptions> {
        self.zone_descriptions.get(&destination)
    }
}

/// Documentation reference for a published tariff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateRule {
    pub name: String,
    pub url: String,
}

/// Rate half of a catalog, as read from one rate file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateCatalog {
    pub version: String,
    #[serde(default)]
    pub policy: CatalogPolicy,
    pub services: BTreeMap<RegionType, Service>,
    #[serde(default)]
    pub rules: BTreeMap<String, RateRule>,
}

impl RateCatalog {
    pub fn parse(schema: CatalogSchema, json: &str) -> Result<Self> {
        match schema {
            CatalogSchema::Canonical => serde_json::from_str(json)
                .map_err(|e| Error::Catalog(format!("invalid rate catalog: {}", e))),
            CatalogSchema::Legacy => legacy::parse(json),
        }
    }

    /// Give Macau its `regional_tw` table: the regional table with the
    /// explicit `regional_tw` entries laid over it.
    fn materialize_regional_tw(&mut self) {
        for (region, service) in self.services.iter_mut() {
            let explicit = service.destinations.remove(&DestinationType::RegionalTw);
            if explicit.is_none() && *region != RegionType::Mo {
                continue;
            }
            let mut table = service
                .destinations
                .get(&DestinationType::Regional)
                .cloned()
                .unwrap_or_default();
            if let Some(explicit) = explicit {
                table.rates.extend(explicit.rates);
                if explicit.insurance.is_some() {
                    table.insurance = explicit.insurance;
                }
            }
            if !table.rates.is_empty() {
                service.destinations.insert(DestinationType::RegionalTw, table);
            }
        }
    }
}

/// Everything a quote is computed against. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub schema: CatalogSchema,
    pub rates: RateCatalog,
    pub regions: RegionCatalog,
    pub provinces: ProvinceZoneTable,
    /// Hex SHA-256 of the raw rate file.
    pub fingerprint: String,
}

impl Catalog {
    pub fn load(
        schema: CatalogSchema,
        rates_json: &str,
        regions: RegionCatalog,
        provinces: ProvinceZoneTable,
    ) -> Result<Self> {
        let mut rates = RateCatalog::parse(schema, rates_json)?;
        if rates.policy.regional_tw {
            rates.materialize_regional_tw();
        }
        let fingerprint = hex::encode(sha256_digest(rates_json.as_bytes()));

        info!(
            version = %rates.version,
            %schema,
            services = rates.services.len(),
            regions = regions.len(),
            "catalog loaded"
        );

        Ok(Catalog {
            schema,
            rates,
            regions,
            provinces,
            fingerprint,
        })
    }

    /// One of the catalogs compiled into the crate.
    pub fn builtin(schema: CatalogSchema) -> Result<Self> {
        let rates_json = match schema {
            CatalogSchema::Canonical => BUILTIN_CANONICAL,
            CatalogSchema::Legacy => BUILTIN_LEGACY,
        };
        Catalog::load(
            schema,
            rates_json,
            RegionCatalog::from_json(BUILTIN_REGIONS)?,
            ProvinceZoneTable::from_json(BUILTIN_PROVINCES)?,
        )
    }

    pub fn version(&self) -> &str {
        &self.rates.version
    }

    pub fn policy(&self) -> CatalogPolicy {
        self.rates.policy
    }

    pub fn service(&self, region: RegionType) -> Option<&Service> {
        self.rates.services.get(&region)
    }

    pub fn rule(&self, id: &str) -> Option<&RateRule> {
        self.rates.rules.get(id)
    }

    pub fn zone_resolver(&self) -> ZoneResolver<'_> {
        ZoneResolver::new(
            &self.regions,
            &self.provinces,
            self.rates.policy.unmapped_province_zone,
        )
    }
}
