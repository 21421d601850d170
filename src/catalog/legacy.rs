//! Reader for the older mail-type-keyed rate tables.
//!
//! Those tables nest `mail type -> destination type -> rate`, spell fields in
//! camelCase, encode single-band steps as `stepped` and zone tables as
//! `region_stepped` with string group keys.

use crate::catalog::{CatalogPolicy, DestinationTable, RateCatalog, RateRule, Service};
use crate::error::{Error, Result};
use crate::rate::{
    CategoryRates, FixedRate, Rate, RateSlot, RateTier, SteppedRate, TieredRate, WeightTier,
    ZonalRate, ZoneTier,
};
use crate::region::{resolve_region_type, DestinationType, MailType, RegionType};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Province pairs missing from the adjacency table were priced as zone 4.
const LEGACY_UNMAPPED_PROVINCE_ZONE: u32 = 4;

#[derive(Deserialize)]
struct LegacyFile {
    version: String,
    services: BTreeMap<String, LegacyService>,
    #[serde(default)]
    rules: BTreeMap<String, RateRule>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyService {
    service_name: String,
    currency: String,
    from_region: String,
    rates: BTreeMap<MailType, BTreeMap<DestinationType, LegacySlot>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LegacySlot {
    Single(LegacyRate),
    ByCategory {
        #[serde(default)]
        default: Option<LegacyRate>,
        #[serde(default)]
        air: Option<LegacyRate>,
        #[serde(default)]
        sal: Option<LegacyRate>,
        #[serde(default)]
        surface: Option<LegacyRate>,
    },
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum LegacyRate {
    Fixed(LegacyFixed),
    Tiered(LegacyTiered),
    Stepped(LegacyStep),
    RegionStepped(LegacyGroups),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyFixed {
    price: Decimal,
    #[serde(default)]
    max_weight: Option<Decimal>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyTier {
    max_weight: Decimal,
    price: Decimal,
}

#[derive(Deserialize)]
struct LegacyTiered {
    tiers: Vec<LegacyTier>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyStep {
    base_price: Decimal,
    additional_price: Decimal,
    weight_step: Decimal,
    #[serde(default)]
    max_weight: Option<Decimal>,
}

#[derive(Deserialize)]
struct LegacyGroups {
    groups: BTreeMap<String, LegacyStep>,
}

impl LegacyRate {
    fn into_rate(self) -> Result<Rate> {
        Ok(match self {
            LegacyRate::Fixed(f) => Rate::Fixed(FixedRate {
                price: f.price,
                max_weight: f.max_weight,
                registration_fee: None,
                discounts: vec![],
            }),
            LegacyRate::Tiered(t) => Rate::Tiered(TieredRate {
                tiers: t
                    .tiers
                    .into_iter()
                    .map(|t| WeightTier {
                        max_weight: t.max_weight,
                        price: t.price,
                    })
                    .collect(),
                registration_fee: None,
                discounts: vec![],
            }),
            // The base weight was implicitly one step.
            LegacyRate::Stepped(s) => Rate::Stepped(SteppedRate {
                tiers: vec![RateTier {
                    base_weight: None,
                    base_price: Some(s.base_price),
                    weight_step: Some(s.weight_step),
                    additional_price: Some(s.additional_price),
                }],
                max_weight: s.max_weight,
                registration_fee: None,
                discounts: vec![],
            }),
            LegacyRate::RegionStepped(g) => {
                let mut zones = g
                    .groups
                    .into_iter()
                    .map(|(key, step)| {
                        let zone = key.parse::<u32>().map_err(|_| {
                            Error::Catalog(format!("zone group key is not a number: {}", key))
                        })?;
                        Ok(ZoneTier {
                            zone,
                            base_weight: None,
                            base_price: Some(step.base_price),
                            weight_step: Some(step.weight_step),
                            additional_price: Some(step.additional_price),
                            max_weight: step.max_weight,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                zones.sort_by_key(|z| z.zone);
                Rate::Zonal(ZonalRate {
                    zones,
                    max_weight: None,
                    registration_fee: None,
                    discounts: vec![],
                })
            }
        })
    }
}

impl LegacySlot {
    fn into_slot(self) -> Result<RateSlot> {
        let convert = |rate: Option<LegacyRate>| rate.map(LegacyRate::into_rate).transpose();
        match self {
            LegacySlot::Single(rate) => Ok(RateSlot::Single(rate.into_rate()?)),
            LegacySlot::ByCategory {
                default,
                air,
                sal,
                surface,
            } => Ok(RateSlot::ByCategory(CategoryRates {
                default: convert(default)?,
                air: convert(air)?,
                sal: convert(sal)?,
                surface: convert(surface)?,
            })),
        }
    }
}

/// Parse a legacy rate file into the canonical model.
pub fn parse(json: &str) -> Result<RateCatalog> {
    let file: LegacyFile = serde_json::from_str(json)
        .map_err(|e| Error::Catalog(format!("invalid legacy rate catalog: {}", e)))?;

    let mut services = BTreeMap::new();
    for (key, legacy) in file.services {
        let region = resolve_region_type(&legacy.from_region);
        if region == RegionType::Unrecognized {
            return Err(Error::Catalog(format!(
                "service {} has unknown origin {}",
                key, legacy.from_region
            )));
        }

        let mut destinations: BTreeMap<DestinationType, DestinationTable> = BTreeMap::new();
        for (mail_type, by_destination) in legacy.rates {
            for (destination, slot) in by_destination {
                destinations
                    .entry(destination)
                    .or_default()
                    .rates
                    .insert(mail_type, slot.into_slot()?);
            }
        }

        let service = Service {
            key: key.clone(),
            name: Some(legacy.service_name),
            currency: legacy.currency,
            destinations,
            zone_descriptions: BTreeMap::new(),
        };
        if services.insert(region, service).is_some() {
            return Err(Error::Catalog(format!(
                "more than one service for origin {}",
                region
            )));
        }
    }

    Ok(RateCatalog {
        version: file.version,
        policy: CatalogPolicy {
            regional_tw: false,
            unmapped_province_zone: Some(LEGACY_UNMAPPED_PROVINCE_ZONE),
        },
        services,
        rules: file.rules,
    })
}
