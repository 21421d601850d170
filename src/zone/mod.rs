pub mod mainland;

pub use mainland::ProvinceZoneTable;

use crate::error::CalculationError;
use crate::region::{resolve_region_type, MailCategory, MailType, RegionCatalog, RegionType};
use thiserror::Error;
use tracing::debug;

/// Why a zone could not be resolved. Callers only see the collapsed
/// [`CalculationError`]; the cause is kept for logs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ZoneError {
    #[error("zonal rate needs a delivery category")]
    MissingCategory,

    #[error("{destination} has no zone record for origin {origin}")]
    NoPostalZone {
        origin: RegionType,
        destination: String,
    },

    #[error("{destination} has no {category} zone for origin {origin}")]
    NoCategoryZone {
        origin: RegionType,
        destination: String,
        category: MailCategory,
    },

    #[error("no province zone between {from} and {to}")]
    UnmappedProvince { from: String, to: String },
}

impl From<ZoneError> for CalculationError {
    fn from(err: ZoneError) -> Self {
        match err {
            ZoneError::MissingCategory => CalculationError::MailCategory,
            _ => CalculationError::Route,
        }
    }
}

/// Maps a route onto the zone number a zonal rate is keyed by.
#[derive(Debug, Clone, Copy)]
pub struct ZoneResolver<'a> {
    regions: &'a RegionCatalog,
    provinces: &'a ProvinceZoneTable,
    unmapped_province_zone: Option<u32>,
}

impl<'a> ZoneResolver<'a> {
    pub fn new(
        regions: &'a RegionCatalog,
        provinces: &'a ProvinceZoneTable,
        unmapped_province_zone: Option<u32>,
    ) -> Self {
        ZoneResolver {
            regions,
            provinces,
            unmapped_province_zone,
        }
    }

    /// Resolve the pricing zone for mail from `from` to `to`.
    ///
    /// Mainland parcels between provinces use the adjacency table. Everything
    /// else reads the destination's per-origin zone record, narrowed by
    /// category and, for split air zones, by letter vs. other mail.
    pub fn resolve_zone(
        &self,
        from: &str,
        to: &str,
        category: Option<MailCategory>,
        mail_type: MailType,
    ) -> Result<u32, ZoneError> {
        let origin = resolve_region_type(from);

        if origin == RegionType::Cn
            && resolve_region_type(to) == RegionType::Cn
            && mail_type == MailType::Parcel
        {
            let zone = self
                .provinces
                .zone_between(from, to, self.unmapped_province_zone)
                .ok_or_else(|| ZoneError::UnmappedProvince {
                    from: from.to_string(),
                    to: to.to_string(),
                })?;
            debug!(from, to, zone, "province zone resolved");
            return Ok(zone);
        }

        let category = category.ok_or(ZoneError::MissingCategory)?;

        let info = self
            .regions
            .postal_zone(origin, to)
            .ok_or_else(|| ZoneError::NoPostalZone {
                origin,
                destination: to.to_string(),
            })?;

        let zone = info
            .for_category(category)
            .map(|value| value.for_class(mail_type.letter_class()))
            .filter(|&zone| zone > 0)
            .ok_or_else(|| ZoneError::NoCategoryZone {
                origin,
                destination: to.to_string(),
                category,
            })?;

        debug!(%origin, to, %category, zone, "postal zone resolved");
        Ok(zone)
    }
}
