//! Canonical rate model shared by every catalog schema.

pub mod evaluate;
pub mod supplement;

pub use evaluate::{evaluate, RateCalculationDetails, RateKind, ZoneContext};
pub use supplement::{apply_supplements, SupplementFees, SupplementOptions};

use crate::error::CalculationError;
use crate::region::MailCategory;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A named percentage of the price actually charged (90 = 10% off).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discount {
    pub name: String,
    pub price_percent: Decimal,
}

/// Pricing function for one mail type on one route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Rate {
    Fixed(FixedRate),
    Tiered(TieredRate),
    Stepped(SteppedRate),
    Zonal(ZonalRate),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedRate {
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_weight: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_fee: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discounts: Vec<Discount>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightTier {
    pub max_weight: Decimal,
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TieredRate {
    pub tiers: Vec<WeightTier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_fee: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discounts: Vec<Discount>,
}

/// One band of a stepped rate.
///
/// A band with both `weight_step` and `additional_price` is metered past its
/// base weight; otherwise it is a flat band priced at `base_price`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateTier {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_weight: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_step: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_price: Option<Decimal>,
}

impl RateTier {
    /// `base_weight`, else `weight_step`, else zero.
    pub fn effective_base_weight(&self) -> Decimal {
        self.base_weight
            .or(self.weight_step)
            .unwrap_or(Decimal::ZERO)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SteppedRate {
    pub tiers: Vec<RateTier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_weight: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_fee: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discounts: Vec<Discount>,
}

/// Tier of a zonal rate for a single zone number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneTier {
    pub zone: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_weight: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_step: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_weight: Option<Decimal>,
}

impl ZoneTier {
    pub fn as_tier(&self) -> RateTier {
        RateTier {
            base_weight: self.base_weight,
            base_price: self.base_price,
            weight_step: self.weight_step,
            additional_price: self.additional_price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZonalRate {
    pub zones: Vec<ZoneTier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_weight: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_fee: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discounts: Vec<Discount>,
}

impl ZonalRate {
    pub fn zone(&self, zone: u32) -> Option<&ZoneTier> {
        self.zones.iter().find(|z| z.zone == zone)
    }
}

impl Rate {
    pub fn registration_fee(&self) -> Option<Decimal> {
        match self {
            Rate::Fixed(r) => r.registration_fee,
            Rate::Tiered(r) => r.registration_fee,
            Rate::Stepped(r) => r.registration_fee,
            Rate::Zonal(r) => r.registration_fee,
        }
    }

    pub fn discounts(&self) -> &[Discount] {
        match self {
            Rate::Fixed(r) => &r.discounts,
            Rate::Tiered(r) => &r.discounts,
            Rate::Stepped(r) => &r.discounts,
            Rate::Zonal(r) => &r.discounts,
        }
    }

    pub fn is_zonal(&self) -> bool {
        matches!(self, Rate::Zonal(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Rate::Fixed(_) => "fixed",
            Rate::Tiered(_) => "tiered",
            Rate::Stepped(_) => "stepped",
            Rate::Zonal(_) => "zonal",
        }
    }
}

/// Rates of one mail type split by delivery category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryRates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sal: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface: Option<Rate>,
}

impl CategoryRates {
    pub fn get(&self, category: MailCategory) -> Option<&Rate> {
        match category {
            MailCategory::Air => self.air.as_ref(),
            MailCategory::Sal => self.sal.as_ref(),
            MailCategory::Surface => self.surface.as_ref(),
        }
    }

    pub fn categories(&self) -> Vec<MailCategory> {
        [MailCategory::Air, MailCategory::Sal, MailCategory::Surface]
            .into_iter()
            .filter(|c| self.get(*c).is_some())
            .collect()
    }
}

/// A catalog entry: one rate, or one rate per delivery category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RateSlot {
    Single(Rate),
    ByCategory(CategoryRates),
}

impl RateSlot {
    /// Pick the rate for a request.
    ///
    /// A category map is narrowed by the requested category, then `default`,
    /// then `air`. Without a category only `default` can answer.
    pub fn resolve(&self, category: Option<MailCategory>) -> Result<&Rate, CalculationError> {
        match self {
            RateSlot::Single(rate) => Ok(rate),
            RateSlot::ByCategory(rates) => match category {
                Some(category) => rates
                    .get(category)
                    .or(rates.default.as_ref())
                    .or(rates.air.as_ref())
                    .ok_or(CalculationError::MailType),
                None => rates.default.as_ref().ok_or(CalculationError::MailCategory),
            },
        }
    }
}
