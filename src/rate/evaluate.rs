use crate::error::CalculationError;
use crate::rate::{FixedRate, Rate, RateTier, SteppedRate, TieredRate, ZonalRate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

/// How the price was actually produced. A flat band inside a stepped rate
/// reports `Tiered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateKind {
    Fixed,
    Tiered,
    Stepped,
}

/// Itemized breakdown of an evaluated rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateCalculationDetails {
    pub rate_type: RateKind,
    pub total_price: Decimal,
    pub base_weight: Option<Decimal>,
    pub base_price: Option<Decimal>,
    pub min_weight: Option<Decimal>,
    pub max_weight: Option<Decimal>,
    pub additional_weight: Option<Decimal>,
    pub additional_steps: u64,
    pub step_min_weight: Option<Decimal>,
    pub step_max_weight: Option<Decimal>,
    pub weight_step: Option<Decimal>,
    pub additional_price: Option<Decimal>,
    pub zone: Option<u32>,
    pub zone_description: Option<String>,
}

impl RateCalculationDetails {
    fn flat(rate_type: RateKind, total_price: Decimal) -> Self {
        RateCalculationDetails {
            rate_type,
            total_price,
            base_weight: None,
            base_price: Some(total_price),
            min_weight: None,
            max_weight: None,
            additional_weight: None,
            additional_steps: 0,
            step_min_weight: None,
            step_max_weight: None,
            weight_step: None,
            additional_price: None,
            zone: None,
            zone_description: None,
        }
    }
}

/// Zone a zonal rate is evaluated in, with optional display text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneContext<'a> {
    pub zone: u32,
    pub description: Option<&'a str>,
}

/// Evaluate `rate` at `weight` grams.
///
/// `weight` is the package value when evaluating an insurance rate.
pub fn evaluate(
    rate: &Rate,
    weight: Decimal,
    zone: Option<ZoneContext<'_>>,
) -> Result<RateCalculationDetails, CalculationError> {
    if weight < Decimal::ZERO {
        return Err(CalculationError::Weight);
    }

    match rate {
        Rate::Fixed(r) => evaluate_fixed(r, weight),
        Rate::Tiered(r) => evaluate_tiered(r, weight),
        Rate::Stepped(r) => evaluate_stepped(r, weight),
        Rate::Zonal(r) => evaluate_zonal(r, weight, zone),
    }
}

fn exceeds(weight: Decimal, max: Option<Decimal>) -> bool {
    max.map_or(false, |max| weight > max)
}

fn evaluate_fixed(rate: &FixedRate, weight: Decimal) -> Result<RateCalculationDetails, CalculationError> {
    if exceeds(weight, rate.max_weight) {
        return Err(CalculationError::Weight);
    }
    let mut details = RateCalculationDetails::flat(RateKind::Fixed, rate.price);
    details.max_weight = rate.max_weight;
    Ok(details)
}

fn evaluate_tiered(rate: &TieredRate, weight: Decimal) -> Result<RateCalculationDetails, CalculationError> {
    let idx = rate
        .tiers
        .iter()
        .position(|t| t.max_weight >= weight)
        .ok_or(CalculationError::Weight)?;
    let tier = rate.tiers[idx];

    let mut details = RateCalculationDetails::flat(RateKind::Tiered, tier.price);
    details.min_weight = idx
        .checked_sub(1)
        .map(|prev| rate.tiers[prev].max_weight + Decimal::ONE);
    details.max_weight = Some(tier.max_weight);
    Ok(details)
}

fn evaluate_stepped(rate: &SteppedRate, weight: Decimal) -> Result<RateCalculationDetails, CalculationError> {
    if rate.tiers.is_empty() {
        warn!("stepped rate has no tiers");
        return Err(CalculationError::Calculation);
    }
    if exceeds(weight, rate.max_weight) {
        return Err(CalculationError::Weight);
    }

    // A band runs up to the next band's base weight; the last one to the
    // rate's ceiling, or without bound.
    let upper = |idx: usize| -> Option<Decimal> {
        rate.tiers
            .get(idx + 1)
            .map(RateTier::effective_base_weight)
            .or(rate.max_weight)
    };

    let idx = (0..rate.tiers.len())
        .find(|&i| upper(i).map_or(true, |limit| weight <= limit))
        .ok_or(CalculationError::Weight)?;

    let mut details = tier_details(&rate.tiers[idx], weight)?;
    details.max_weight = upper(idx);
    if details.rate_type == RateKind::Tiered {
        details.min_weight = idx
            .checked_sub(1)
            .map(|prev| rate.tiers[prev].effective_base_weight());
    }
    Ok(details)
}

fn evaluate_zonal(
    rate: &ZonalRate,
    weight: Decimal,
    zone: Option<ZoneContext<'_>>,
) -> Result<RateCalculationDetails, CalculationError> {
    let Some(ctx) = zone else {
        warn!("zonal rate evaluated without a zone");
        return Err(CalculationError::Calculation);
    };
    let tier = rate.zone(ctx.zone).ok_or(CalculationError::Route)?;

    if exceeds(weight, tier.max_weight) || exceeds(weight, rate.max_weight) {
        return Err(CalculationError::Weight);
    }

    let mut details = tier_details(&tier.as_tier(), weight)?;
    details.max_weight = tier.max_weight.or(rate.max_weight);
    details.zone = Some(ctx.zone);
    details.zone_description = ctx.description.map(str::to_string);
    Ok(details)
}

/// Price a single band: metered past its base weight when it has a step and
/// a per-step price, flat otherwise.
fn tier_details(tier: &RateTier, weight: Decimal) -> Result<RateCalculationDetails, CalculationError> {
    let (step, additional_price) = match (tier.weight_step, tier.additional_price) {
        (Some(step), Some(price)) if step > Decimal::ZERO && !price.is_zero() => (step, price),
        _ => {
            let mut details =
                RateCalculationDetails::flat(RateKind::Tiered, tier.base_price.unwrap_or_default());
            details.base_weight = Some(tier.effective_base_weight());
            return Ok(details);
        }
    };

    let base_weight = tier.effective_base_weight();
    let base_price = tier.base_price.unwrap_or(additional_price);
    let excess = weight
        .checked_sub(base_weight)
        .ok_or_else(|| out_of_range(weight, step))?
        .max(Decimal::ZERO);

    let steps = excess
        .checked_div(step)
        .ok_or_else(|| out_of_range(weight, step))?
        .ceil();
    let additional_steps = steps.to_u64().ok_or_else(|| out_of_range(weight, step))?;

    let total_price = steps
        .checked_mul(additional_price)
        .and_then(|extra| extra.checked_add(base_price))
        .ok_or_else(|| out_of_range(weight, step))?;

    let (step_min_weight, step_max_weight) = if additional_steps > 0 {
        (step.checked_mul(steps - Decimal::ONE), step.checked_mul(steps))
    } else {
        (None, None)
    };

    Ok(RateCalculationDetails {
        rate_type: RateKind::Stepped,
        total_price,
        base_weight: Some(base_weight),
        base_price: Some(base_price),
        min_weight: None,
        max_weight: None,
        additional_weight: Some(excess),
        additional_steps,
        step_min_weight,
        step_max_weight,
        weight_step: Some(step),
        additional_price: Some(additional_price),
        zone: None,
        zone_description: None,
    })
}

/// Weight too large for the band's arithmetic.
fn out_of_range(weight: Decimal, step: Decimal) -> CalculationError {
    warn!(%weight, %step, "weight overflows step pricing");
    CalculationError::Weight
}
