use crate::error::CalculationError;
use crate::rate::{evaluate, Rate, RateSlot};
use crate::region::{MailCategory, MailType};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Optional extras requested with a quote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupplementOptions {
    pub registered: bool,
    pub package_value: Option<Decimal>,
    pub discount_index: Option<usize>,
    /// Share of the price still paid with discounted stamps, 0 to 100.
    /// `Some(0)` makes the item free; use `None` for no stamp discount.
    pub stamp_discount_percent: Option<Decimal>,
}

/// Itemized fees on top of the evaluated base price.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SupplementFees {
    /// Base price plus registration and insurance, before any discount.
    pub original_price: Decimal,
    pub registration_fee: Option<Decimal>,
    pub insurance_commission: Option<Decimal>,
    pub insurance_fee: Option<Decimal>,
    pub rule_discount_name: Option<String>,
    pub rule_discount: Option<Decimal>,
    pub stamp_discount: Option<Decimal>,
    pub discounted_price: Option<Decimal>,
}

impl SupplementFees {
    pub fn final_price(&self) -> Decimal {
        self.discounted_price.unwrap_or(self.original_price)
    }
}

fn percent_off(amount: Decimal, price_percent: Decimal) -> Result<Decimal, CalculationError> {
    HUNDRED
        .checked_sub(price_percent)
        .and_then(|off| amount.checked_mul(off))
        .and_then(|scaled| scaled.checked_div(HUNDRED))
        .ok_or_else(|| {
            warn!(%amount, %price_percent, "discount overflows");
            CalculationError::Calculation
        })
}

fn checked_total(price: Decimal, fee: Decimal) -> Result<Decimal, CalculationError> {
    price.checked_add(fee).ok_or_else(|| {
        warn!(%price, %fee, "supplement total overflows");
        CalculationError::Calculation
    })
}

fn valid_percent(percent: Decimal) -> bool {
    (Decimal::ZERO..=HUNDRED).contains(&percent)
}

/// Registration fee for `rate`, or the route's letter fee when the rate has none.
fn registration_fee(
    rate: &Rate,
    siblings: &BTreeMap<MailType, RateSlot>,
    category: Option<MailCategory>,
) -> Option<Decimal> {
    rate.registration_fee().or_else(|| {
        siblings
            .get(&MailType::Letter)
            .and_then(|slot| slot.resolve(category).ok())
            .and_then(Rate::registration_fee)
    })
}

/// Layer registration, insurance and discounts onto `base_price`.
///
/// Registration and insurance accumulate into the original price. The rule
/// discount applies to that total and the stamp discount to whatever the rule
/// discount left.
pub fn apply_supplements(
    base_price: Decimal,
    rate: &Rate,
    siblings: &BTreeMap<MailType, RateSlot>,
    insurance: Option<&RateSlot>,
    category: Option<MailCategory>,
    opts: &SupplementOptions,
) -> Result<SupplementFees, CalculationError> {
    if let Some(percent) = opts.stamp_discount_percent {
        if !valid_percent(percent) {
            debug!(%percent, "stamp percent outside 0..=100");
            return Err(CalculationError::Calculation);
        }
    }

    let mut fees = SupplementFees {
        original_price: base_price,
        ..SupplementFees::default()
    };

    if opts.registered {
        match registration_fee(rate, siblings, category) {
            Some(fee) => {
                fees.registration_fee = Some(fee);
                fees.original_price = checked_total(fees.original_price, fee)?;
            }
            None => warn!("registration requested but route defines no fee"),
        }
    }

    if let Some(value) = opts.package_value {
        if value < Decimal::ZERO {
            return Err(CalculationError::Weight);
        }
        match insurance {
            Some(slot) if value > Decimal::ZERO => {
                let insurance_rate = slot.resolve(category)?;
                let commission = insurance_rate.registration_fee().unwrap_or_default();
                let fee = evaluate(insurance_rate, value, None)?.total_price;
                debug!(%value, %commission, %fee, "insurance evaluated");
                fees.insurance_commission = Some(commission);
                fees.insurance_fee = Some(fee);
                fees.original_price =
                    checked_total(checked_total(fees.original_price, commission)?, fee)?;
            }
            Some(_) => {}
            None => debug!("route offers no insurance"),
        }
    }

    if let Some(discount) = opts.discount_index.and_then(|i| rate.discounts().get(i)) {
        if !valid_percent(discount.price_percent) {
            warn!(name = %discount.name, percent = %discount.price_percent, "discount outside 0..=100");
            return Err(CalculationError::Calculation);
        }
        let amount = percent_off(fees.original_price, discount.price_percent)?;
        fees.rule_discount_name = Some(discount.name.clone());
        fees.rule_discount = Some(amount);
        fees.discounted_price = Some(fees.original_price - amount);
    }

    if let Some(percent) = opts.stamp_discount_percent.filter(|p| *p != HUNDRED) {
        let running = fees.discounted_price.unwrap_or(fees.original_price);
        let amount = percent_off(running, percent)?;
        fees.stamp_discount = Some(amount);
        fees.discounted_price = Some(running - amount);
    }

    Ok(fees)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate::{CategoryRates, Discount, FixedRate, RateTier, SteppedRate};
    use rust_decimal_macros::dec;

    fn fixed(price: Decimal, registration_fee: Option<Decimal>) -> Rate {
        Rate::Fixed(FixedRate {
            price,
            max_weight: None,
            registration_fee,
            discounts: vec![Discount {
                name: "bulk".to_string(),
                price_percent: dec!(90),
            }],
        })
    }

    fn insurance() -> RateSlot {
        RateSlot::Single(Rate::Stepped(SteppedRate {
            tiers: vec![RateTier {
                weight_step: Some(dec!(100)),
                additional_price: Some(dec!(1)),
                ..RateTier::default()
            }],
            max_weight: Some(dec!(1000)),
            registration_fee: Some(dec!(1)),
            discounts: vec![],
        }))
    }

    fn siblings() -> BTreeMap<MailType, RateSlot> {
        let mut map = BTreeMap::new();
        map.insert(
            MailType::Letter,
            RateSlot::ByCategory(CategoryRates {
                air: Some(fixed(dec!(5), Some(dec!(16)))),
                surface: Some(fixed(dec!(3), Some(dec!(12)))),
                ..CategoryRates::default()
            }),
        );
        map
    }

    #[test]
    fn test_no_options_passes_price_through() {
        let rate = fixed(dec!(1.2), None);
        let fees = apply_supplements(
            dec!(1.2),
            &rate,
            &BTreeMap::new(),
            None,
            None,
            &SupplementOptions::default(),
        )
        .unwrap();
        assert_eq!(fees.original_price, dec!(1.2));
        assert_eq!(fees.discounted_price, None);
        assert_eq!(fees.final_price(), dec!(1.2));
    }

    #[test]
    fn test_registration_uses_own_fee() {
        let rate = fixed(dec!(1.2), Some(dec!(3)));
        let opts = SupplementOptions { registered: true, ..Default::default() };
        let fees = apply_supplements(dec!(1.2), &rate, &siblings(), None, None, &opts).unwrap();
        assert_eq!(fees.registration_fee, Some(dec!(3)));
        assert_eq!(fees.original_price, dec!(4.2));
    }

    #[test]
    fn test_registration_falls_back_to_letter_fee_for_category() {
        let rate = fixed(dec!(7), None);
        let opts = SupplementOptions { registered: true, ..Default::default() };
        let fees = apply_supplements(
            dec!(7),
            &rate,
            &siblings(),
            None,
            Some(MailCategory::Surface),
            &opts,
        )
        .unwrap();
        assert_eq!(fees.registration_fee, Some(dec!(12)));
        assert_eq!(fees.original_price, dec!(19));
    }

    #[test]
    fn test_registration_without_any_fee_is_skipped() {
        let rate = fixed(dec!(7), None);
        let opts = SupplementOptions { registered: true, ..Default::default() };
        let fees = apply_supplements(dec!(7), &rate, &BTreeMap::new(), None, None, &opts).unwrap();
        assert_eq!(fees.registration_fee, None);
        assert_eq!(fees.original_price, dec!(7));
    }

    #[test]
    fn test_insurance_adds_commission_and_fee() {
        let rate = fixed(dec!(10), None);
        let slot = insurance();
        let opts = SupplementOptions {
            package_value: Some(dec!(250)),
            ..Default::default()
        };
        let fees = apply_supplements(dec!(10), &rate, &siblings(), Some(&slot), None, &opts).unwrap();
        assert_eq!(fees.insurance_commission, Some(dec!(1)));
        assert_eq!(fees.insurance_fee, Some(dec!(3)));
        assert_eq!(fees.original_price, dec!(14));
    }

    #[test]
    fn test_insurance_errors_propagate() {
        let rate = fixed(dec!(10), None);
        let slot = insurance();
        let over = SupplementOptions {
            package_value: Some(dec!(1500)),
            ..Default::default()
        };
        assert_eq!(
            apply_supplements(dec!(10), &rate, &siblings(), Some(&slot), None, &over),
            Err(CalculationError::Weight)
        );

        let negative = SupplementOptions {
            package_value: Some(dec!(-5)),
            ..Default::default()
        };
        assert_eq!(
            apply_supplements(dec!(10), &rate, &siblings(), Some(&slot), None, &negative),
            Err(CalculationError::Weight)
        );
    }

    #[test]
    fn test_zero_value_skips_insurance() {
        let rate = fixed(dec!(10), None);
        let slot = insurance();
        let opts = SupplementOptions {
            package_value: Some(Decimal::ZERO),
            ..Default::default()
        };
        let fees = apply_supplements(dec!(10), &rate, &siblings(), Some(&slot), None, &opts).unwrap();
        assert_eq!(fees.insurance_fee, None);
        assert_eq!(fees.original_price, dec!(10));
    }

    #[test]
    fn test_discounts_compound_in_order() {
        let rate = fixed(dec!(10), Some(dec!(10)));
        let opts = SupplementOptions {
            registered: true,
            discount_index: Some(0),
            stamp_discount_percent: Some(dec!(50)),
            ..Default::default()
        };
        let fees = apply_supplements(dec!(10), &rate, &siblings(), None, None, &opts).unwrap();
        assert_eq!(fees.original_price, dec!(20));
        assert_eq!(fees.rule_discount_name.as_deref(), Some("bulk"));
        assert_eq!(fees.rule_discount, Some(dec!(2)));
        assert_eq!(fees.stamp_discount, Some(dec!(9)));
        assert_eq!(fees.discounted_price, Some(dec!(9)));
        assert_eq!(fees.final_price(), dec!(9));
    }

    #[test]
    fn test_stamp_discount_alone_seeds_from_original() {
        let rate = fixed(dec!(8), None);
        let opts = SupplementOptions {
            stamp_discount_percent: Some(dec!(75)),
            ..Default::default()
        };
        let fees = apply_supplements(dec!(8), &rate, &siblings(), None, None, &opts).unwrap();
        assert_eq!(fees.rule_discount, None);
        assert_eq!(fees.stamp_discount, Some(dec!(2)));
        assert_eq!(fees.final_price(), dec!(6));
    }

    #[test]
    fn test_full_price_stamp_and_unknown_discount_are_ignored() {
        let rate = fixed(dec!(8), None);
        let opts = SupplementOptions {
            discount_index: Some(3),
            stamp_discount_percent: Some(dec!(100)),
            ..Default::default()
        };
        let fees = apply_supplements(dec!(8), &rate, &siblings(), None, None, &opts).unwrap();
        assert_eq!(fees.discounted_price, None);
        assert_eq!(fees.stamp_discount, None);
    }

    #[test]
    fn test_stamp_percent_outside_range_is_rejected() {
        let rate = fixed(dec!(8), None);
        for percent in [dec!(250), dec!(-1), Decimal::MIN, Decimal::MAX] {
            let opts = SupplementOptions {
                stamp_discount_percent: Some(percent),
                ..Default::default()
            };
            assert_eq!(
                apply_supplements(dec!(8), &rate, &siblings(), None, None, &opts),
                Err(CalculationError::Calculation),
                "{}",
                percent
            );
        }
    }

    #[test]
    fn test_zero_stamp_percent_makes_item_free() {
        let rate = fixed(dec!(8), None);
        let opts = SupplementOptions {
            stamp_discount_percent: Some(dec!(0)),
            ..Default::default()
        };
        let fees = apply_supplements(dec!(8), &rate, &siblings(), None, None, &opts).unwrap();
        assert_eq!(fees.stamp_discount, Some(dec!(8)));
        assert_eq!(fees.final_price(), dec!(0));
    }

    #[test]
    fn test_total_overflow_is_calculation_error() {
        let rate = fixed(Decimal::MAX, Some(dec!(1)));
        let opts = SupplementOptions {
            registered: true,
            ..Default::default()
        };
        assert_eq!(
            apply_supplements(Decimal::MAX, &rate, &siblings(), None, None, &opts),
            Err(CalculationError::Calculation)
        );
    }
}
