use crate::catalog::{Catalog, Service};
use crate::error::CalculationError;
use crate::rate::{
    apply_supplements, evaluate, RateCalculationDetails, SupplementFees, SupplementOptions,
    ZoneContext,
};
use crate::region::{
    resolve_destination_type, resolve_region_type, DestinationType, MailCategory, MailType,
    RegionType,
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, warn};

/// A single quote request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostageRequest {
    pub mail_type: MailType,
    pub from: String,
    pub to: String,
    /// Grams.
    pub weight: Decimal,
    pub category: Option<MailCategory>,
    pub supplements: SupplementOptions,
}

impl PostageRequest {
    pub fn new(mail_type: MailType, from: &str, to: &str, weight: Decimal) -> Self {
        PostageRequest {
            mail_type,
            from: from.to_string(),
            to: to.to_string(),
            weight,
            category: None,
            supplements: SupplementOptions::default(),
        }
    }

    pub fn with_category(mut self, category: MailCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn registered(mut self) -> Self {
        self.supplements.registered = true;
        self
    }

    pub fn with_package_value(mut self, value: Decimal) -> Self {
        self.supplements.package_value = Some(value);
        self
    }

    pub fn with_discount(mut self, index: usize) -> Self {
        self.supplements.discount_index = Some(index);
        self
    }

    pub fn with_stamp_discount(mut self, percent: Decimal) -> Self {
        self.supplements.stamp_discount_percent = Some(percent);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalculationResult {
    pub service_key: String,
    pub currency: String,
    pub destination_type: DestinationType,
    pub category: Option<MailCategory>,
    /// Most specific documentation rule for the route, if the catalog has one.
    pub rule_id: Option<String>,
    pub details: RateCalculationDetails,
    pub supplements: SupplementFees,
}

impl CalculationResult {
    pub fn final_price(&self) -> Decimal {
        self.supplements.final_price()
    }
}

fn matching_rule(
    catalog: &Catalog,
    service: &Service,
    destination: DestinationType,
    mail_type: MailType,
) -> Option<String> {
    [
        format!("{}_{}_{}", service.key, destination, mail_type),
        format!("{}_{}", service.key, destination),
        service.key.clone(),
    ]
    .into_iter()
    .find(|id| catalog.rule(id).is_some())
}

/// Quote postage for `request` against `catalog`.
///
/// Pure: the same catalog and request always give the same answer.
pub fn calculate_postage(
    catalog: &Catalog,
    request: &PostageRequest,
) -> Result<CalculationResult, CalculationError> {
    let result = quote(catalog, request);
    match &result {
        Ok(r) => debug!(total = %r.final_price(), rule = ?r.rule_id, "postage calculated"),
        Err(CalculationError::Calculation) => warn!(
            mail_type = %request.mail_type,
            from = %request.from,
            to = %request.to,
            weight = %request.weight,
            catalog = catalog.version(),
            "catalog produced no price"
        ),
        Err(e) => debug!(kind = e.kind(), "postage rejected"),
    }
    result
}

fn quote(catalog: &Catalog, request: &PostageRequest) -> Result<CalculationResult, CalculationError> {
    let origin = resolve_region_type(&request.from);
    if origin == RegionType::Unrecognized {
        return Err(CalculationError::Service);
    }
    let service = catalog.service(origin).ok_or(CalculationError::Service)?;

    if request.weight < Decimal::ZERO {
        return Err(CalculationError::Weight);
    }

    let destination = resolve_destination_type(origin, &request.to, catalog.policy().classifier());
    debug!(%origin, to = %request.to, %destination, "route classified");
    let table = service
        .destination(destination)
        .ok_or(CalculationError::Route)?;

    let slot = table
        .rate(request.mail_type)
        .ok_or(CalculationError::MailType)?;
    let rate = slot.resolve(request.category)?;
    debug!(rate = rate.type_name(), "rate selected");

    let details = if rate.is_zonal() {
        let zone = catalog
            .zone_resolver()
            .resolve_zone(&request.from, &request.to, request.category, request.mail_type)
            .map_err(|cause| {
                debug!(%cause, "zone resolution failed");
                CalculationError::from(cause)
            })?;
        let description = service.zone_descriptions(destination).and_then(|d| {
            d.describe(request.category, request.mail_type.letter_class(), zone)
        });
        evaluate(rate, request.weight, Some(ZoneContext { zone, description }))?
    } else {
        evaluate(rate, request.weight, None)?
    };

    let supplements = apply_supplements(
        details.total_price,
        rate,
        &table.rates,
        table.insurance.as_ref(),
        request.category,
        &request.supplements,
    )?;

    Ok(CalculationResult {
        service_key: service.key.clone(),
        currency: service.currency.clone(),
        destination_type: destination,
        category: request.category,
        rule_id: matching_rule(catalog, service, destination, request.mail_type),
        details,
        supplements,
    })
}
