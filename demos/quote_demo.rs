//! Quotes a handful of routes against both built-in catalogs.
//!
//! Run with `cargo run --example quote_demo`.

use postage_calc::calc::{calculate_postage, PostageRequest};
use postage_calc::catalog::{Catalog, CatalogSchema};
use postage_calc::error::Result;
use postage_calc::logger;
use postage_calc::region::{MailCategory, MailType};
use rust_decimal::Decimal;

fn grams(value: i64) -> Decimal {
    Decimal::from(value)
}

fn main() -> Result<()> {
    logger::init("info");

    let requests = vec![
        PostageRequest::new(MailType::Postcard, "CN-BJ", "CN-SH", grams(15)),
        PostageRequest::new(MailType::Letter, "CN-BJ", "CN-SH", grams(35)).registered(),
        PostageRequest::new(MailType::Letter, "CN-BJ", "US", grams(25))
            .with_category(MailCategory::Air),
        PostageRequest::new(MailType::Parcel, "CN-GD", "CN-XJ", grams(3200)),
        PostageRequest::new(MailType::Letter, "MO", "TW", grams(40)),
        PostageRequest::new(MailType::Letter, "CN-BJ", "HK", grams(15)),
    ];

    for schema in [CatalogSchema::Canonical, CatalogSchema::Legacy] {
        let catalog = Catalog::builtin(schema)?;
        println!("== {} catalog {} ==", schema, catalog.version());

        for request in &requests {
            let route = format!(
                "{} {} -> {} {}g",
                request.mail_type, request.from, request.to, request.weight
            );
            match calculate_postage(&catalog, request) {
                Ok(result) => println!(
                    "{:<40} {} {} ({})",
                    route,
                    result.final_price(),
                    result.currency,
                    result.rule_id.as_deref().unwrap_or("no rule")
                ),
                Err(e) => println!("{:<40} error: {}", route, e.kind()),
            }
        }
    }

    Ok(())
}
