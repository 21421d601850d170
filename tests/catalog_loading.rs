use postage_calc::calc::{calculate_postage, PostageRequest};
use postage_calc::catalog::{Catalog, CatalogSchema, CatalogSource, FileCatalog};
use postage_calc::config::Config;
use postage_calc::error::{CalculationError, Error};
use postage_calc::rate::RateKind;
use postage_calc::region::{DestinationType, MailCategory, MailType};
use rust_decimal_macros::dec;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const CANONICAL: &str = include_str!("../data/catalog_v2.json");
const LEGACY: &str = include_str!("../data/legacy/rates_v1.json");

fn write_catalog(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn legacy() -> Catalog {
    Catalog::builtin(CatalogSchema::Legacy).unwrap()
}

#[test]
fn test_config_loads_file_catalog() {
    let dir = TempDir::new().unwrap();
    let path = write_catalog(&dir, "rates_v1.json", LEGACY);

    let config = Config::with_catalog(path, CatalogSchema::Legacy);
    let catalog = config.catalog_source().load().unwrap();

    assert_eq!(catalog.schema, CatalogSchema::Legacy);
    assert_eq!(catalog.version(), "2023.11");
    assert_eq!(catalog.fingerprint, legacy().fingerprint);
}

#[test]
fn test_malformed_file_is_catalog_error() {
    let dir = TempDir::new().unwrap();
    let path = write_catalog(&dir, "broken.json", "{\"version\": \"x\", \"services\": ");
    let result = FileCatalog::new(path, CatalogSchema::Canonical).load();
    assert!(matches!(result, Err(Error::Catalog(_))));
}

#[test]
fn test_policy_switches_regional_tw_off() {
    let dir = TempDir::new().unwrap();
    let edited = CANONICAL.replace("\"regional_tw\": true", "\"regional_tw\": false");
    let path = write_catalog(&dir, "rates.json", &edited);
    let catalog = FileCatalog::new(path, CatalogSchema::Canonical).load().unwrap();

    let request = PostageRequest::new(MailType::Letter, "MO", "TW", dec!(40));
    let result = calculate_postage(&catalog, &request).unwrap();
    assert_eq!(result.destination_type, DestinationType::Regional);
    assert_eq!(result.final_price(), dec!(4.0));
}

#[test]
fn test_policy_sets_unmapped_province_zone() {
    let dir = TempDir::new().unwrap();
    let edited = CANONICAL.replace(
        "\"unmapped_province_zone\": null",
        "\"unmapped_province_zone\": 4",
    );
    let path = write_catalog(&dir, "rates.json", &edited);
    let catalog = FileCatalog::new(path, CatalogSchema::Canonical).load().unwrap();
    let strict = Catalog::builtin(CatalogSchema::Canonical).unwrap();

    let request = PostageRequest::new(MailType::Parcel, "CN-ZZ", "CN-BJ", dec!(1500));
    assert_eq!(
        calculate_postage(&strict, &request),
        Err(CalculationError::Route)
    );
    let result = calculate_postage(&catalog, &request).unwrap();
    assert_eq!(result.details.zone, Some(4));
    assert_eq!(result.final_price(), dec!(11));
}

#[test]
fn test_legacy_domestic_letter_matches_canonical() {
    let canonical = Catalog::builtin(CatalogSchema::Canonical).unwrap();
    let legacy = legacy();

    for grams in [dec!(5), dec!(20), dec!(21), dec!(35), dec!(40), dec!(60)] {
        let request = PostageRequest::new(MailType::Letter, "CN-BJ", "CN-SH", grams);
        let old = calculate_postage(&legacy, &request).unwrap();
        let new = calculate_postage(&canonical, &request).unwrap();
        assert_eq!(old.final_price(), new.final_price(), "{}g", grams);
        assert_eq!(old.details.rate_type, RateKind::Stepped);
    }
}

#[test]
fn test_legacy_letter_ceiling() {
    let request = PostageRequest::new(MailType::Letter, "CN-BJ", "CN-SH", dec!(150));
    assert_eq!(
        calculate_postage(&legacy(), &request),
        Err(CalculationError::Weight)
    );
}

#[test]
fn test_legacy_zones_start_at_one_step() {
    let request = PostageRequest::new(MailType::Letter, "CN-BJ", "US", dec!(25))
        .with_category(MailCategory::Air);
    let result = calculate_postage(&legacy(), &request).unwrap();

    assert_eq!(result.details.zone, Some(3));
    assert_eq!(result.details.base_weight, Some(dec!(10)));
    assert_eq!(result.details.additional_steps, 2);
    assert_eq!(result.final_price(), dec!(9.6));
}

#[test]
fn test_legacy_regional_letter_is_uncategorised() {
    let request = PostageRequest::new(MailType::Letter, "CN-BJ", "HK", dec!(15));
    let result = calculate_postage(&legacy(), &request).unwrap();
    assert_eq!(result.details.rate_type, RateKind::Tiered);
    assert_eq!(result.final_price(), dec!(1.5));
}

#[test]
fn test_legacy_has_no_regional_tw_bucket() {
    let request = PostageRequest::new(MailType::Letter, "MO", "TW", dec!(40));
    let result = calculate_postage(&legacy(), &request).unwrap();
    assert_eq!(result.destination_type, DestinationType::Regional);
    assert_eq!(result.final_price(), dec!(4.0));
}

#[test]
fn test_legacy_unmapped_provinces_default_to_zone_four() {
    let catalog = legacy();
    assert_eq!(catalog.policy().unmapped_province_zone, Some(4));
    assert_eq!(
        catalog
            .zone_resolver()
            .resolve_zone("CN-ZZ", "CN-BJ", None, MailType::Parcel),
        Ok(4)
    );
}

#[test]
fn test_legacy_domestic_zonal_small_packet_needs_category() {
    let request = PostageRequest::new(MailType::SmallPacket, "CN-BJ", "CN-SH", dec!(500));
    assert_eq!(
        calculate_postage(&legacy(), &request),
        Err(CalculationError::MailCategory)
    );
}

#[test]
fn test_legacy_rules_carried_over() {
    let catalog = legacy();
    let request = PostageRequest::new(MailType::Postcard, "CN-BJ", "CN-SH", dec!(10));
    let result = calculate_postage(&catalog, &request).unwrap();
    let rule = result.rule_id.as_deref().and_then(|id| catalog.rule(id));
    assert!(rule.is_some());
}
