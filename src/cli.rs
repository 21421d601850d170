use clap::{Parser, Subcommand};
use postage_calc::calc::{calculate_postage, CalculationResult, PostageRequest};
use postage_calc::catalog::{Catalog, CatalogPolicy, RateRule};
use postage_calc::config::Config;
use postage_calc::error::{CalculationError, Error, Result};
use postage_calc::logger;
use postage_calc::region::{
    resolve_destination_type, resolve_region_type, DestinationType, MailCategory, MailType,
    RegionType,
};
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "postage-calc")]
#[command(about = "Postage calculator for mail between mainland China, Taiwan, Hong Kong and Macau")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: "human" or "json"
    #[arg(short, long, default_value = "human")]
    pub format: String,

    /// Rate catalog file (defaults to the built-in catalog)
    #[arg(short, long)]
    pub catalog: Option<String>,

    /// Rate catalog layout: "canonical" or "legacy"
    #[arg(short, long)]
    pub schema: Option<String>,

    /// Region catalog file, used with --catalog
    #[arg(long)]
    pub regions: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Quote postage for one item
    Quote {
        /// letter, postcard, aerogramme, printed_papers, items_for_blind,
        /// small_packet, m_bags, parcel or ems
        mail_type: MailType,

        /// Origin region code (e.g. CN-BJ, TW, HK, MO)
        from: String,

        /// Destination region code
        to: String,

        /// Weight in grams
        weight: Decimal,

        /// Delivery category: air, sal or surface
        #[arg(long)]
        category: Option<MailCategory>,

        /// Add the registration fee
        #[arg(long)]
        registered: bool,

        /// Declared value to insure
        #[arg(long)]
        value: Option<Decimal>,

        /// Index of the rate discount to apply
        #[arg(long)]
        discount: Option<usize>,

        /// Percentage of the price paid when using discounted stamps
        #[arg(long)]
        stamp_percent: Option<Decimal>,
    },

    /// Resolve the pricing zone of a route
    Zone {
        from: String,
        to: String,

        #[arg(long, default_value = "letter")]
        mail_type: MailType,

        #[arg(long)]
        category: Option<MailCategory>,
    },

    /// Show how a route is classified
    Classify { from: String, to: String },

    /// Show catalog version, fingerprint and services
    Catalog,
}

/// Format output based on format type
fn format_output<T: serde::Serialize + std::fmt::Debug>(data: &T, format: &str) -> Result<String> {
    match format {
        "json" => serde_json::to_string_pretty(data)
            .map_err(|e| Error::Io(format!("Failed to serialize JSON: {}", e))),
        _ => Ok(format!("{:#?}", data)),
    }
}

/// Print the failed step and hand the error back for the exit code.
fn report_failure(kind: CalculationError, cause: Option<String>, format: &str) -> Result<()> {
    let output = FailureOutput {
        error: kind.kind(),
        cause,
    };
    println!("{}", format_output(&output, format)?);
    Err(kind.into())
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::from_env()?;
    if let Some(path) = &cli.catalog {
        config.set_catalog_path(PathBuf::from(path));
    }
    if let Some(schema) = &cli.schema {
        config.set_catalog_schema(schema.parse()?);
    }
    if let Some(path) = &cli.regions {
        config.set_regions_path(PathBuf::from(path));
    }
    if cli.format == "json" {
        config.set_output_format("json".to_string());
    }
    Ok(config)
}

pub fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    logger::init(config.get_log_level());

    let source = config.catalog_source();
    let catalog = source.load()?;
    let format = config.get_output_format();

    match cli.command {
        Commands::Quote {
            mail_type,
            from,
            to,
            weight,
            category,
            registered,
            value,
            discount,
            stamp_percent,
        } => {
            let mut request = PostageRequest::new(mail_type, &from, &to, weight);
            request.category = category;
            request.supplements.registered = registered;
            request.supplements.package_value = value;
            request.supplements.discount_index = discount;
            request.supplements.stamp_discount_percent = stamp_percent;

            match calculate_postage(&catalog, &request) {
                Ok(result) => {
                    let output = QuoteOutput {
                        final_price: result.final_price(),
                        rule: result.rule_id.as_deref().and_then(|id| catalog.rule(id)).cloned(),
                        catalog_version: catalog.version().to_string(),
                        result,
                    };
                    println!("{}", format_output(&output, format)?);
                    Ok(())
                }
                Err(kind) => report_failure(kind, None, format),
            }
        }

        Commands::Zone {
            from,
            to,
            mail_type,
            category,
        } => match catalog
            .zone_resolver()
            .resolve_zone(&from, &to, category, mail_type)
        {
            Ok(zone) => {
                let output = ZoneOutput {
                    description: zone_description(&catalog, &from, &to, category, mail_type, zone),
                    from,
                    to,
                    zone,
                };
                println!("{}", format_output(&output, format)?);
                Ok(())
            }
            Err(cause) => report_failure(cause.clone().into(), Some(cause.to_string()), format),
        },

        Commands::Classify { from, to } => {
            let origin = resolve_region_type(&from);
            let output = ClassifyOutput {
                origin_type: origin,
                destination_type: origin
                    .is_recognized()
                    .then(|| resolve_destination_type(origin, &to, catalog.policy().classifier())),
                from_name: region_name(&catalog, &from),
                to_name: region_name(&catalog, &to),
                from,
                to,
            };
            println!("{}", format_output(&output, format)?);
            Ok(())
        }

        Commands::Catalog => {
            let services = catalog
                .rates
                .services
                .iter()
                .map(|(region, service)| ServiceOutput {
                    region: *region,
                    key: service.key.clone(),
                    name: service.name.clone(),
                    currency: service.currency.clone(),
                    destinations: service.destinations.keys().copied().collect(),
                })
                .collect();
            let output = CatalogOutput {
                source: source.describe(),
                version: catalog.version().to_string(),
                schema: catalog.schema.to_string(),
                fingerprint: catalog.fingerprint.clone(),
                policy: catalog.policy(),
                regions: catalog.regions.len(),
                rules: catalog.rates.rules.len(),
                services,
            };
            println!("{}", format_output(&output, format)?);
            Ok(())
        }
    }
}

fn region_name(catalog: &Catalog, code: &str) -> Option<String> {
    catalog.regions.get(code).map(|r| r.name("en").to_string())
}

fn zone_description(
    catalog: &Catalog,
    from: &str,
    to: &str,
    category: Option<MailCategory>,
    mail_type: MailType,
    zone: u32,
) -> Option<String> {
    let origin = resolve_region_type(from);
    let destination = resolve_destination_type(origin, to, catalog.policy().classifier());
    catalog
        .service(origin)
        .and_then(|s| s.zone_descriptions(destination))
        .and_then(|d| d.describe(category, mail_type.letter_class(), zone))
        .map(str::to_string)
}

#[derive(Debug, serde::Serialize)]
struct QuoteOutput {
    result: CalculationResult,
    final_price: Decimal,
    rule: Option<RateRule>,
    catalog_version: String,
}

#[derive(Debug, serde::Serialize)]
struct FailureOutput {
    error: &'static str,
    cause: Option<String>,
}

#[derive(Debug, serde::Serialize)]
struct ZoneOutput {
    from: String,
    to: String,
    zone: u32,
    description: Option<String>,
}

#[derive(Debug, serde::Serialize)]
struct ClassifyOutput {
    from: String,
    to: String,
    from_name: Option<String>,
    to_name: Option<String>,
    origin_type: RegionType,
    destination_type: Option<DestinationType>,
}

#[derive(Debug, serde::Serialize)]
struct ServiceOutput {
    region: RegionType,
    key: String,
    name: Option<String>,
    currency: String,
    destinations: Vec<DestinationType>,
}

#[derive(Debug, serde::Serialize)]
struct CatalogOutput {
    source: String,
    version: String,
    schema: String,
    fingerprint: String,
    policy: CatalogPolicy,
    regions: usize,
    rules: usize,
    services: Vec<ServiceOutput>,
}
