use crate::catalog::{CatalogSchema, CatalogSource, EmbeddedCatalog, FileCatalog};
use crate::error::{Error, Result};
use std::env;
use std::path::PathBuf;

/// Configuration for the postage-calc CLI and embedding applications
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Rate catalog file (default: the catalog compiled into the binary)
    pub catalog_path: Option<PathBuf>,

    /// Layout of the rate catalog: canonical (default) or legacy
    pub catalog_schema: CatalogSchema,

    /// Region catalog file, only read together with `catalog_path`
    pub regions_path: Option<PathBuf>,

    /// Output format: "human" (default) or "json"
    pub output_format: String,

    /// Log level used when `RUST_LOG` is unset (default: "warn")
    pub log_level: String,
}

impl Config {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Config {
            catalog_path: None,
            catalog_schema: CatalogSchema::Canonical,
            regions_path: None,
            output_format: "human".to_string(),
            log_level: "warn".to_string(),
        }
    }

    /// Create config reading the rate catalog from a file
    pub fn with_catalog(path: PathBuf, schema: CatalogSchema) -> Self {
        Config {
            catalog_path: Some(path),
            catalog_schema: schema,
            ..Config::new()
        }
    }

    pub fn get_catalog_path(&self) -> Option<&PathBuf> {
        self.catalog_path.as_ref()
    }

    pub fn set_catalog_path(&mut self, path: PathBuf) {
        self.catalog_path = Some(path);
    }

    pub fn get_catalog_schema(&self) -> CatalogSchema {
        self.catalog_schema
    }

    pub fn set_catalog_schema(&mut self, schema: CatalogSchema) {
        self.catalog_schema = schema;
    }

    pub fn set_regions_path(&mut self, path: PathBuf) {
        self.regions_path = Some(path);
    }

    /// Get output format
    pub fn get_output_format(&self) -> &str {
        &self.output_format
    }

    /// Set output format ("human" or "json")
    pub fn set_output_format(&mut self, format: String) {
        self.output_format = format;
    }

    /// Get log level
    pub fn get_log_level(&self) -> &str {
        &self.log_level
    }

    /// Set log level
    pub fn set_log_level(&mut self, level: String) {
        self.log_level = level;
    }

    /// Where the catalog should be loaded from
    pub fn catalog_source(&self) -> Box<dyn CatalogSource> {
        match &self.catalog_path {
            Some(path) => {
                let mut source = FileCatalog::new(path.clone(), self.catalog_schema);
                if let Some(regions) = &self.regions_path {
                    source = source.with_regions(regions.clone());
                }
                Box::new(source)
            }
            None => Box::new(EmbeddedCatalog::new(self.catalog_schema)),
        }
    }

    /// Load config from environment variables
    ///
    /// Environment variables:
    /// - `POSTAGE_CATALOG`: rate catalog file
    /// - `POSTAGE_CATALOG_SCHEMA`: "canonical" or "legacy"
    /// - `POSTAGE_REGIONS`: region catalog file
    /// - `POSTAGE_OUTPUT_FORMAT`: "human" or "json"
    /// - `POSTAGE_LOG_LEVEL`: log level
    pub fn from_env() -> Result<Self> {
        Config::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Config::new();

        if let Some(path) = lookup("POSTAGE_CATALOG") {
            config.catalog_path = Some(PathBuf::from(path));
        }

        if let Some(schema) = lookup("POSTAGE_CATALOG_SCHEMA") {
            config.catalog_schema = schema.parse()?;
        }

        if let Some(path) = lookup("POSTAGE_REGIONS") {
            config.regions_path = Some(PathBuf::from(path));
        }

        if let Some(format) = lookup("POSTAGE_OUTPUT_FORMAT") {
            match format.as_str() {
                "human" | "json" => config.output_format = format,
                other => {
                    return Err(Error::Config(format!("unknown output format: {}", other)))
                }
            }
        }

        if let Some(level) = lookup("POSTAGE_LOG_LEVEL") {
            config.log_level = level;
        }

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new()
    }
}
