use crate::catalog::{Catalog, CatalogSchema, BUILTIN_PROVINCES, BUILTIN_REGIONS};
use crate::error::{Error, Result};
use crate::region::RegionCatalog;
use crate::zone::ProvinceZoneTable;
use std::fs;
use std::path::{Path, PathBuf};

/// Where a catalog is loaded from.
///
/// Loading happens once at startup; the returned [`Catalog`] is immutable.
pub trait CatalogSource {
    fn load(&self) -> Result<Catalog>;

    /// Short human-readable origin, for logs and `catalog` output.
    fn describe(&self) -> String;
}

/// Catalogs compiled into the binary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmbeddedCatalog {
    pub schema: CatalogSchema,
}

impl EmbeddedCatalog {
    pub fn new(schema: CatalogSchema) -> Self {
        EmbeddedCatalog { schema }
    }
}

impl CatalogSource for EmbeddedCatalog {
    fn load(&self) -> Result<Catalog> {
        Catalog::builtin(self.schema)
    }

    fn describe(&self) -> String {
        format!("embedded ({})", self.schema)
    }
}

/// Rate file on disk. Regions and the province table default to the
/// embedded copies unless paths are given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCatalog {
    rates_path: PathBuf,
    schema: CatalogSchema,
    regions_path: Option<PathBuf>,
    provinces_path: Option<PathBuf>,
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|e| Error::Io(format!("Failed to read {}: {}", path.display(), e)))
}

impl FileCatalog {
    pub fn new(rates_path: PathBuf, schema: CatalogSchema) -> Self {
        FileCatalog {
            rates_path,
            schema,
            regions_path: None,
            provinces_path: None,
        }
    }

    pub fn with_regions(mut self, regions_path: PathBuf) -> Self {
        self.regions_path = Some(regions_path);
        self
    }

    pub fn with_provinces(mut self, provinces_path: PathBuf) -> Self {
        self.provinces_path = Some(provinces_path);
        self
    }

    pub fn rates_path(&self) -> &Path {
        &self.rates_path
    }
}

impl CatalogSource for FileCatalog {
    fn load(&self) -> Result<Catalog> {
        let rates_json = read(&self.rates_path)?;

        let regions = match &self.regions_path {
            Some(path) => RegionCatalog::from_json(&read(path)?)?,
            None => RegionCatalog::from_json(BUILTIN_REGIONS)?,
        };
        let provinces = match &self.provinces_path {
            Some(path) => ProvinceZoneTable::from_json(&read(path)?)?,
            None => ProvinceZoneTable::from_json(BUILTIN_PROVINCES)?,
        };

        Catalog::load(self.schema, &rates_json, regions, provinces)
    }

    fn describe(&self) -> String {
        format!("{} ({})", self.rates_path.display(), self.schema)
    }
}
