use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::{
    catalog::{Catalog, CatalogLoader},
    city::{City, MAX_CITY_SIZE},
    engine::{Engine, EngineSettings},
    error::SimError,
    names::WordListNames,
};

fn default_initial_occupancy() -> f64 {
    0.75
}

fn default_cycles() -> u64 {
    52
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    pub seed: u64,
    /// City radius.
    pub size: f64,
    pub people: usize,
    /// Share of locations given a random business before the first cycle.
    #[serde(default = "default_initial_occupancy")]
    pub initial_occupancy: f64,
    #[serde(default)]
    pub cycles: Option<u64>,
    pub catalog: CatalogFiles,
}

/// Catalog JSON files, relative to the loader's base directory.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogFiles {
    pub demand_types: PathBuf,
    pub business_types: PathBuf,
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        scenario
            .validate()
            .with_context(|| format!("Invalid scenario {}", path.display()))?;
        Ok(scenario)
    }

    pub fn load_catalog(&self, scenario: &Scenario) -> Result<Catalog> {
        CatalogLoader::new(&self.base_dir).load(
            &scenario.catalog.demand_types,
            &scenario.catalog.business_types,
        )
    }
}

impl Scenario {
    pub fn validate(&self) -> std::result::Result<(), SimError> {
        if self.name.trim().is_empty() {
            return Err(SimError::config("scenario must define a name"));
        }
        if !self.size.is_finite() || self.size < 0.0 {
            return Err(SimError::config(format!(
                "city size must be finite and non-negative, got {}",
                self.size
            )));
        }
        if self.size > MAX_CITY_SIZE {
            return Err(SimError::config(format!(
                "city size {} exceeds the limit of {MAX_CITY_SIZE}",
                self.size
            )));
        }
        if !(0.0..=1.0).contains(&self.initial_occupancy) {
            return Err(SimError::config(format!(
                "initial_occupancy must be within [0, 1], got {}",
                self.initial_occupancy
            )));
        }
        Ok(())
    }

    /// Load the catalogs, then build the city and its engine.
    pub fn build(&self, loader: &ScenarioLoader) -> Result<(City, Engine)> {
        let catalog = loader.load_catalog(self)?;
        let built = self
            .build_with_catalog(catalog)
            .with_context(|| format!("Failed to build scenario '{}'", self.name))?;
        Ok(built)
    }

    /// Create the city, populate it and open the initial businesses, drawing
    /// from the engine's stream so the whole run follows from `seed`.
    pub fn build_with_catalog(
        &self,
        catalog: Catalog,
    ) -> std::result::Result<(City, Engine), SimError> {
        self.validate()?;
        let mut city = City::new(self.name.clone(), self.size, catalog)?;
        let mut engine = Engine::standard(
            EngineSettings {
                scenario_name: self.name.clone(),
                seed: self.seed,
            },
            Box::new(WordListNames::new(self.seed.wrapping_add(1))),
        );
        let mut names = WordListNames::new(self.seed);
        let mut rng = engine.rng();
        city.populate(self.people, &mut names, &mut rng);
        city.seed_businesses(self.initial_occupancy, &mut names, &mut rng)?;
        Ok((city, engine))
    }

    pub fn cycles(&self, override_cycles: Option<u64>) -> u64 {
        override_cycles
            .or(self.cycles)
            .unwrap_or_else(default_cycles)
    }
}
