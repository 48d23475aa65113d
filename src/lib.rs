pub mod business;
pub mod catalog;
pub mod city;
pub mod engine;
pub mod error;
pub mod names;
pub mod person;
pub mod rng;
pub mod scenario;
pub mod spatial;
pub mod systems;

pub use catalog::{BusinessType, Catalog, DemandType};
pub use city::{City, CityReport};
pub use engine::{Engine, EngineBuilder, EngineSettings};
pub use error::SimError;
pub use scenario::{Scenario, ScenarioLoader};
