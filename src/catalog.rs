//! Demand and business type catalogs.
//!
//! Both lists are kept sorted by name so that every loop over them, and every
//! tie-break that depends on loop order, is the same from run to run.

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::{
    business::LocationId,
    city::City,
    error::{Result, SimError},
};

/// Highest arrival rate a demand type may declare per cycle.
pub const MAX_ARRIVAL_RATE: f64 = 1_000_000.0;

fn default_radius_per_unit() -> f64 {
    0.1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DemandTypeId(pub(crate) usize);

impl DemandTypeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BusinessTypeId(pub(crate) usize);

impl BusinessTypeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DemandType {
    pub name: String,
    /// Mean arrivals per cycle.
    pub rate: f64,
    pub price: f64,
    pub radius_per_unit: f64,
}

impl DemandType {
    pub fn new(name: impl Into<String>, rate: f64, price: f64) -> Self {
        Self {
            name: name.into(),
            rate,
            price,
            radius_per_unit: default_radius_per_unit(),
        }
    }

    pub fn with_radius_per_unit(mut self, radius_per_unit: f64) -> Self {
        self.radius_per_unit = radius_per_unit;
        self
    }

    pub fn demand_radius(&self, need: f64, cap: f64) -> f64 {
        if need.is_nan() || need <= 0.0 {
            return 0.0;
        }
        let radius = self.radius_per_unit * need;
        if radius.is_nan() {
            return 0.0;
        }
        radius.clamp(0.0, cap.max(0.0))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusinessType {
    pub name: String,
    pub initial_cash: f64,
    /// Multiple of `initial_cash` the weighted local need must reach.
    pub need_threshold: f64,
    pub need_radius: f64,
    pub burn_rate: f64,
    /// Demand types sold here; empty means all of them.
    pub serves: Vec<String>,
    /// Most revenue accepted per cycle; `None` is unlimited.
    pub capacity: Option<f64>,
    #[serde(skip)]
    served: Vec<DemandTypeId>,
}

impl BusinessType {
    pub fn new(
        name: impl Into<String>,
        initial_cash: f64,
        need_threshold: f64,
        need_radius: f64,
        burn_rate: f64,
    ) -> Self {
        Self {
            name: name.into(),
            initial_cash,
            need_threshold,
            need_radius,
            burn_rate,
            serves: Vec::new(),
            capacity: None,
            served: Vec::new(),
        }
    }

    pub fn serving<I, S>(mut self, demand_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.serves = demand_types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_capacity(mut self, capacity: f64) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn served(&self) -> &[DemandTypeId] {
        &self.served
    }

    pub fn serves_demand(&self, demand: DemandTypeId) -> bool {
        self.served.contains(&demand)
    }

    pub fn competes_with(&self, other: &BusinessType) -> bool {
        self.served.iter().any(|d| other.serves_demand(*d))
    }

    /// Attractiveness of opening this type at `location`.
    ///
    /// Unmet need inside `need_radius`, over the demand types served, with
    /// each person weighted by `1 - d / (need_radius + 1)`. The sum is
    /// measured against the capital at stake, `need_threshold *
    /// initial_cash`, shared with every competitor inside the same radius.
    /// A result of at least 1 justifies a startup.
    pub fn startup_score(&self, city: &City, location: LocationId) -> f64 {
        let Some(site) = city.business_location(location) else {
            return 0.0;
        };
        let stake = self.need_threshold * self.initial_cash;
        if self.served.is_empty() || stake <= 0.0 {
            return 0.0;
        }
        let centre = site.point();
        let radius = self.need_radius;

        let mut demand = 0.0;
        for person in city.people() {
            let distance = person.location.distance(centre);
            if distance > radius {
                continue;
            }
            let weight = 1.0 - distance / (radius + 1.0);
            let need: f64 = self.served.iter().map(|d| person.need(*d)).sum();
            demand += need * weight;
        }
        if demand <= 0.0 {
            return 0.0;
        }

        let competitors = city
            .businesses()
            .iter()
            .filter(|b| {
                city.catalog().business_type(b.kind).competes_with(self)
                    && city
                        .business_location(b.location)
                        .is_some_and(|l| l.point().distance(centre) <= radius)
            })
            .count();

        demand / (stake * (1.0 + competitors as f64))
    }
}

/// Validated, name-ordered type lists with name lookups.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    demand_types: Vec<DemandType>,
    business_types: Vec<BusinessType>,
    demand_index: HashMap<String, DemandTypeId>,
    business_index: HashMap<String, BusinessTypeId>,
}

impl Catalog {
    pub fn new(
        mut demand_types: Vec<DemandType>,
        mut business_types: Vec<BusinessType>,
    ) -> Result<Self> {
        demand_types.sort_by(|a, b| a.name.cmp(&b.name));
        business_types.sort_by(|a, b| a.name.cmp(&b.name));

        let mut demand_index = HashMap::new();
        for (i, demand) in demand_types.iter().enumerate() {
            validate_demand_type(demand)?;
            if demand_index
                .insert(demand.name.clone(), DemandTypeId(i))
                .is_some()
            {
                return Err(SimError::config(format!(
                    "demand type '{}' defined more than once",
                    demand.name
                )));
            }
        }

        let mut business_index = HashMap::new();
        for (i, business) in business_types.iter_mut().enumerate() {
            validate_business_type(business)?;
            business.served = if business.serves.is_empty() {
                (0..demand_types.len()).map(DemandTypeId).collect()
            } else {
                let mut served = Vec::with_capacity(business.serves.len());
                for name in &business.serves {
                    let id = demand_index.get(name).copied().ok_or_else(|| {
                        SimError::config(format!(
                            "business type '{}' serves unknown demand type '{name}'",
                            business.name
                        ))
                    })?;
                    if !served.contains(&id) {
                        served.push(id);
                    }
                }
                served.sort();
                served
            };
            if business_index
                .insert(business.name.clone(), BusinessTypeId(i))
                .is_some()
            {
                return Err(SimError::config(format!(
                    "business type '{}' defined more than once",
                    business.name
                )));
            }
        }

        Ok(Self {
            demand_types,
            business_types,
            demand_index,
            business_index,
        })
    }

    /// Parse the JSON reference documents: objects keyed by type name.
    pub fn from_json_str(demand_json: &str, business_json: &str) -> Result<Self> {
        let demand: BTreeMap<String, DemandEntry> = serde_json::from_str(demand_json)
            .map_err(|err| SimError::config(format!("demand types: {err}")))?;
        let business: BTreeMap<String, BusinessEntry> = serde_json::from_str(business_json)
            .map_err(|err| SimError::config(format!("business types: {err}")))?;

        let demand_types = demand
            .into_iter()
            .map(|(name, entry)| {
                DemandType::new(name, entry.rate, entry.price)
                    .with_radius_per_unit(entry.radius_per_unit)
            })
            .collect();
        let business_types = business
            .into_iter()
            .map(|(name, entry)| {
                let mut kind = BusinessType::new(
                    name,
                    entry.initial_cash,
                    entry.need_threshold,
                    entry.need_radius,
                    entry.burn_rate,
                )
                .serving(entry.serves);
                kind.capacity = entry.capacity;
                kind
            })
            .collect();
        Self::new(demand_types, business_types)
    }

    pub fn demand_types(&self) -> &[DemandType] {
        &self.demand_types
    }

    pub fn business_types(&self) -> &[BusinessType] {
        &self.business_types
    }

    pub fn demand_ids(&self) -> impl Iterator<Item = DemandTypeId> {
        (0..self.demand_types.len()).map(DemandTypeId)
    }

    pub fn business_type_ids(&self) -> impl Iterator<Item = BusinessTypeId> {
        (0..self.business_types.len()).map(BusinessTypeId)
    }

    pub fn demand_type(&self, id: DemandTypeId) -> &DemandType {
        &self.demand_types[id.0]
    }

    pub fn business_type(&self, id: BusinessTypeId) -> &BusinessType {
        &self.business_types[id.0]
    }

    pub fn demand_id(&self, name: &str) -> Option<DemandTypeId> {
        self.demand_index.get(name).copied()
    }

    pub fn business_type_id(&self, name: &str) -> Option<BusinessTypeId> {
        self.business_index.get(name).copied()
    }
}

#[derive(Debug, Deserialize)]
struct DemandEntry {
    #[serde(alias = "dlambda")]
    rate: f64,
    #[serde(alias = "dprice")]
    price: f64,
    #[serde(default = "default_radius_per_unit")]
    radius_per_unit: f64,
}

#[derive(Debug, Deserialize)]
struct BusinessEntry {
    #[serde(alias = "init_cash")]
    initial_cash: f64,
    #[serde(alias = "init_need_threshold")]
    need_threshold: f64,
    #[serde(alias = "init_need_radius")]
    need_radius: f64,
    #[serde(alias = "burnrate")]
    burn_rate: f64,
    #[serde(default)]
    serves: Vec<String>,
    #[serde(default)]
    capacity: Option<f64>,
}

fn non_negative(kind: &str, name: &str, field: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SimError::config(format!(
            "{kind} '{name}': {field} must be a finite non-negative number, got {value}"
        )))
    }
}

fn validate_demand_type(demand: &DemandType) -> Result<()> {
    if demand.name.trim().is_empty() {
        return Err(SimError::config("demand type with empty name"));
    }
    non_negative("demand type", &demand.name, "rate", demand.rate)?;
    if demand.rate > MAX_ARRIVAL_RATE {
        return Err(SimError::config(format!(
            "demand type '{}': rate {} exceeds the limit of {MAX_ARRIVAL_RATE} arrivals per cycle",
            demand.name, demand.rate
        )));
    }
    non_negative("demand type", &demand.name, "price", demand.price)?;
    non_negative(
        "demand type",
        &demand.name,
        "radius_per_unit",
        demand.radius_per_unit,
    )
}

fn validate_business_type(business: &BusinessType) -> Result<()> {
    let name = business.name.as_str();
    if name.trim().is_empty() {
        return Err(SimError::config("business type with empty name"));
    }
    if !business.initial_cash.is_finite() || business.initial_cash <= 0.0 {
        return Err(SimError::config(format!(
            "business type '{name}': initial_cash must be positive, got {}",
            business.initial_cash
        )));
    }
    non_negative("business type", name, "need_radius", business.need_radius)?;
    non_negative("business type", name, "burn_rate", business.burn_rate)?;
    if !business.need_threshold.is_finite() || business.need_threshold <= 0.0 {
        return Err(SimError::config(format!(
            "business type '{name}': need_threshold must be positive, got {}",
            business.need_threshold
        )));
    }
    if let Some(capacity) = business.capacity {
        if !capacity.is_finite() || capacity <= 0.0 {
            return Err(SimError::config(format!(
                "business type '{name}': capacity must be positive, got {capacity}"
            )));
        }
    }
    Ok(())
}

/// Reads catalog JSON files relative to a base directory.
pub struct CatalogLoader {
    base_dir: PathBuf,
}

impl CatalogLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(
        &self,
        demand_file: impl AsRef<Path>,
        business_file: impl AsRef<Path>,
    ) -> anyhow::Result<Catalog> {
        let demand_path = self.base_dir.join(demand_file);
        let business_path = self.base_dir.join(business_file);
        let demand = fs::read_to_string(&demand_path)
            .with_context(|| format!("Failed to read demand types {}", demand_path.display()))?;
        let business = fs::read_to_string(&business_path).with_context(|| {
            format!("Failed to read business types {}", business_path.display())
        })?;
        let catalog = Catalog::from_json_str(&demand, &business).with_context(|| {
            format!(
                "Invalid catalog {} / {}",
                demand_path.display(),
                business_path.display()
            )
        })?;
        Ok(catalog)
    }
}
