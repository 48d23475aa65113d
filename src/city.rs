use std::collections::BTreeMap;

use rand::{seq::index, Rng};
use serde::Serialize;
use tracing::debug;

use crate::{
    business::{BurnOutcome, Business, BusinessId, BusinessLocation, LocationId},
    catalog::{BusinessTypeId, Catalog, DemandTypeId},
    error::{Result, SimError},
    names::NameGenerator,
    person::{Offer, Person, PersonId, Transaction},
    rng::RngExt,
    spatial::{lattice_points, GridPoint, Point},
};

#[derive(Debug, Clone, Serialize)]
pub struct BusinessSummary {
    pub id: u64,
    pub name: String,
    pub kind: String,
    pub cash: f64,
    pub age: u64,
    pub location: GridPoint,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedBusinessSummary {
    pub id: u64,
    pub name: String,
    pub kind: String,
    pub birth_cycle: u64,
    pub death_cycle: u64,
    pub lifespan: u64,
}

/// Read-only view of the city between cycles.
#[derive(Debug, Clone, Serialize)]
pub struct CityReport {
    pub city: String,
    pub cycle: u64,
    pub population: usize,
    pub locations: usize,
    pub occupied_locations: usize,
    pub active_businesses: usize,
    pub failed_businesses: usize,
    pub mean_failed_lifespan: Option<f64>,
    pub unmet_need: BTreeMap<String, f64>,
    pub businesses: Vec<BusinessSummary>,
    pub failed: Vec<FailedBusinessSummary>,
}

/// Largest accepted city radius. The location lattice grows with its square.
pub const MAX_CITY_SIZE: f64 = 500.0;

#[derive(Debug)]
pub struct City {
    name: String,
    size: f64,
    age: u64,
    catalog: Catalog,
    next_person: u64,
    next_business: u64,
    people: Vec<Person>,
    business_locations: Vec<BusinessLocation>,
    businesses: Vec<Business>,
    failed_businesses: Vec<Business>,
}

impl City {
    pub fn new(name: impl Into<String>, size: f64, catalog: Catalog) -> Result<Self> {
        if !size.is_finite() || size < 0.0 {
            return Err(SimError::invariant(format!(
                "city size must be finite and non-negative, got {size}"
            )));
        }
        if size > MAX_CITY_SIZE {
            return Err(SimError::config(format!(
                "city size {size} exceeds the limit of {MAX_CITY_SIZE}"
            )));
        }
        let business_locations = lattice_points(size)
            .into_iter()
            .enumerate()
            .map(|(i, point)| BusinessLocation::new(LocationId(i), point))
            .collect();
        Ok(Self {
            name: name.into(),
            size,
            age: 0,
            catalog,
            next_person: 0,
            next_business: 0,
            people: Vec::new(),
            business_locations,
            businesses: Vec::new(),
            failed_businesses: Vec::new(),
        })
    }

    /// Add `count` people. Positions are normal in x and y around the
    /// centre (σ = size), redrawn until they land inside the city.
    pub fn populate<R: Rng + ?Sized>(
        &mut self,
        count: usize,
        names: &mut dyn NameGenerator,
        rng: &mut R,
    ) {
        self.people.reserve(count);
        for _ in 0..count {
            let location = self.random_resident_location(rng);
            let name = names.person_name();
            self.add_person(name, location);
        }
    }

    pub fn add_person(&mut self, name: String, location: Point) -> PersonId {
        let id = PersonId(self.next_person);
        self.next_person += 1;
        self.people.push(Person::new(
            id,
            name,
            location,
            self.catalog.demand_types().len(),
        ));
        id
    }

    fn random_resident_location<R: Rng + ?Sized>(&self, rng: &mut R) -> Point {
        if self.size <= 0.0 {
            return Point::ORIGIN;
        }
        loop {
            let candidate = Point::new(rng.gaussian(0.0, self.size), rng.gaussian(0.0, self.size));
            if candidate.inside(Point::ORIGIN, self.size) {
                return candidate;
            }
        }
    }

    /// Open businesses of uniformly random type on `ratio` of the locations.
    pub fn seed_businesses<R: Rng + ?Sized>(
        &mut self,
        ratio: f64,
        names: &mut dyn NameGenerator,
        rng: &mut R,
    ) -> Result<usize> {
        if !(0.0..=1.0).contains(&ratio) {
            return Err(SimError::config(format!(
                "initial occupancy must be within [0, 1], got {ratio}"
            )));
        }
        let type_count = self.catalog.business_types().len();
        if type_count == 0 {
            return Ok(0);
        }
        let vacant = self.vacant_locations();
        let wanted = (self.business_locations.len() as f64 * ratio).floor() as usize;
        let amount = wanted.min(vacant.len());
        let mut opened = 0;
        for slot in index::sample(rng, vacant.len(), amount).into_iter() {
            let kind = BusinessTypeId(rng.gen_range(0..type_count));
            let name = names.business_name(&self.catalog.business_type(kind).name);
            self.start_business(kind, vacant[slot], name)?;
            opened += 1;
        }
        Ok(opened)
    }

    pub fn generate_needs<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let demand_types = self.catalog.demand_types();
        for person in &mut self.people {
            person.generate_need(demand_types, rng);
        }
    }

    pub fn advance_cycle(&mut self) -> u64 {
        self.age += 1;
        self.age
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn age(&self) -> u64 {
        self.age
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn people(&self) -> &[Person] {
        &self.people
    }

    pub fn people_mut(&mut self) -> &mut [Person] {
        &mut self.people
    }

    pub fn business_locations(&self) -> &[BusinessLocation] {
        &self.business_locations
    }

    pub fn business_location(&self, id: LocationId) -> Option<&BusinessLocation> {
        self.business_locations.get(id.0)
    }

    pub fn location_at(&self, point: GridPoint) -> Option<LocationId> {
        self.business_locations
            .iter()
            .find(|l| l.location == point)
            .map(|l| l.id)
    }

    pub fn businesses(&self) -> &[Business] {
        &self.businesses
    }

    pub fn failed_businesses(&self) -> &[Business] {
        &self.failed_businesses
    }

    pub fn business(&self, id: BusinessId) -> Option<&Business> {
        self.businesses.iter().find(|b| b.id == id)
    }

    pub fn business_mut(&mut self, id: BusinessId) -> Option<&mut Business> {
        self.businesses.iter_mut().find(|b| b.id == id)
    }

    pub fn business_at(&self, location: LocationId) -> Option<&Business> {
        self.businesses.iter().find(|b| b.location == location)
    }

    pub fn vacant_locations(&self) -> Vec<LocationId> {
        self.business_locations
            .iter()
            .filter(|l| l.is_vacant())
            .map(|l| l.id)
            .collect()
    }

    pub fn occupied_count(&self) -> usize {
        self.business_locations
            .iter()
            .filter(|l| l.is_occupied())
            .count()
    }

    pub fn start_business(
        &mut self,
        kind: BusinessTypeId,
        location: LocationId,
        name: String,
    ) -> Result<BusinessId> {
        if kind.0 >= self.catalog.business_types().len() {
            return Err(SimError::invariant(format!(
                "unknown business type index {}",
                kind.0
            )));
        }
        let site = self
            .business_locations
            .get_mut(location.0)
            .ok_or_else(|| SimError::invariant(format!("no location {}", location.0)))?;
        if site.is_occupied() {
            return Err(SimError::invariant(format!(
                "startup attempted on occupied location {:?}",
                site.location
            )));
        }
        site.fill();
        let point = site.location;

        let id = BusinessId(self.next_business);
        self.next_business += 1;
        let business_type = self.catalog.business_type(kind);
        debug!(
            cycle = self.age,
            business = %name,
            kind = %business_type.name,
            x = point.x,
            y = point.y,
            "business opened"
        );
        self.businesses.push(Business::new(
            id,
            name,
            location,
            kind,
            business_type,
            self.age,
        ));
        Ok(id)
    }

    /// Nearest first, ties to the lower id.
    pub fn offers(&self, from: Point, demand: DemandTypeId, radius: f64) -> Vec<Offer> {
        let mut offers: Vec<Offer> = self
            .businesses
            .iter()
            .filter_map(|business| {
                let kind = self.catalog.business_type(business.kind);
                if !kind.serves_demand(demand) {
                    return None;
                }
                let distance = self.business_locations[business.location.0]
                    .point()
                    .distance(from);
                if distance > radius {
                    return None;
                }
                let available = business.available_capacity(kind.capacity);
                (available > 0.0).then_some(Offer {
                    business: business.id,
                    distance,
                    available,
                })
            })
            .collect();
        offers.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.business.cmp(&b.business))
        });
        offers
    }

    pub fn apply_transaction(&mut self, transaction: &Transaction) -> Result<()> {
        let business = self.business_mut(transaction.business).ok_or_else(|| {
            SimError::invariant(format!(
                "transaction for inactive business {}",
                transaction.business.raw()
            ))
        })?;
        business.accrue_revenue(transaction.amount);
        Ok(())
    }

    pub fn reset_sales(&mut self) {
        for business in &mut self.businesses {
            business.reset_sales();
        }
    }

    /// Failures free their location before the next business is charged.
    pub fn burn_businesses(&mut self) -> Result<Vec<BusinessId>> {
        let cycle = self.age;
        let mut failed = Vec::new();
        let mut i = 0;
        while i < self.businesses.len() {
            let rate = self
                .catalog
                .business_type(self.businesses[i].kind)
                .burn_rate;
            match self.businesses[i].burn(rate, cycle) {
                BurnOutcome::Survived => i += 1,
                BurnOutcome::Failed => {
                    let business = self.businesses.remove(i);
                    failed.push(business.id);
                    self.retire(business)?;
                }
            }
        }
        Ok(failed)
    }

    fn retire(&mut self, business: Business) -> Result<()> {
        let site = self
            .business_locations
            .get_mut(business.location.0)
            .ok_or_else(|| {
                SimError::invariant(format!(
                    "business {} points at missing location {}",
                    business.id.raw(),
                    business.location.0
                ))
            })?;
        site.free();
        debug!(
            cycle = self.age,
            business = %business.name,
            lifespan = business.lifespan.unwrap_or_default(),
            "business failed"
        );
        self.failed_businesses.push(business);
        Ok(())
    }

    /// Occupancy must match the active set one-to-one, and no active
    /// business may carry negative cash across a cycle boundary.
    pub fn check_invariants(&self) -> Result<()> {
        let mut claimed = vec![false; self.business_locations.len()];
        for business in &self.businesses {
            if !business.is_active() {
                return Err(SimError::invariant(format!(
                    "failed business {} still in the active set",
                    business.id.raw()
                )));
            }
            if business.cash < 0.0 {
                return Err(SimError::invariant(format!(
                    "business {} active with negative cash {}",
                    business.id.raw(),
                    business.cash
                )));
            }
            let index = business.location.0;
            match claimed.get_mut(index) {
                Some(slot) if !*slot => *slot = true,
                Some(_) => {
                    return Err(SimError::invariant(format!(
                        "location {index} held by more than one business"
                    )))
                }
                None => {
                    return Err(SimError::invariant(format!(
                        "business {} points at missing location {index}",
                        business.id.raw()
                    )))
                }
            }
        }
        for (site, held) in self.business_locations.iter().zip(&claimed) {
            if site.is_occupied() != *held {
                return Err(SimError::invariant(format!(
                    "location {:?} occupied={} but held={}",
                    site.location,
                    site.is_occupied(),
                    held
                )));
            }
        }
        Ok(())
    }

    pub fn report(&self) -> CityReport {
        let kind_name = |b: &Business| self.catalog.business_type(b.kind).name.clone();
        let businesses = self
            .businesses
            .iter()
            .map(|b| BusinessSummary {
                id: b.id.raw(),
                name: b.name.clone(),
                kind: kind_name(b),
                cash: b.cash,
                age: b.age(self.age),
                location: self.business_locations[b.location.0].location,
            })
            .collect();
        let failed: Vec<FailedBusinessSummary> = self
            .failed_businesses
            .iter()
            .map(|b| FailedBusinessSummary {
                id: b.id.raw(),
                name: b.name.clone(),
                kind: kind_name(b),
                birth_cycle: b.birth_cycle,
                death_cycle: b.death_cycle.unwrap_or(b.birth_cycle),
                lifespan: b.lifespan.unwrap_or_default(),
            })
            .collect();
        let mean_failed_lifespan = if failed.is_empty() {
            None
        } else {
            Some(failed.iter().map(|f| f.lifespan as f64).sum::<f64>() / failed.len() as f64)
        };
        let unmet_need = self
            .catalog
            .demand_ids()
            .map(|id| {
                let total = self.people.iter().map(|p| p.need(id)).sum();
                (self.catalog.demand_type(id).name.clone(), total)
            })
            .collect();

        CityReport {
            city: self.name.clone(),
            cycle: self.age,
            population: self.people.len(),
            locations: self.business_locations.len(),
            occupied_locations: self.occupied_count(),
            active_businesses: self.businesses.len(),
            failed_businesses: self.failed_businesses.len(),
            mean_failed_lifespan,
            unmet_need,
            businesses,
            failed,
        }
    }
}
