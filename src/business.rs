use serde::{Deserialize, Serialize};

use crate::{
    catalog::{BusinessType, BusinessTypeId},
    spatial::{GridPoint, Point},
};

/// Index into the city's fixed list of business locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LocationId(pub(crate) usize);

impl LocationId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BusinessId(pub(crate) u64);

impl BusinessId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BusinessLocation {
    pub id: LocationId,
    pub location: GridPoint,
    occupied: bool,
}

impl BusinessLocation {
    pub(crate) fn new(id: LocationId, location: GridPoint) -> Self {
        Self {
            id,
            location,
            occupied: false,
        }
    }

    pub fn point(&self) -> Point {
        self.location.to_point()
    }

    pub fn is_occupied(&self) -> bool {
        self.occupied
    }

    pub fn is_vacant(&self) -> bool {
        !self.occupied
    }

    pub(crate) fn fill(&mut self) {
        self.occupied = true;
    }

    pub(crate) fn free(&mut self) {
        self.occupied = false;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BusinessState {
    Active,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurnOutcome {
    Survived,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct Business {
    pub id: BusinessId,
    pub name: String,
    pub location: LocationId,
    pub kind: BusinessTypeId,
    pub cash: f64,
    pub birth_cycle: u64,
    pub death_cycle: Option<u64>,
    pub lifespan: Option<u64>,
    /// Lifetime revenue.
    pub revenue: f64,
    /// Revenue taken during the current fulfillment phase.
    pub sales_this_cycle: f64,
    state: BusinessState,
}

impl Business {
    pub(crate) fn new(
        id: BusinessId,
        name: String,
        location: LocationId,
        kind: BusinessTypeId,
        business_type: &BusinessType,
        birth_cycle: u64,
    ) -> Self {
        Self {
            id,
            name,
            location,
            kind,
            cash: business_type.initial_cash,
            birth_cycle,
            death_cycle: None,
            lifespan: None,
            revenue: 0.0,
            sales_this_cycle: 0.0,
            state: BusinessState::Active,
        }
    }

    pub fn state(&self) -> BusinessState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == BusinessState::Active
    }

    /// Cycles since opening, as of `cycle`.
    pub fn age(&self, cycle: u64) -> u64 {
        self.lifespan
            .unwrap_or_else(|| cycle.saturating_sub(self.birth_cycle))
    }

    /// Revenue still accepted this cycle given the type's capacity.
    pub fn available_capacity(&self, capacity: Option<f64>) -> f64 {
        match capacity {
            Some(limit) => (limit - self.sales_this_cycle).max(0.0),
            None => f64::INFINITY,
        }
    }

    pub fn accrue_revenue(&mut self, amount: f64) {
        self.cash += amount;
        self.revenue += amount;
        self.sales_this_cycle += amount;
    }

    pub(crate) fn reset_sales(&mut self) {
        self.sales_this_cycle = 0.0;
    }

    /// Pay one cycle of operating cost. A negative balance afterwards is
    /// terminal: the business records its death and reports `Failed`.
    pub fn burn(&mut self, burn_rate: f64, cycle: u64) -> BurnOutcome {
        if !self.is_active() {
            return BurnOutcome::Failed;
        }
        self.cash -= burn_rate;
        if self.cash < 0.0 {
            self.die(cycle);
            BurnOutcome::Failed
        } else {
            BurnOutcome::Survived
        }
    }

    fn die(&mut self, cycle: u64) {
        self.state = BusinessState::Failed;
        self.death_cycle = Some(cycle);
        self.lifespan = Some(cycle.saturating_sub(self.birth_cycle));
    }
}
