use crate::{
    city::City,
    engine::{CycleContext, System},
    error::Result,
    rng::SystemRng,
};

/// Closes each cycle by checking the occupancy and cash invariants. A
/// violation aborts the run.
pub struct BookkeepingSystem;

impl BookkeepingSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BookkeepingSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for BookkeepingSystem {
    fn name(&self) -> &str {
        "bookkeeping"
    }

    fn run(
        &mut self,
        _ctx: &CycleContext,
        city: &mut City,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        city.check_invariants()
    }
}
