use crate::{
    city::City,
    engine::{CycleContext, System},
    error::Result,
    rng::SystemRng,
};

/// Phase 1: every person accrues this cycle's stochastic need.
pub struct DemandSystem;

impl DemandSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DemandSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for DemandSystem {
    fn name(&self) -> &str {
        "demand"
    }

    fn run(
        &mut self,
        _ctx: &CycleContext,
        city: &mut City,
        rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        city.generate_needs(rng);
        Ok(())
    }
}
