use tracing::trace;

use crate::{
    city::City,
    engine::{CycleContext, System},
    error::Result,
    rng::SystemRng,
};

/// Phase 4: businesses pay their burn rate; those left below zero close.
pub struct BurnSystem;

impl BurnSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BurnSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for BurnSystem {
    fn name(&self) -> &str {
        "burn"
    }

    fn run(
        &mut self,
        ctx: &CycleContext,
        city: &mut City,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        let failed = city.burn_businesses()?;
        trace!(cycle = ctx.cycle, failed = failed.len(), "burn complete");
        Ok(())
    }
}
