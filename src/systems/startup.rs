use std::cmp::Ordering;

use tracing::trace;

use crate::{
    business::LocationId,
    catalog::BusinessTypeId,
    city::City,
    engine::{CycleContext, System},
    error::Result,
    names::NameGenerator,
    rng::SystemRng,
};

/// Minimum score that justifies opening a business.
pub const STARTUP_THRESHOLD: f64 = 1.0;

/// Highest-scoring business type for `location`. Types are visited in
/// catalog (name) order and a later type must beat the current best
/// strictly, so ties go to the earlier name. Types scoring zero are never
/// picked.
pub fn best_startup(city: &City, location: LocationId) -> Option<(BusinessTypeId, f64)> {
    let mut best: Option<(BusinessTypeId, f64)> = None;
    for kind in city.catalog().business_type_ids() {
        let score = city
            .catalog()
            .business_type(kind)
            .startup_score(city, location);
        let current = best.map_or(0.0, |(_, s)| s);
        if score > current {
            best = Some((kind, score));
        }
    }
    best
}

/// Phase 2: vacant locations may attract a new business.
///
/// Every vacant location is scored against the state at the start of the
/// phase. Candidates are then visited from the best score down (lower
/// location index first on ties) and re-scored, because each opening adds a
/// competitor for the ones after it.
pub struct StartupSystem {
    names: Box<dyn NameGenerator>,
}

impl StartupSystem {
    pub fn new(names: Box<dyn NameGenerator>) -> Self {
        Self { names }
    }
}

impl System for StartupSystem {
    fn name(&self) -> &str {
        "startup"
    }

    fn run(
        &mut self,
        ctx: &CycleContext,
        city: &mut City,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        // Openings only add competitors, so a location below the threshold
        // now cannot cross it later in the phase.
        let view: &City = city;
        let mut candidates: Vec<(LocationId, f64)> = view
            .vacant_locations()
            .into_iter()
            .filter_map(|location| {
                best_startup(view, location)
                    .filter(|(_, score)| *score >= STARTUP_THRESHOLD)
                    .map(|(_, score)| (location, score))
            })
            .collect();
        candidates.sort_by(|a, b| match b.1.total_cmp(&a.1) {
            Ordering::Equal => a.0.cmp(&b.0),
            other => other,
        });

        let mut opened = 0;
        for (location, _) in candidates {
            let Some((kind, score)) = best_startup(city, location) else {
                continue;
            };
            if score < STARTUP_THRESHOLD {
                continue;
            }
            let name = self
                .names
                .business_name(&city.catalog().business_type(kind).name);
            city.start_business(kind, location, name)?;
            opened += 1;
        }
        trace!(cycle = ctx.cycle, opened, "startup evaluation complete");
        Ok(())
    }
}
