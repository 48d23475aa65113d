use tracing::trace;

use crate::{
    catalog::DemandTypeId,
    city::City,
    engine::{CycleContext, System},
    error::Result,
    rng::SystemRng,
};

/// Phase 3: people spend their accumulated need at businesses in reach.
///
/// People go in population order and demand types in catalog order. For each
/// need, the search radius comes from the current amount, and businesses
/// inside it are tried nearest first. Each transaction is applied before the
/// next person shops, so capacity taken by one person is gone for the next.
pub struct FulfillmentSystem;

impl FulfillmentSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FulfillmentSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for FulfillmentSystem {
    fn name(&self) -> &str {
        "fulfillment"
    }

    fn run(
        &mut self,
        ctx: &CycleContext,
        city: &mut City,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        city.reset_sales();
        let demand_ids: Vec<DemandTypeId> = city.catalog().demand_ids().collect();
        let mut volume = 0.0;

        for index in 0..city.people().len() {
            for &demand in &demand_ids {
                let person = &city.people()[index];
                let need = person.need(demand);
                if need <= 0.0 {
                    continue;
                }
                let radius = city
                    .catalog()
                    .demand_type(demand)
                    .demand_radius(need, city.size());
                let offers = city.offers(person.location, demand, radius);
                if offers.is_empty() {
                    continue;
                }
                let transactions = city.people_mut()[index].attempt_fulfillment(demand, &offers);
                for transaction in &transactions {
                    city.apply_transaction(transaction)?;
                    volume += transaction.amount;
                }
            }
        }
        trace!(cycle = ctx.cycle, volume, "fulfillment complete");
        Ok(())
    }
}
