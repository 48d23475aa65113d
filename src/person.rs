use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    business::BusinessId,
    catalog::{DemandType, DemandTypeId},
    rng::RngExt,
    spatial::Point,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PersonId(pub(crate) u64);

impl PersonId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// A business able to take some of a person's need, as seen from that person.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Offer {
    pub business: BusinessId,
    pub distance: f64,
    /// Revenue the business can still accept this cycle.
    pub available: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transaction {
    pub business: BusinessId,
    pub demand: DemandTypeId,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    pub location: Point,
    /// Unmet need per demand type, in catalog order.
    needs: Vec<f64>,
}

impl Person {
    pub fn new(id: PersonId, name: String, location: Point, demand_types: usize) -> Self {
        Self {
            id,
            name,
            location,
            needs: vec![0.0; demand_types],
        }
    }

    pub fn need(&self, demand: DemandTypeId) -> f64 {
        self.needs.get(demand.index()).copied().unwrap_or(0.0)
    }

    pub fn needs(&self) -> &[f64] {
        &self.needs
    }

    pub fn total_need(&self) -> f64 {
        self.needs.iter().sum()
    }

    /// Overwrite one need level; negative or NaN amounts are stored as zero.
    pub fn set_need(&mut self, demand: DemandTypeId, amount: f64) {
        if let Some(slot) = self.needs.get_mut(demand.index()) {
            *slot = if amount > 0.0 { amount } else { 0.0 };
        }
    }

    /// Add this cycle's arrivals: one Poisson draw per demand type, in
    /// catalog order, valued at the type's unit price.
    pub fn generate_need<R: Rng + ?Sized>(&mut self, demand_types: &[DemandType], rng: &mut R) {
        if self.needs.len() < demand_types.len() {
            self.needs.resize(demand_types.len(), 0.0);
        }
        for (need, demand) in self.needs.iter_mut().zip(demand_types) {
            let arrivals = rng.poisson(demand.rate);
            *need += arrivals as f64 * demand.price;
        }
    }

    /// Spend need of one type against `offers`, taken in the order given
    /// (callers sort nearest first). Each offer absorbs as much as it has
    /// room for; whatever is left carries over to the next cycle.
    pub fn attempt_fulfillment(
        &mut self,
        demand: DemandTypeId,
        offers: &[Offer],
    ) -> Vec<Transaction> {
        let mut transactions = Vec::new();
        let Some(need) = self.needs.get_mut(demand.index()) else {
            return transactions;
        };
        for offer in offers {
            if *need <= 0.0 {
                break;
            }
            let amount = need.min(offer.available);
            if amount <= 0.0 || amount.is_nan() {
                continue;
            }
            *need = (*need - amount).max(0.0);
            transactions.push(Transaction {
                business: offer.business,
                demand,
                amount,
            });
        }
        transactions
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::mock::StepRng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use super::*;

    const FOOD: DemandTypeId = DemandTypeId(0);

    fn person_with_need(amount: f64) -> Person {
        let mut p = Person::new(PersonId(0), "Ada Stone".into(), Point::ORIGIN, 1);
        p.set_need(FOOD, amount);
        p
    }

    fn offer(id: u64, distance: f64, available: f64) -> Offer {
        Offer {
            business: BusinessId(id),
            distance,
            available,
        }
    }

    #[test]
    fn generate_need_with_all_zero_source_adds_nothing() {
        // A source stuck at zero makes every uniform draw 0.0, which ends
        // each Poisson draw with zero arrivals.
        let demand = vec![
            DemandType::new("food", 3.0, 10.0),
            DemandType::new("fuel", 0.0, 3.0),
        ];
        let mut p = Person::new(PersonId(0), "x".into(), Point::ORIGIN, 2);
        p.set_need(FOOD, 4.0);
        let mut rng = StepRng::new(0, 0);
        p.generate_need(&demand, &mut rng);
        assert_eq!(p.needs(), &[4.0, 0.0]);
    }

    #[test]
    fn generate_need_is_multiple_of_price_and_reproducible() {
        let demand = vec![DemandType::new("food", 2.0, 7.5)];
        let mut a = Person::new(PersonId(0), "a".into(), Point::ORIGIN, 1);
        let mut b = a.clone();
        let mut rng_a = ChaCha8Rng::seed_from_u64(11);
        let mut rng_b = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..20 {
            a.generate_need(&demand, &mut rng_a);
            b.generate_need(&demand, &mut rng_b);
        }
        assert_eq!(a.needs(), b.needs());
        let units = a.need(FOOD) / 7.5;
        assert_eq!(units, units.round());
        assert!(a.need(FOOD) > 0.0);
    }

    #[test]
    fn nearest_offer_takes_everything_it_can() {
        let mut p = person_with_need(30.0);
        let tx = p.attempt_fulfillment(FOOD, &[offer(4, 0.5, f64::INFINITY), offer(2, 1.0, 100.0)]);
        assert_eq!(tx.len(), 1);
        assert_eq!(tx[0].business, BusinessId(4));
        assert_eq!(tx[0].amount, 30.0);
        assert_eq!(p.need(FOOD), 0.0);
    }

    #[test]
    fn need_is_split_across_offers() {
        let mut p = person_with_need(30.0);
        let tx = p.attempt_fulfillment(
            FOOD,
            &[offer(1, 0.5, 12.0), offer(2, 0.7, 0.0), offer(3, 0.9, 100.0)],
        );
        let amounts: Vec<_> = tx.iter().map(|t| (t.business.raw(), t.amount)).collect();
        assert_eq!(amounts, vec![(1, 12.0), (3, 18.0)]);
        assert_eq!(p.need(FOOD), 0.0);
    }

    #[test]
    fn shortfall_carries_over() {
        let mut p = person_with_need(30.0);
        let tx = p.attempt_fulfillment(FOOD, &[offer(1, 0.5, 10.0)]);
        assert_eq!(tx.len(), 1);
        assert_eq!(p.need(FOOD), 20.0);

        let tx = p.attempt_fulfillment(FOOD, &[]);
        assert!(tx.is_empty());
        assert_eq!(p.need(FOOD), 20.0);
    }

    #[test]
    fn zero_need_buys_nothing() {
        let mut p = person_with_need(0.0);
        assert!(p.attempt_fulfillment(FOOD, &[offer(1, 0.0, 50.0)]).is_empty());
        assert_eq!(p.need(FOOD), 0.0);
    }

    #[test]
    fn set_need_never_stores_negative() {
        let mut p = person_with_need(-5.0);
        assert_eq!(p.need(FOOD), 0.0);
        p.set_need(FOOD, f64::NAN);
        assert_eq!(p.need(FOOD), 0.0);
    }
}
