use tracing::{info, trace};

use crate::{
    city::{City, CityReport},
    error::Result,
    names::NameGenerator,
    rng::{RngManager, SystemRng},
    systems::{BookkeepingSystem, BurnSystem, DemandSystem, FulfillmentSystem, StartupSystem},
};

pub struct EngineSettings {
    pub scenario_name: String,
    pub seed: u64,
}

pub struct EngineBuilder {
    settings: EngineSettings,
    systems: Vec<Box<dyn System>>,
}

impl EngineBuilder {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            systems: Vec::new(),
        }
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    pub fn push_system(&mut self, system: impl System + 'static) {
        self.systems.push(Box::new(system));
    }

    pub fn build(self) -> Engine {
        Engine {
            rng: RngManager::new(self.settings.seed),
            systems: self.systems,
            settings: self.settings,
        }
    }
}

pub struct Engine {
    rng: RngManager,
    systems: Vec<Box<dyn System>>,
    settings: EngineSettings,
}

impl Engine {
    /// The four cycle phases followed by the invariant check. The order is
    /// part of the model: startups see this cycle's needs, fulfillment sees
    /// this cycle's startups, and burn sees this cycle's revenue.
    pub fn standard(settings: EngineSettings, names: Box<dyn NameGenerator>) -> Self {
        EngineBuilder::new(settings)
            .with_system(DemandSystem::new())
            .with_system(StartupSystem::new(names))
            .with_system(FulfillmentSystem::new())
            .with_system(BurnSystem::new())
            .with_system(BookkeepingSystem::new())
            .build()
    }

    pub fn scenario_name(&self) -> &str {
        &self.settings.scenario_name
    }

    /// The shared stream, for setup work such as populating a city before the
    /// first cycle.
    pub fn rng(&mut self) -> SystemRng<'_> {
        self.rng.stream()
    }

    /// Run a single cycle and return its number.
    pub fn step(&mut self, city: &mut City) -> Result<u64> {
        let cycle = city.advance_cycle();
        let ctx = CycleContext {
            cycle,
            scenario_name: &self.settings.scenario_name,
        };
        for system in &mut self.systems {
            trace!(cycle, system = system.name(), "running system");
            let mut rng = self.rng.stream();
            system.run(&ctx, city, &mut rng)?;
        }
        Ok(cycle)
    }

    pub fn run(&mut self, city: &mut City, cycles: u64) -> Result<()> {
        for _ in 0..cycles {
            self.step(city)?;
        }
        log_completion(&self.settings.scenario_name, city);
        Ok(())
    }

    /// Like [`Engine::run`], handing `hook` a report after every cycle.
    pub fn run_with_hook<F>(&mut self, city: &mut City, cycles: u64, mut hook: F) -> Result<()>
    where
        F: FnMut(&CityReport),
    {
        for _ in 0..cycles {
            self.step(city)?;
            hook(&city.report());
        }
        log_completion(&self.settings.scenario_name, city);
        Ok(())
    }
}

fn log_completion(scenario: &str, city: &City) {
    info!(
        scenario,
        cycle = city.age(),
        population = city.people().len(),
        active = city.businesses().len(),
        failed = city.failed_businesses().len(),
        "run complete"
    );
}

pub struct CycleContext<'a> {
    pub cycle: u64,
    pub scenario_name: &'a str,
}

pub trait System {
    fn name(&self) -> &str;
    fn run(&mut self, ctx: &CycleContext, city: &mut City, rng: &mut SystemRng<'_>)
        -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    struct CountingSystem {
        seen: std::rc::Rc<std::cell::RefCell<Vec<(u64, &'static str)>>>,
        label: &'static str,
    }

    impl System for CountingSystem {
        fn name(&self) -> &str {
            self.label
        }

        fn run(
            &mut self,
            ctx: &CycleContext,
            city: &mut City,
            _rng: &mut SystemRng<'_>,
        ) -> Result<()> {
            assert_eq!(ctx.cycle, city.age());
            self.seen.borrow_mut().push((ctx.cycle, self.label));
            Ok(())
        }
    }

    #[test]
    fn systems_run_in_order_each_cycle() {
        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut engine = EngineBuilder::new(EngineSettings {
            scenario_name: "order".into(),
            seed: 1,
        })
        .with_system(CountingSystem {
            seen: seen.clone(),
            label: "first",
        })
        .with_system(CountingSystem {
            seen: seen.clone(),
            label: "second",
        })
        .build();
        let mut city = City::new("Empty", 0.0, Catalog::default()).unwrap();

        engine.run(&mut city, 2).unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![(1, "first"), (1, "second"), (2, "first"), (2, "second")]
        );
        assert_eq!(city.age(), 2);
    }
}
