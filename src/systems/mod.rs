mod bookkeeping;
mod burn;
mod demand;
mod fulfillment;
mod startup;

pub use bookkeeping::BookkeepingSystem;
pub use burn::BurnSystem;
pub use demand::DemandSystem;
pub use fulfillment::FulfillmentSystem;
pub use startup::{best_startup, StartupSystem};
