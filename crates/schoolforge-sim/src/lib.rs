//! Multi-year academic progression simulator for Schoolforge.
//!
//! This crate owns the stateful year loop: identity minting, curriculum
//! construction, semester performance sampling, promotion/graduation/
//! termination transitions, capacity-constrained class rebalancing, and
//! population replenishment. Export and warehouse upload live at the edge
//! as thin sinks.

pub mod balance;
pub mod curriculum;
pub mod errors;
pub mod identity;
pub mod output;
pub mod performance;
pub mod progression;
pub mod seed;
pub mod warehouse;

pub use errors::SimulationError;
pub use progression::{SimulationEngine, Transition};
