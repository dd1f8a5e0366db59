//! Personal carbon-footprint tracking.
//!
//! The engine (`factors`, `calculator`, `projections`, `recommendations`) is
//! pure and synchronous. `routes` and `store` are the HTTP surface and the
//! append-only entry log around it.

pub mod calculator;
pub mod config;
pub mod errors;
pub mod factors;
pub mod models;
pub mod projections;
pub mod recommendations;
pub mod routes;
pub mod store;

pub use calculator::compute as compute_emission;
pub use projections::aggregate_breakdown;
pub use recommendations::recommend as get_recommendations;
