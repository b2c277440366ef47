//! Domain model for the paraplan paratransit scheduler: the input problem
//! (fleet, ride requests), the normalized node-indexed form consumed by the
//! solver, and the decoded solution returned to clients.

pub mod error;
pub mod index;
pub mod normalize;
pub mod problem;
pub mod solution;
pub mod timefmt;

pub use timefmt::Seconds;
