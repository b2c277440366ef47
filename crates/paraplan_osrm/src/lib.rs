//! Road-network adapter: OSRM table queries (tiled above a batch size)
//! producing integer travel matrices, and route queries producing decoded
//! polyline geometry.

pub mod client;
pub mod matrix;
pub mod polyline;

pub use client::{OsrmClient, OsrmConfig, OsrmError};
pub use matrix::{DISTANCE_SCALE, TravelMatrices, distance_km};
