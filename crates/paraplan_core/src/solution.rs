//! Decoded schedule returned to clients. These are plain output values;
//! the solver's decoder fills them in and the API layer attaches route
//! geometry.

use serde::Serialize;

use crate::Seconds;
use crate::normalize::TaskKind;
use crate::problem::{Coordinate, Problem, RideDirection, TimeWindow};
use crate::timefmt::seconds_of_day;

#[derive(Debug, Clone, Serialize)]
pub struct Visit {
    pub position: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ride_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ride_direction: Option<RideDirection>,
    pub address: String,
    pub coordinates: Coordinate,
    #[serde(rename = "type")]
    pub kind: TaskKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_id: Option<String>,
    #[serde(with = "seconds_of_day")]
    pub arrival_time: Seconds,
    #[serde(with = "seconds_of_day")]
    pub waiting_time: Seconds,
    #[serde(with = "seconds_of_day")]
    pub travel_time_to_next: Seconds,
    /// `[earliest, latest]` feasible arrival at this stop.
    pub solution_window: TimeWindow,
}

#[derive(Debug, Clone, Serialize)]
pub struct Route {
    pub vehicle_id: String,
    /// Kilometres, rounded to 3 decimals.
    pub distance: f64,
    #[serde(with = "seconds_of_day")]
    pub duration: Seconds,
    pub visits: Vec<Visit>,
    /// `[lon, lat]` pairs along the road network.
    pub geometry: Vec<[f64; 2]>,
    pub time_window: TimeWindow,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rest_time_window: Option<TimeWindow>,
}

/// Where a passenger ended up when their delivery was short-circuited at
/// the vehicle's end depot.
#[derive(Debug, Clone, Serialize)]
pub struct DepotDroppedRideInfo {
    pub ride_id: String,
    pub user_id: String,
    pub original_pickup_coordinates: Coordinate,
    pub original_pickup_address: String,
    pub original_delivery_coordinates: Coordinate,
    pub original_delivery_address: String,
    pub dropped_at_depot_id: String,
    pub dropped_at_depot_coordinates: Coordinate,
    pub vehicle_id_dropped_by: String,
    #[serde(with = "seconds_of_day")]
    pub time_of_drop_at_depot: Seconds,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Solution {
    pub routes: Vec<Route>,
    pub dropped_rides: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depot_dropped_rides: Option<Vec<DepotDroppedRideInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl Solution {
    /// Well-formed "nothing was served" response: no routes, every ride
    /// dropped, and the failure reason attached.
    pub fn failed(problem: &Problem, message: impl Into<String>) -> Self {
        let mut dropped_rides: Vec<String> = Vec::new();
        for ride in problem.ride_requests() {
            if !dropped_rides.iter().any(|id| id == ride.id()) {
                dropped_rides.push(ride.id().to_owned());
            }
        }

        Solution {
            routes: Vec::new(),
            dropped_rides,
            depot_dropped_rides: None,
            error_message: Some(message.into()),
        }
    }
}
