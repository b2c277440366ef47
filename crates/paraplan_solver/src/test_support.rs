//! Shared fixtures for the solver's unit tests.

pub use paraplan_core::problem::{
    Coordinate, Depot, Problem, RideRequest, RideRequestBuilder, RideStop, TimeWindow, Vehicle,
    VehicleBuilder,
};
pub use paraplan_osrm::TravelMatrices;

pub fn depot(id: &str) -> Depot {
    Depot::new(id, Coordinate::new(0.0, 0.0), "Depot", TimeWindow::default())
}

pub fn vehicle_builder(id: &str) -> VehicleBuilder {
    VehicleBuilder::default()
        .set_id(id)
        .set_seat_capacity(4)
        .set_depot_start(depot(&format!("{id}-start")))
        .set_depot_end(depot(&format!("{id}-end")))
}

pub fn stop_at(latitude: f64, longitude: f64, time_window: TimeWindow) -> RideStop {
    RideStop::new(Coordinate::new(latitude, longitude), "", time_window, None)
}

pub fn ride_builder(id: &str) -> RideRequestBuilder {
    RideRequestBuilder::default()
        .set_id(id)
        .set_user_id(format!("user-{id}"))
        .set_pickup(stop_at(0.0, 1.0, TimeWindow::default()))
        .set_delivery(stop_at(0.0, 2.0, TimeWindow::default()))
}

/// Problem with one ordinary vehicle and the given rides.
pub fn problem_with_rides(rides: Vec<RideRequest>) -> Problem {
    Problem::new(vec![vehicle_builder("v1").build()], rides)
}

pub fn with_vehicle(problem: Problem, vehicle: Vehicle) -> Problem {
    let mut vehicles = problem.vehicles().to_vec();
    vehicles.push(vehicle);
    Problem::new(vehicles, problem.ride_requests().to_vec())
}

/// 1 km and 60 s between every pair of distinct nodes.
pub fn unit_matrices(size: usize) -> TravelMatrices {
    TravelMatrices::from_constant(size, 1_000.0, 60.0)
}

/// Iteration-bounded params so unit tests never sit out the wall clock.
pub fn fast_params() -> crate::params::SolverParams {
    let mut params = crate::params::SolverParams::default();
    params.max_iterations = 2_000;
    params
}
