//! Reconstructs the typed [`Solution`] from the best search state: per
//! vehicle an ordered visit list with earliest arrivals and
//! latest-feasible bounds, the rest window when one was placed, and the
//! dropped / depot-dropped ride lists.

use fxhash::FxHashSet;
use tracing::{info, warn};

use paraplan_core::Seconds;
use paraplan_core::normalize::{NodeIdx, VehicleIdx};
use paraplan_core::problem::TimeWindow;
use paraplan_core::solution::{DepotDroppedRideInfo, Route, Solution, Visit};
use paraplan_osrm::distance_km;

use crate::model::RoutingModel;
use crate::state::schedule::RestWindow;
use crate::state::working::{RideAssignment, WorkingSolution};

pub(crate) fn decode(model: &RoutingModel, best: &WorkingSolution) -> Solution {
    let norm = model.normalized();
    let problem = model.problem();

    let mut routes = Vec::new();
    let mut depot_dropped = Vec::new();

    for vehicle in norm.vehicles_iter() {
        let schedule = best.schedule(vehicle);
        if schedule.stops.is_empty() {
            continue;
        }

        let path: Vec<NodeIdx> = std::iter::once(norm.vehicle_start(vehicle))
            .chain(schedule.stops.iter().map(|stop| stop.node))
            .chain(std::iter::once(norm.vehicle_end(vehicle)))
            .collect();

        let arrivals: Vec<Seconds> = std::iter::once(schedule.start_departure)
            .chain(schedule.stops.iter().map(|stop| stop.arrival))
            .chain(std::iter::once(schedule.end_arrival))
            .collect();

        let latest = latest_arrivals(model, vehicle, &path, &arrivals, schedule.rest.as_ref());

        let mut visits = Vec::with_capacity(path.len());
        for (position, &node) in path.iter().enumerate() {
            let task = norm.task(node);
            let ride = task
                .ride()
                .map(|ride_idx| &problem.ride_requests()[ride_idx.get()]);

            let travel_time_to_next = if position + 1 < path.len() {
                model.travel_time(node, path[position + 1])
            } else {
                0
            };

            let waiting_time = if position > 0 && position <= schedule.stops.len() {
                schedule.stops[position - 1].waiting
            } else {
                0
            };

            visits.push(Visit {
                position,
                ride_id: ride.map(|ride| ride.id().to_owned()),
                user_id: ride.map(|ride| ride.user_id().to_owned()),
                ride_direction: ride.map(|ride| ride.direction()),
                address: task.address().to_owned(),
                coordinates: task.coordinates(),
                kind: task.kind(),
                stop_id: task.stop_id().map(str::to_owned),
                arrival_time: arrivals[position],
                waiting_time,
                travel_time_to_next,
                solution_window: TimeWindow::new(arrivals[position], latest[position]),
            });
        }

        let vehicle_input = &problem.vehicles()[vehicle.get()];

        for ride_idx in norm.rides_iter() {
            if best.assignment(ride_idx) != (RideAssignment::DepotDropped { vehicle }) {
                continue;
            }

            let ride = &problem.ride_requests()[ride_idx.get()];
            let (Some(pickup), Some(delivery)) = (ride.pickup(), ride.delivery()) else {
                continue;
            };
            let depot = vehicle_input.depot_end();

            depot_dropped.push(DepotDroppedRideInfo {
                ride_id: ride.id().to_owned(),
                user_id: ride.user_id().to_owned(),
                original_pickup_coordinates: pickup.coordinates(),
                original_pickup_address: pickup.address().to_owned(),
                original_delivery_coordinates: delivery.coordinates(),
                original_delivery_address: delivery.address().to_owned(),
                dropped_at_depot_id: depot.id().to_owned(),
                dropped_at_depot_coordinates: depot.coordinates(),
                vehicle_id_dropped_by: vehicle_input.id().to_owned(),
                time_of_drop_at_depot: schedule.end_arrival,
            });
        }

        routes.push(Route {
            vehicle_id: vehicle_input.id().to_owned(),
            distance: distance_km(schedule.distance),
            duration: schedule.end_arrival - schedule.start_departure,
            visits,
            geometry: Vec::new(),
            time_window: TimeWindow::new(
                vehicle_input.depot_start().time_window().start(),
                vehicle_input.depot_end().time_window().end(),
            ),
            rest_time_window: schedule
                .rest
                .map(|rest| TimeWindow::new(rest.start, rest.end)),
        });
    }

    let mut dropped_rides = Vec::new();
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    for ride_idx in norm.rides_iter() {
        if best.assignment(ride_idx) == RideAssignment::Dropped {
            let id = problem.ride_requests()[ride_idx.get()].id();
            if seen.insert(id) {
                dropped_rides.push(id.to_owned());
            }
        }
    }

    let all_dropped = norm.num_rides() > 0
        && norm
            .rides_iter()
            .all(|ride| best.assignment(ride) == RideAssignment::Dropped);

    if !dropped_rides.is_empty() {
        warn!(dropped = dropped_rides.len(), "rides left unserved");
    }
    info!(routes = routes.len(), "solution decoded");

    Solution {
        routes,
        dropped_rides,
        depot_dropped_rides: (!depot_dropped.is_empty()).then_some(depot_dropped),
        error_message: all_dropped
            .then(|| "solver found no feasible assignment for any ride within the time limit".to_owned()),
    }
}

/// Backward pass: the latest each visit could happen without violating a
/// later window, the rest break's position, or the shift. Forms the upper
/// bound of each visit's solution window.
fn latest_arrivals(
    model: &RoutingModel,
    vehicle: VehicleIdx,
    path: &[NodeIdx],
    arrivals: &[Seconds],
    rest: Option<&RestWindow>,
) -> Vec<Seconds> {
    let shift = model.shift_window(vehicle);
    let containment = model.enforce_shift_containment();
    let params = model.params();

    let mut latest = vec![0; path.len()];
    let last = path.len() - 1;
    latest[last] = model.node_window(path[last]).end();

    for index in (0..last).rev() {
        let mut transit = model.transit_time(path[index], path[index + 1]);
        // the break extends the leg it sits on
        if let Some(rest) = rest
            && rest.gap == index
        {
            transit += params.rest_time;
        }

        let mut bound = model.node_window(path[index]).end();
        if containment && !model.normalized().task(path[index]).kind().is_depot() {
            bound = bound.min(shift.end());
        }

        latest[index] = bound.min(latest[index + 1] - transit);
    }

    if let Some(rest) = rest {
        // pushing the departure later would leave the break too close to
        // the route start
        latest[0] = latest[0].min(rest.start - params.rest_min_offset);
    }

    // the earliest schedule is always a witness
    for index in 0..path.len() {
        latest[index] = latest[index].max(arrivals[index]);
    }

    latest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::Search;
    use crate::test_support::*;
    use paraplan_core::normalize::{TaskKind, normalize};

    #[test]
    fn test_decode_single_ride_route() {
        let problem = problem_with_rides(vec![
            ride_builder("r1")
                .set_pickup(stop_at(0.0, 1.0, TimeWindow::new(3_600, 7_200)))
                .set_delivery(stop_at(0.0, 2.0, TimeWindow::new(7_200, 10_800)))
                .build(),
        ]);
        let normalized = normalize(&problem).unwrap();
        let matrices = unit_matrices(normalized.num_nodes());
        let params = fast_params();
        let model = RoutingModel::build(&problem, &normalized, &matrices, &params).unwrap();

        let best = Search::new(&model).run().unwrap();
        let solution = decode(&model, &best);

        assert!(solution.error_message.is_none());
        assert!(solution.dropped_rides.is_empty());
        assert_eq!(solution.routes.len(), 1);

        let route = &solution.routes[0];
        assert_eq!(route.vehicle_id, "v1");
        assert_eq!(route.visits.len(), 4);
        assert_eq!(route.visits[0].kind, TaskKind::DepotStart);
        assert_eq!(route.visits[1].kind, TaskKind::Pickup);
        assert_eq!(route.visits[2].kind, TaskKind::Delivery);
        assert_eq!(route.visits[3].kind, TaskKind::DepotEnd);

        assert_eq!(route.visits[1].arrival_time, 3_600);
        assert_eq!(route.visits[2].arrival_time, 7_200);
        assert_eq!(route.visits[1].ride_id.as_deref(), Some("r1"));
        assert_eq!(route.visits[0].ride_id, None);

        // 3 legs of 1 km
        assert_eq!(route.distance, 3.0);
        assert_eq!(
            route.duration,
            route.visits[3].arrival_time - route.visits[0].arrival_time
        );

        // travel to next comes straight from the time matrix
        assert_eq!(route.visits[0].travel_time_to_next, 60);
        assert_eq!(route.visits[3].travel_time_to_next, 0);

        // solution windows contain the arrival and respect later windows
        for visit in &route.visits {
            assert!(visit.solution_window.start() <= visit.solution_window.end());
            assert_eq!(visit.solution_window.start(), visit.arrival_time);
        }
    }

    #[test]
    fn test_decode_infeasible_problem_drops_everything() {
        let problem = problem_with_rides(vec![
            ride_builder("r1")
                .set_pickup(stop_at(0.0, 1.0, TimeWindow::new(110, 120)))
                .set_delivery(stop_at(0.0, 2.0, TimeWindow::default()))
                .build(),
        ]);
        let normalized = normalize(&problem).unwrap();
        let matrices = TravelMatrices::from_constant(normalized.num_nodes(), 1_000.0, 200.0);
        let params = fast_params();
        let model = RoutingModel::build(&problem, &normalized, &matrices, &params).unwrap();

        let best = Search::new(&model).run().unwrap();
        let solution = decode(&model, &best);

        assert!(solution.routes.is_empty());
        assert_eq!(solution.dropped_rides, vec!["r1".to_owned()]);
        assert!(solution.error_message.is_some());
    }

    #[test]
    fn test_decode_duplicate_ride_ids_reported_once() {
        let problem = problem_with_rides(vec![
            ride_builder("dup")
                .set_pickup(stop_at(0.0, 1.0, TimeWindow::new(110, 120)))
                .set_delivery(stop_at(0.0, 2.0, TimeWindow::default()))
                .build(),
            ride_builder("dup")
                .set_pickup(stop_at(0.0, 3.0, TimeWindow::new(110, 120)))
                .set_delivery(stop_at(0.0, 4.0, TimeWindow::default()))
                .build(),
        ]);
        let normalized = normalize(&problem).unwrap();
        let matrices = TravelMatrices::from_constant(normalized.num_nodes(), 1_000.0, 200.0);
        let params = fast_params();
        let model = RoutingModel::build(&problem, &normalized, &matrices, &params).unwrap();

        let best = Search::new(&model).run().unwrap();
        let solution = decode(&model, &best);

        assert_eq!(solution.dropped_rides, vec!["dup".to_owned()]);
    }
}
