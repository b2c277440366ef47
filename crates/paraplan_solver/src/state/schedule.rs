//! Route feasibility and timing: a forward pass over one vehicle's visit
//! sequence computing earliest arrivals, waiting, loads and distance,
//! with the vehicle's rest break placed where the cabin is empty.

use fxhash::{FxHashMap, FxHashSet};

use paraplan_core::Seconds;
use paraplan_core::normalize::{NodeIdx, RideIdx, TaskKind, VehicleIdx};

use crate::model::RoutingModel;

#[derive(Debug, Clone)]
pub(crate) struct Stop {
    pub node: NodeIdx,
    /// Time cumul at the node (after any waiting).
    pub arrival: Seconds,
    pub waiting: Seconds,
    pub seat_load: i64,
    pub wheelchair_load: i64,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct RestWindow {
    pub start: Seconds,
    pub end: Seconds,
    /// Visit index the break precedes (`len` = before the return leg).
    pub gap: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct Schedule {
    pub start_departure: Seconds,
    pub end_arrival: Seconds,
    pub stops: Vec<Stop>,
    /// Total route distance including depot legs, in scaled units.
    pub distance: i64,
    /// Σ seconds deliveries arrive after their window opens.
    pub soft_lateness: Seconds,
    pub rest: Option<RestWindow>,
}

impl Schedule {
    pub fn empty(model: &RoutingModel, vehicle: VehicleIdx) -> Self {
        let start = model.node_window(model.normalized().vehicle_start(vehicle));
        Schedule {
            start_departure: start.start(),
            end_arrival: start.start(),
            stops: Vec::new(),
            distance: 0,
            soft_lateness: 0,
            rest: None,
        }
    }
}

/// Evaluates the visit sequence for a vehicle. `None` means infeasible
/// under the model's constraints.
pub(crate) fn evaluate(
    model: &RoutingModel,
    vehicle: VehicleIdx,
    nodes: &[NodeIdx],
) -> Option<Schedule> {
    if nodes.is_empty() {
        return Some(Schedule::empty(model, vehicle));
    }

    if !model.rest_required(vehicle) {
        return forward_pass(model, vehicle, nodes, None);
    }

    // The break may only sit where the cabin is empty, so candidate gaps
    // are the points where cumulative load returns to zero.
    let mut seat = model.initial_seat_load(vehicle);
    let mut wheelchair = model.initial_wheelchair_load(vehicle);
    let norm = model.normalized();

    let mut gaps = Vec::new();
    if seat == 0 && wheelchair == 0 {
        gaps.push(0);
    }
    for (index, &node) in nodes.iter().enumerate() {
        seat += norm.seat_demand(node);
        wheelchair += norm.wheelchair_demand(node);
        if seat == 0 && wheelchair == 0 {
            gaps.push(index + 1);
        }
    }

    gaps.into_iter()
        .find_map(|gap| forward_pass(model, vehicle, nodes, Some(gap)))
}

fn forward_pass(
    model: &RoutingModel,
    vehicle: VehicleIdx,
    nodes: &[NodeIdx],
    rest_gap: Option<usize>,
) -> Option<Schedule> {
    let norm = model.normalized();
    let params = model.params();

    let start_node = norm.vehicle_start(vehicle);
    let end_node = norm.vehicle_end(vehicle);
    let start_window = model.node_window(start_node);
    let end_window = model.node_window(end_node);
    let shift = model.shift_window(vehicle);
    let containment = model.enforce_shift_containment();
    let pairing = model.enforce_pickup_delivery();

    if start_window.start() > start_window.end() || end_window.start() > end_window.end() {
        return None;
    }

    let seat_capacity = model.seat_capacity(vehicle);
    let wheelchair_capacity = model.wheelchair_capacity(vehicle);

    let mut seat = model.initial_seat_load(vehicle);
    let mut wheelchair = model.initial_wheelchair_load(vehicle);
    if seat > seat_capacity || wheelchair > wheelchair_capacity {
        return None;
    }

    let deliveries_in_route: FxHashSet<RideIdx> = nodes
        .iter()
        .filter(|&&node| norm.task(node).kind() == TaskKind::Delivery)
        .filter_map(|&node| norm.task(node).ride())
        .collect();
    let pickups_in_route: FxHashSet<RideIdx> = nodes
        .iter()
        .filter(|&&node| norm.task(node).kind() == TaskKind::Pickup)
        .filter_map(|&node| norm.task(node).ride())
        .collect();

    let start_departure = start_window.start();
    let mut time = start_departure;
    let mut current = start_node;
    let mut distance = 0_i64;
    let mut soft_lateness = 0_i64;
    let mut rest: Option<RestWindow> = None;
    let mut pickup_arrivals: FxHashMap<RideIdx, Seconds> = FxHashMap::default();
    let mut stops = Vec::with_capacity(nodes.len());

    for (position, &node) in nodes.iter().enumerate() {
        let mut ready = time + model.service_time(current);

        if rest_gap == Some(position) {
            let window = place_rest(model, start_departure, shift.start(), shift.end(), ready)?;
            ready = window.end;
            rest = Some(RestWindow {
                gap: position,
                ..window
            });
        }

        let arrival_raw = ready + model.travel_time(current, node);
        let window = model.node_window(node);

        let mut arrival = arrival_raw.max(window.start());
        if containment {
            arrival = arrival.max(shift.start());
            if arrival > shift.end() {
                return None;
            }
        }
        if arrival > window.end() {
            return None;
        }

        seat += norm.seat_demand(node);
        wheelchair += norm.wheelchair_demand(node);
        if seat > seat_capacity || wheelchair > wheelchair_capacity {
            return None;
        }
        if pairing && (seat < 0 || wheelchair < 0) {
            return None;
        }

        let task = norm.task(node);
        match task.kind() {
            TaskKind::Pickup => {
                if let Some(ride) = task.ride() {
                    pickup_arrivals.insert(ride, arrival);
                }
            }
            TaskKind::Delivery => {
                if let Some(ride) = task.ride() {
                    if let Some(&pickup_arrival) = pickup_arrivals.get(&ride) {
                        if arrival - pickup_arrival > model.max_ride_time() {
                            return None;
                        }
                    } else if pairing && pickups_in_route.contains(&ride) {
                        // delivery sequenced ahead of its own pickup
                        return None;
                    }
                    soft_lateness += (arrival - window.start()).max(0);
                }
            }
            TaskKind::DepotStart | TaskKind::DepotEnd => return None,
        }

        distance += model.distance(current, node);
        stops.push(Stop {
            node,
            arrival,
            waiting: arrival - arrival_raw,
            seat_load: seat,
            wheelchair_load: wheelchair,
        });

        time = arrival;
        current = node;
    }

    let mut ready = time + model.service_time(current);
    if rest_gap == Some(nodes.len()) {
        let window = place_rest(model, start_departure, shift.start(), shift.end(), ready)?;
        ready = window.end;
        rest = Some(RestWindow {
            gap: nodes.len(),
            ..window
        });
    }

    let arrival_raw = ready + model.travel_time(current, end_node);
    let mut end_arrival = arrival_raw.max(end_window.start());
    if let Some(rest) = &rest {
        // the break must not sit at the very end of the route
        end_arrival = end_arrival.max(rest.end + params.rest_min_tail);
    }
    if end_arrival > end_window.end() {
        return None;
    }

    // passengers short-circuited at the depot still ride there
    for (&ride, &pickup_arrival) in &pickup_arrivals {
        if !deliveries_in_route.contains(&ride)
            && end_arrival - pickup_arrival > model.max_ride_time()
        {
            return None;
        }
    }

    distance += model.distance(current, end_node);

    Some(Schedule {
        start_departure,
        end_arrival,
        stops,
        distance,
        soft_lateness,
        rest,
    })
}

/// Earliest legal break start at a point where the vehicle is free.
fn place_rest(
    model: &RoutingModel,
    start_departure: Seconds,
    shift_start: Seconds,
    shift_end: Seconds,
    ready: Seconds,
) -> Option<RestWindow> {
    let params = model.params();

    let start = ready
        .max(start_departure + params.rest_min_offset)
        .max(shift_start);
    if start > shift_end - params.rest_time {
        return None;
    }

    Some(RestWindow {
        start,
        end: start + params.rest_time,
        gap: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RoutingModel;
    use crate::params::SolverParams;
    use crate::test_support::*;
    use paraplan_core::normalize::normalize;
    use paraplan_core::problem::{Problem, TimeWindow};

    fn single_ride_problem(pickup_window: TimeWindow, delivery_window: TimeWindow) -> Problem {
        problem_with_rides(vec![
            ride_builder("r1")
                .set_pickup(stop_at(0.0, 1.0, pickup_window))
                .set_delivery(stop_at(0.0, 2.0, delivery_window))
                .build(),
        ])
    }

    #[test]
    fn test_forward_pass_waits_for_window() {
        let problem = single_ride_problem(
            TimeWindow::new(3_600, 7_200),
            TimeWindow::new(7_200, 10_800),
        );
        let normalized = normalize(&problem).unwrap();
        // 60 s and 1 km between any pair of distinct nodes
        let matrices = unit_matrices(normalized.num_nodes());
        let params = SolverParams::default();
        let model = RoutingModel::build(&problem, &normalized, &matrices, &params).unwrap();

        let (pickup, delivery) = normalized.ride_pair(paraplan_core::normalize::RideIdx::new(0));
        let schedule = evaluate(&model, VehicleIdx::new(0), &[pickup, delivery]).unwrap();

        // departure at 0, arrival raw 60, wait until the window opens
        assert_eq!(schedule.stops[0].arrival, 3_600);
        assert_eq!(schedule.stops[0].waiting, 3_540);
        // 120 s common stop + 60 s travel, then wait for delivery window
        assert_eq!(schedule.stops[1].arrival, 7_200);
        assert_eq!(schedule.stops[0].seat_load, 1);
        assert_eq!(schedule.stops[1].seat_load, 0);
        assert_eq!(schedule.stops[0].wheelchair_load, 0);
        assert_eq!(schedule.soft_lateness, 0);
        // depot→pickup, pickup→delivery, delivery→depot, 1 km each, scaled
        assert_eq!(schedule.distance, 3 * 100_000);
    }

    #[test]
    fn test_forward_pass_rejects_missed_window() {
        let problem = single_ride_problem(TimeWindow::new(110, 120), TimeWindow::default());
        let normalized = normalize(&problem).unwrap();
        let matrices = TravelMatrices::from_constant(normalized.num_nodes(), 1_000.0, 200.0);
        let params = SolverParams::default();
        let model = RoutingModel::build(&problem, &normalized, &matrices, &params).unwrap();

        let (pickup, delivery) = normalized.ride_pair(paraplan_core::normalize::RideIdx::new(0));
        assert!(evaluate(&model, VehicleIdx::new(0), &[pickup, delivery]).is_none());
    }

    #[test]
    fn test_forward_pass_rejects_capacity_overflow() {
        let problem = Problem::new(
            vec![vehicle_builder("v1").set_seat_capacity(1).build()],
            vec![
                ride_builder("r1").set_has_companion(true).build(), // demand 2
            ],
        );
        let normalized = normalize(&problem).unwrap();
        let matrices = unit_matrices(normalized.num_nodes());
        let params = SolverParams::default();
        let model = RoutingModel::build(&problem, &normalized, &matrices, &params).unwrap();

        let (pickup, delivery) = normalized.ride_pair(paraplan_core::normalize::RideIdx::new(0));
        assert!(evaluate(&model, VehicleIdx::new(0), &[pickup, delivery]).is_none());
    }

    #[test]
    fn test_forward_pass_enforces_max_ride_time() {
        let problem = single_ride_problem(TimeWindow::new(0, 7_200), TimeWindow::new(7_000, 86_400));
        let normalized = normalize(&problem).unwrap();
        let matrices = unit_matrices(normalized.num_nodes());
        let mut params = SolverParams::default();
        params.max_ride_time = 600;
        let model = RoutingModel::build(&problem, &normalized, &matrices, &params).unwrap();

        let (pickup, delivery) = normalized.ride_pair(paraplan_core::normalize::RideIdx::new(0));
        // delivery window forces a 7000 s in-vehicle time, over the bound
        assert!(evaluate(&model, VehicleIdx::new(0), &[pickup, delivery]).is_none());
    }

    #[test]
    fn test_max_ride_time_enforced_without_pairing_checks() {
        let problem = single_ride_problem(TimeWindow::new(0, 7_200), TimeWindow::new(7_000, 86_400));
        let normalized = normalize(&problem).unwrap();
        let matrices = unit_matrices(normalized.num_nodes());
        let mut params = SolverParams::default();
        params.max_ride_time = 600;
        // the pairing flag only covers ordering and load signs; the
        // in-vehicle time bound is its own flag
        params.skip.pickup_delivery = true;
        let model = RoutingModel::build(&problem, &normalized, &matrices, &params).unwrap();

        let (pickup, delivery) = normalized.ride_pair(paraplan_core::normalize::RideIdx::new(0));
        assert!(evaluate(&model, VehicleIdx::new(0), &[pickup, delivery]).is_none());

        params.skip.max_ride_time = true;
        let model = RoutingModel::build(&problem, &normalized, &matrices, &params).unwrap();
        assert!(evaluate(&model, VehicleIdx::new(0), &[pickup, delivery]).is_some());
    }

    #[test]
    fn test_rest_placed_in_empty_gap() {
        let problem = Problem::new(
            vec![
                vehicle_builder("v1")
                    .set_with_rest(true)
                    .set_time_window(TimeWindow::new(0, 28_800))
                    .build(),
            ],
            vec![
                ride_builder("r1")
                    .set_pickup(stop_at(0.0, 1.0, TimeWindow::new(3_600, 4_000)))
                    .set_delivery(stop_at(0.0, 2.0, TimeWindow::new(3_600, 7_200)))
                    .build(),
                ride_builder("r2")
                    .set_pickup(stop_at(0.0, 3.0, TimeWindow::new(18_000, 18_400)))
                    .set_delivery(stop_at(0.0, 4.0, TimeWindow::new(18_000, 21_600)))
                    .build(),
            ],
        );
        let normalized = normalize(&problem).unwrap();
        let matrices = unit_matrices(normalized.num_nodes());
        let params = SolverParams::default();
        let model = RoutingModel::build(&problem, &normalized, &matrices, &params).unwrap();

        let (p1, d1) = normalized.ride_pair(paraplan_core::normalize::RideIdx::new(0));
        let (p2, d2) = normalized.ride_pair(paraplan_core::normalize::RideIdx::new(1));
        let schedule = evaluate(&model, VehicleIdx::new(0), &[p1, d1, p2, d2]).unwrap();

        let rest = schedule.rest.expect("rest break placed");
        assert_eq!(rest.end - rest.start, 1_800);
        // not at the very beginning of the route
        assert!(rest.start >= schedule.start_departure + 3_600);
        // not at the very end
        assert!(rest.end <= schedule.end_arrival - 3_600);
        // outside both transport intervals
        assert!(rest.start >= schedule.stops[1].arrival || rest.end <= schedule.stops[0].arrival);
        assert!(rest.start >= schedule.stops[3].arrival || rest.end <= schedule.stops[2].arrival);
    }

    #[test]
    fn test_rest_infeasible_when_shift_too_tight() {
        let problem = Problem::new(
            vec![
                vehicle_builder("v1")
                    .set_with_rest(true)
                    // shorter than offset + rest + tail
                    .set_time_window(TimeWindow::new(0, 5_000))
                    .build(),
            ],
            vec![
                ride_builder("r1")
                    .set_pickup(stop_at(0.0, 1.0, TimeWindow::new(0, 4_000)))
                    .set_delivery(stop_at(0.0, 2.0, TimeWindow::new(0, 4_500)))
                    .build(),
            ],
        );
        let normalized = normalize(&problem).unwrap();
        let matrices = unit_matrices(normalized.num_nodes());
        let params = SolverParams::default();
        let model = RoutingModel::build(&problem, &normalized, &matrices, &params).unwrap();

        let (pickup, delivery) = normalized.ride_pair(paraplan_core::normalize::RideIdx::new(0));
        assert!(evaluate(&model, VehicleIdx::new(0), &[pickup, delivery]).is_none());
    }

    #[test]
    fn test_pre_boarded_initial_load_counts_against_capacity() {
        let problem = Problem::new(
            vec![
                vehicle_builder("v1")
                    .set_seat_capacity(2)
                    .set_active_ride_id_pre_boarded("r1")
                    .build(),
            ],
            vec![
                ride_builder("r1").set_has_companion(true).build(), // occupies both seats
                ride_builder("r2")
                    .set_pickup(stop_at(0.0, 3.0, TimeWindow::default()))
                    .set_delivery(stop_at(0.0, 4.0, TimeWindow::default()))
                    .build(),
            ],
        );
        let normalized = normalize(&problem).unwrap();
        let matrices = unit_matrices(normalized.num_nodes());
        let params = SolverParams::default();
        let model = RoutingModel::build(&problem, &normalized, &matrices, &params).unwrap();

        let (_, d1) = normalized.ride_pair(paraplan_core::normalize::RideIdx::new(0));
        let (p2, d2) = normalized.ride_pair(paraplan_core::normalize::RideIdx::new(1));

        // picking up r2 while r1 is still on board exceeds the two seats
        assert!(evaluate(&model, VehicleIdx::new(0), &[p2, d1, d2]).is_none());
        // delivering r1 first frees the cabin
        assert!(evaluate(&model, VehicleIdx::new(0), &[d1, p2, d2]).is_some());
    }
}
