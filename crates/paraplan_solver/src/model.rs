//! Routing model builder: turns the normalized problem plus travel
//! matrices into the explicit constraint encoding the search operates
//! on: effective node windows, service-stop times, compatibility,
//! pre-boarded loads, rest requirements, and ride groups.

use fxhash::FxHashMap;
use tracing::debug;

use paraplan_core::Seconds;
use paraplan_core::normalize::{NodeIdx, NormalizedProblem, RideIdx, VehicleIdx};
use paraplan_core::problem::{ELECTRIC_RAMP_TAG, Problem, TimeWindow};
use paraplan_osrm::TravelMatrices;

use crate::error::SolverError;
use crate::params::{
    SolverParams, TIME_STOP_COMMON_SECONDS, TIME_STOP_ELECTRIC_RAMP_SECONDS,
    TIME_STOP_WHEELCHAIR_SECONDS,
};

/// Index of a group of rides sharing one logical ride id. Nodes of one
/// group are active together or dropped together.
pub type GroupIdx = usize;

pub struct RoutingModel<'a> {
    problem: &'a Problem,
    normalized: &'a NormalizedProblem,
    matrices: &'a TravelMatrices,
    params: &'a SolverParams,

    node_windows: Vec<TimeWindow>,
    service_times: Vec<Seconds>,
    shift_windows: Vec<TimeWindow>,

    /// ride × vehicle, row-major by ride
    compatibility: Vec<bool>,

    initial_seat_loads: Vec<i64>,
    initial_wheelchair_loads: Vec<i64>,
    /// Delivery that must be performed by this vehicle (pre-boarded ride).
    locked_deliveries: Vec<Option<RideIdx>>,

    groups: Vec<Vec<RideIdx>>,
    group_of_ride: Vec<GroupIdx>,
}

impl<'a> RoutingModel<'a> {
    pub fn build(
        problem: &'a Problem,
        normalized: &'a NormalizedProblem,
        matrices: &'a TravelMatrices,
        params: &'a SolverParams,
    ) -> Result<Self, SolverError> {
        if matrices.size() != normalized.num_nodes() {
            return Err(SolverError::Invalid(format!(
                "matrix size {} does not match node count {}",
                matrices.size(),
                normalized.num_nodes()
            )));
        }

        let node_windows = build_node_windows(problem, normalized, params);
        let service_times = build_service_times(problem, normalized);
        let compatibility = build_compatibility(problem, params);

        let shift_windows = problem
            .vehicles()
            .iter()
            .map(|vehicle| *vehicle.time_window())
            .collect();

        let num_vehicles = normalized.num_vehicles();
        let mut initial_seat_loads = vec![0_i64; num_vehicles];
        let mut initial_wheelchair_loads = vec![0_i64; num_vehicles];
        let mut locked_deliveries = vec![None; num_vehicles];

        for vehicle in normalized.vehicles_iter() {
            if let Some(ride_idx) = normalized.pre_boarded(vehicle) {
                let ride = &problem.ride_requests()[ride_idx.get()];
                initial_seat_loads[vehicle.get()] = ride.seat_demand();
                initial_wheelchair_loads[vehicle.get()] = ride.wheelchair_demand();
                locked_deliveries[vehicle.get()] = Some(ride_idx);
            }
        }

        let (groups, group_of_ride) = build_ride_groups(problem);

        debug!(
            nodes = normalized.num_nodes(),
            vehicles = num_vehicles,
            groups = groups.len(),
            "routing model built"
        );

        Ok(RoutingModel {
            problem,
            normalized,
            matrices,
            params,
            node_windows,
            service_times,
            shift_windows,
            compatibility,
            initial_seat_loads,
            initial_wheelchair_loads,
            locked_deliveries,
            groups,
            group_of_ride,
        })
    }

    pub fn problem(&self) -> &Problem {
        self.problem
    }

    pub fn normalized(&self) -> &NormalizedProblem {
        self.normalized
    }

    pub fn matrices(&self) -> &TravelMatrices {
        self.matrices
    }

    pub fn params(&self) -> &SolverParams {
        self.params
    }

    pub fn travel_time(&self, from: NodeIdx, to: NodeIdx) -> Seconds {
        self.matrices.time(from.get(), to.get())
    }

    /// Time-dimension transit: travel plus the service stop at the
    /// departing node.
    pub fn transit_time(&self, from: NodeIdx, to: NodeIdx) -> Seconds {
        self.travel_time(from, to) + self.service_time(from)
    }

    pub fn distance(&self, from: NodeIdx, to: NodeIdx) -> i64 {
        self.matrices.distance(from.get(), to.get())
    }

    pub fn service_time(&self, node: NodeIdx) -> Seconds {
        self.service_times[node.get()]
    }

    pub fn node_window(&self, node: NodeIdx) -> TimeWindow {
        self.node_windows[node.get()]
    }

    pub fn shift_window(&self, vehicle: VehicleIdx) -> TimeWindow {
        self.shift_windows[vehicle.get()]
    }

    pub fn enforce_shift_containment(&self) -> bool {
        !self.params.skip.shift_containment
    }

    pub fn enforce_pickup_delivery(&self) -> bool {
        !self.params.skip.pickup_delivery
    }

    pub fn seat_capacity(&self, vehicle: VehicleIdx) -> i64 {
        if self.params.skip.seat_capacity {
            i64::MAX
        } else {
            self.normalized.seat_capacity(vehicle)
        }
    }

    pub fn wheelchair_capacity(&self, vehicle: VehicleIdx) -> i64 {
        if self.params.skip.wheelchair_capacity {
            i64::MAX
        } else {
            self.normalized.wheelchair_capacity(vehicle)
        }
    }

    pub fn initial_seat_load(&self, vehicle: VehicleIdx) -> i64 {
        self.initial_seat_loads[vehicle.get()]
    }

    pub fn initial_wheelchair_load(&self, vehicle: VehicleIdx) -> i64 {
        self.initial_wheelchair_loads[vehicle.get()]
    }

    pub fn locked_delivery(&self, vehicle: VehicleIdx) -> Option<RideIdx> {
        self.locked_deliveries[vehicle.get()]
    }

    /// Vehicle the ride is pre-boarded on, if any.
    pub fn locked_vehicle_of(&self, ride: RideIdx) -> Option<VehicleIdx> {
        self.locked_deliveries
            .iter()
            .position(|&locked| locked == Some(ride))
            .map(VehicleIdx::new)
    }

    pub fn max_ride_time(&self) -> Seconds {
        if self.params.skip.max_ride_time {
            i64::MAX
        } else {
            self.params.max_ride_time
        }
    }

    pub fn rest_required(&self, vehicle: VehicleIdx) -> bool {
        !self.params.skip.rest && self.problem.vehicles()[vehicle.get()].with_rest()
    }

    pub fn is_compatible(&self, ride: RideIdx, vehicle: VehicleIdx) -> bool {
        if self.params.skip.compatibility {
            return true;
        }
        self.compatibility[ride.get() * self.normalized.num_vehicles() + vehicle.get()]
    }

    pub fn drop_penalty(&self) -> i64 {
        if self.params.skip.drop_penalties {
            // with disjunctions disabled drops are effectively forbidden
            i64::MAX / 4
        } else {
            self.params.drop_penalty
        }
    }

    pub fn depot_drop_penalty(&self) -> i64 {
        self.params.depot_drop_penalty
    }

    pub fn distance_cost_enabled(&self) -> bool {
        !self.params.skip.distance_dimension
    }

    pub fn groups(&self) -> &[Vec<RideIdx>] {
        &self.groups
    }

    pub fn group(&self, group: GroupIdx) -> &[RideIdx] {
        &self.groups[group]
    }

    pub fn group_of(&self, ride: RideIdx) -> GroupIdx {
        self.group_of_ride[ride.get()]
    }
}

fn build_node_windows(
    problem: &Problem,
    normalized: &NormalizedProblem,
    params: &SolverParams,
) -> Vec<TimeWindow> {
    normalized
        .tasks()
        .iter()
        .enumerate()
        .map(|(index, task)| {
            if params.skip.time_dimension {
                return TimeWindow::default();
            }

            if task.kind().is_depot() {
                // depot cumul is bounded by the shift window and the
                // depot's own window
                let vehicle = &problem.vehicles()[index / 2];
                task.time_window().intersect(vehicle.time_window())
            } else {
                *task.time_window()
            }
        })
        .collect()
}

fn build_service_times(problem: &Problem, normalized: &NormalizedProblem) -> Vec<Seconds> {
    normalized
        .tasks()
        .iter()
        .map(|task| {
            let Some(ride_idx) = task.ride() else {
                return 0;
            };

            let ride = &problem.ride_requests()[ride_idx.get()];
            if ride
                .characteristics()
                .iter()
                .any(|tag| tag.as_str() == ELECTRIC_RAMP_TAG)
            {
                TIME_STOP_ELECTRIC_RAMP_SECONDS
            } else if ride.wheelchair_required() {
                TIME_STOP_WHEELCHAIR_SECONDS
            } else {
                TIME_STOP_COMMON_SECONDS
            }
        })
        .collect()
}

/// A vehicle serves a ride only when it supports every characteristic of
/// the ride and, for wheelchair rides, has wheelchair space at all.
fn build_compatibility(problem: &Problem, params: &SolverParams) -> Vec<bool> {
    let vehicles = problem.vehicles();
    let rides = problem.ride_requests();
    let mut compatibility = vec![true; rides.len() * vehicles.len()];

    for (ride_index, ride) in rides.iter().enumerate() {
        for (vehicle_index, vehicle) in vehicles.iter().enumerate() {
            let supports_tags = ride
                .characteristics()
                .is_subset(vehicle.supported_characteristics());
            let wheelchair_ok = !ride.wheelchair_required()
                || params.skip.wheelchair_capacity
                || vehicle.wheelchair_capacity() >= 1;

            compatibility[ride_index * vehicles.len() + vehicle_index] =
                supports_tags && wheelchair_ok;
        }
    }

    compatibility
}

fn build_ride_groups(problem: &Problem) -> (Vec<Vec<RideIdx>>, Vec<GroupIdx>) {
    let mut groups: Vec<Vec<RideIdx>> = Vec::new();
    let mut by_id: FxHashMap<&str, GroupIdx> = FxHashMap::default();
    let mut group_of_ride = Vec::with_capacity(problem.ride_requests().len());

    for (index, ride) in problem.ride_requests().iter().enumerate() {
        let group = *by_id.entry(ride.id()).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[group].push(RideIdx::new(index));
        group_of_ride.push(group);
    }

    (groups, group_of_ride)
}
