//! Mutable search state: one visit sequence per vehicle plus the
//! assignment status of every ride. All mutation goes through candidate
//! evaluation; a route is only committed once its schedule is feasible.

use paraplan_core::normalize::{NodeIdx, RideIdx, VehicleIdx};

use crate::model::{GroupIdx, RoutingModel};
use crate::state::schedule::{Schedule, evaluate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RideAssignment {
    Dropped,
    Served { vehicle: VehicleIdx },
    /// Pickup performed, passenger carried to the vehicle's end depot.
    DepotDropped { vehicle: VehicleIdx },
}

#[derive(Clone)]
pub(crate) struct WorkingSolution {
    routes: Vec<Vec<NodeIdx>>,
    schedules: Vec<Schedule>,
    assignments: Vec<RideAssignment>,
}

impl WorkingSolution {
    /// Initial state: everything dropped except pre-boarded deliveries,
    /// which are hard commitments on their vehicle.
    pub fn new(model: &RoutingModel) -> Result<Self, String> {
        let norm = model.normalized();

        let mut solution = WorkingSolution {
            routes: vec![Vec::new(); norm.num_vehicles()],
            schedules: norm
                .vehicles_iter()
                .map(|vehicle| Schedule::empty(model, vehicle))
                .collect(),
            assignments: vec![RideAssignment::Dropped; norm.num_rides()],
        };

        for vehicle in norm.vehicles_iter() {
            if let Some(ride) = model.locked_delivery(vehicle) {
                let (_, delivery) = norm.ride_pair(ride);
                let route = vec![delivery];

                let Some(schedule) = evaluate(model, vehicle, &route) else {
                    let ride_id = model.problem().ride_requests()[ride.get()].id();
                    return Err(format!(
                        "pre-boarded ride {ride_id} cannot be delivered within the shift of \
                         vehicle {}",
                        model.problem().vehicles()[vehicle.get()].id()
                    ));
                };

                solution.routes[vehicle.get()] = route;
                solution.schedules[vehicle.get()] = schedule;
                solution.assignments[ride.get()] = RideAssignment::Served { vehicle };
            }
        }

        Ok(solution)
    }

    pub fn route(&self, vehicle: VehicleIdx) -> &[NodeIdx] {
        &self.routes[vehicle.get()]
    }

    pub fn schedule(&self, vehicle: VehicleIdx) -> &Schedule {
        &self.schedules[vehicle.get()]
    }

    pub fn assignment(&self, ride: RideIdx) -> RideAssignment {
        self.assignments[ride.get()]
    }

    pub fn is_group_active(&self, model: &RoutingModel, group: GroupIdx) -> bool {
        model
            .group(group)
            .iter()
            .any(|&ride| self.assignments[ride.get()] != RideAssignment::Dropped)
    }

    pub fn is_group_dropped(&self, model: &RoutingModel, group: GroupIdx) -> bool {
        model
            .group(group)
            .iter()
            .all(|&ride| self.assignments[ride.get()] == RideAssignment::Dropped)
    }

    /// Primary objective: distance plus fleet-span cost, soft delivery
    /// lateness, and the penalties for dropped or depot-dropped rides.
    pub fn objective(&self, model: &RoutingModel) -> i64 {
        let params = model.params();

        let mut total_distance = 0_i64;
        let mut max_distance = 0_i64;
        let mut lateness = 0_i64;

        for schedule in &self.schedules {
            total_distance = total_distance.saturating_add(schedule.distance);
            max_distance = max_distance.max(schedule.distance);
            lateness = lateness.saturating_add(schedule.soft_lateness);
        }

        let mut cost = 0_i64;
        if model.distance_cost_enabled() {
            cost = total_distance
                .saturating_add(params.span_cost_coefficient.saturating_mul(max_distance));
        }
        cost = cost.saturating_add(lateness.saturating_mul(params.soft_delivery_penalty));

        for assignment in &self.assignments {
            match assignment {
                RideAssignment::Dropped => {
                    cost = cost.saturating_add(model.drop_penalty());
                }
                RideAssignment::DepotDropped { .. } => {
                    cost = cost.saturating_add(model.depot_drop_penalty());
                }
                RideAssignment::Served { .. } => {}
            }
        }

        cost
    }

    /// Drops every non-locked member of the group. Removal only shortens
    /// schedules, so re-evaluation is expected to succeed.
    pub fn remove_group(&mut self, model: &RoutingModel, group: GroupIdx) -> bool {
        let norm = model.normalized();

        for &ride in model.group(group) {
            if model.locked_vehicle_of(ride).is_some() {
                continue;
            }

            let vehicle = match self.assignments[ride.get()] {
                RideAssignment::Dropped => continue,
                RideAssignment::Served { vehicle } | RideAssignment::DepotDropped { vehicle } => {
                    vehicle
                }
            };

            let (pickup, delivery) = norm.ride_pair(ride);
            let route: Vec<NodeIdx> = self.routes[vehicle.get()]
                .iter()
                .copied()
                .filter(|&node| node != pickup && node != delivery)
                .collect();

            let Some(schedule) = evaluate(model, vehicle, &route) else {
                return false;
            };

            self.routes[vehicle.get()] = route;
            self.schedules[vehicle.get()] = schedule;
            self.assignments[ride.get()] = RideAssignment::Dropped;
        }

        true
    }

    /// Cheapest feasible placement of one ride over every compatible
    /// vehicle and position pair; falls back to a depot drop when that is
    /// enabled. Returns false when nothing fits.
    pub fn insert_ride_best(&mut self, model: &RoutingModel, ride: RideIdx) -> bool {
        if self.assignments[ride.get()] != RideAssignment::Dropped {
            return true;
        }

        let norm = model.normalized();
        let (pickup, delivery) = norm.ride_pair(ride);

        let mut best: Option<(i64, VehicleIdx, Vec<NodeIdx>, Schedule, RideAssignment)> = None;

        for vehicle in norm.vehicles_iter() {
            if !model.is_compatible(ride, vehicle) {
                continue;
            }

            let route = &self.routes[vehicle.get()];
            let len = route.len();

            for pickup_pos in 0..=len {
                for delivery_pos in pickup_pos..=len {
                    let mut candidate = route.clone();
                    candidate.insert(pickup_pos, pickup);
                    candidate.insert(delivery_pos + 1, delivery);

                    let Some(schedule) = evaluate(model, vehicle, &candidate) else {
                        continue;
                    };

                    let assignment = RideAssignment::Served { vehicle };
                    let cost = self.objective_with(model, vehicle, &schedule, ride, assignment);

                    if best.as_ref().is_none_or(|(best_cost, ..)| cost < *best_cost) {
                        best = Some((cost, vehicle, candidate, schedule, assignment));
                    }
                }
            }

            if model.params().allow_depot_drop {
                for pickup_pos in 0..=len {
                    let mut candidate = route.clone();
                    candidate.insert(pickup_pos, pickup);

                    let Some(schedule) = evaluate(model, vehicle, &candidate) else {
                        continue;
                    };

                    let assignment = RideAssignment::DepotDropped { vehicle };
                    let cost = self.objective_with(model, vehicle, &schedule, ride, assignment);

                    if best.as_ref().is_none_or(|(best_cost, ..)| cost < *best_cost) {
                        best = Some((cost, vehicle, candidate, schedule, assignment));
                    }
                }
            }
        }

        let Some((_, vehicle, route, schedule, assignment)) = best else {
            return false;
        };

        self.routes[vehicle.get()] = route;
        self.schedules[vehicle.get()] = schedule;
        self.assignments[ride.get()] = assignment;
        true
    }

    /// All-or-nothing insertion of every dropped member of a group.
    pub fn insert_group_best(&mut self, model: &RoutingModel, group: GroupIdx) -> bool {
        let snapshot = self.clone();

        for &ride in model.group(group) {
            if model.locked_vehicle_of(ride).is_some() {
                continue;
            }
            if !self.insert_ride_best(model, ride) {
                *self = snapshot;
                return false;
            }
        }

        true
    }

    /// Arcs traversed by the current routes, including depot legs.
    pub fn arcs(&self, model: &RoutingModel) -> Vec<(usize, usize)> {
        let norm = model.normalized();
        let mut arcs = Vec::new();

        for vehicle in norm.vehicles_iter() {
            let route = &self.routes[vehicle.get()];
            if route.is_empty() {
                continue;
            }

            let mut current = norm.vehicle_start(vehicle);
            for &node in route {
                arcs.push((current.get(), node.get()));
                current = node;
            }
            arcs.push((current.get(), norm.vehicle_end(vehicle).get()));
        }

        arcs
    }

    /// Objective as if `vehicle` ran `schedule` and `ride` took the given
    /// assignment; used to rank insertion candidates.
    fn objective_with(
        &self,
        model: &RoutingModel,
        vehicle: VehicleIdx,
        schedule: &Schedule,
        ride: RideIdx,
        assignment: RideAssignment,
    ) -> i64 {
        let params = model.params();

        let mut total_distance = 0_i64;
        let mut max_distance = 0_i64;
        let mut lateness = 0_i64;

        for (index, current) in self.schedules.iter().enumerate() {
            let current = if index == vehicle.get() {
                schedule
            } else {
                current
            };
            total_distance = total_distance.saturating_add(current.distance);
            max_distance = max_distance.max(current.distance);
            lateness = lateness.saturating_add(current.soft_lateness);
        }

        let mut cost = 0_i64;
        if model.distance_cost_enabled() {
            cost = total_distance
                .saturating_add(params.span_cost_coefficient.saturating_mul(max_distance));
        }
        cost = cost.saturating_add(lateness.saturating_mul(params.soft_delivery_penalty));

        for (index, current) in self.assignments.iter().enumerate() {
            let current = if index == ride.get() {
                assignment
            } else {
                *current
            };
            match current {
                RideAssignment::Dropped => cost = cost.saturating_add(model.drop_penalty()),
                RideAssignment::DepotDropped { .. } => {
                    cost = cost.saturating_add(model.depot_drop_penalty())
                }
                RideAssignment::Served { .. } => {}
            }
        }

        cost
    }
}
