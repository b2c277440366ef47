//! Problem normalizer: assigns every stop a dense node index and derives
//! the vectors the solver consumes.
//!
//! Node numbering is deterministic: vehicle `k` owns nodes `2k` (start
//! depot) and `2k + 1` (end depot); ride `r` owns `2V + 2r` (pickup) and
//! `2V + 2r + 1` (delivery).

use serde::Serialize;

use crate::error::ProblemError;
use crate::index_newtype;
use crate::problem::{Coordinate, Problem, TimeWindow, Vehicle};

index_newtype!(
    /// Position of a task in the dense node numbering.
    NodeIdx
);
index_newtype!(VehicleIdx);
index_newtype!(RideIdx);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskKind {
    DepotStart,
    DepotEnd,
    Pickup,
    Delivery,
}

impl TaskKind {
    pub fn is_depot(&self) -> bool {
        matches!(self, TaskKind::DepotStart | TaskKind::DepotEnd)
    }
}

/// One routable stop. Rides are referenced by index into the problem's
/// ride list; depots carry no ride.
#[derive(Debug, Clone)]
pub struct PickupDeliveryTask {
    kind: TaskKind,
    coordinates: Coordinate,
    time_window: TimeWindow,
    address: String,
    stop_id: Option<String>,
    node: NodeIdx,
    ride: Option<RideIdx>,
}

impl PickupDeliveryTask {
    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn coordinates(&self) -> Coordinate {
        self.coordinates
    }

    pub fn time_window(&self) -> &TimeWindow {
        &self.time_window
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn stop_id(&self) -> Option<&str> {
        self.stop_id.as_deref()
    }

    pub fn node(&self) -> NodeIdx {
        self.node
    }

    pub fn ride(&self) -> Option<RideIdx> {
        self.ride
    }
}

/// Read-only, numerically indexed form of a [`Problem`]. Owns the task
/// arena; everything else is an index into it.
pub struct NormalizedProblem {
    tasks: Vec<PickupDeliveryTask>,
    coordinates: Vec<Coordinate>,
    seat_demands: Vec<i64>,
    wheelchair_demands: Vec<i64>,
    seat_capacities: Vec<i64>,
    wheelchair_capacities: Vec<i64>,
    vehicle_starts: Vec<NodeIdx>,
    vehicle_ends: Vec<NodeIdx>,
    ride_pairs: Vec<(NodeIdx, NodeIdx)>,
    pre_boarded: Vec<Option<RideIdx>>,
}

impl NormalizedProblem {
    pub fn num_nodes(&self) -> usize {
        self.tasks.len()
    }

    pub fn num_vehicles(&self) -> usize {
        self.vehicle_starts.len()
    }

    pub fn num_rides(&self) -> usize {
        self.ride_pairs.len()
    }

    /// Index of the first non-depot node.
    pub fn first_task_node(&self) -> usize {
        self.num_vehicles() * 2
    }

    pub fn tasks(&self) -> &[PickupDeliveryTask] {
        &self.tasks
    }

    pub fn task(&self, node: NodeIdx) -> &PickupDeliveryTask {
        &self.tasks[node.get()]
    }

    pub fn coordinates(&self) -> &[Coordinate] {
        &self.coordinates
    }

    pub fn seat_demand(&self, node: NodeIdx) -> i64 {
        self.seat_demands[node.get()]
    }

    pub fn wheelchair_demand(&self, node: NodeIdx) -> i64 {
        self.wheelchair_demands[node.get()]
    }

    pub fn seat_demands(&self) -> &[i64] {
        &self.seat_demands
    }

    pub fn wheelchair_demands(&self) -> &[i64] {
        &self.wheelchair_demands
    }

    pub fn seat_capacity(&self, vehicle: VehicleIdx) -> i64 {
        self.seat_capacities[vehicle.get()]
    }

    pub fn wheelchair_capacity(&self, vehicle: VehicleIdx) -> i64 {
        self.wheelchair_capacities[vehicle.get()]
    }

    pub fn vehicle_start(&self, vehicle: VehicleIdx) -> NodeIdx {
        self.vehicle_starts[vehicle.get()]
    }

    pub fn vehicle_end(&self, vehicle: VehicleIdx) -> NodeIdx {
        self.vehicle_ends[vehicle.get()]
    }

    pub fn ride_pair(&self, ride: RideIdx) -> (NodeIdx, NodeIdx) {
        self.ride_pairs[ride.get()]
    }

    pub fn ride_pairs(&self) -> &[(NodeIdx, NodeIdx)] {
        &self.ride_pairs
    }

    /// Ride already on board vehicle `k` when its shift starts, if any.
    pub fn pre_boarded(&self, vehicle: VehicleIdx) -> Option<RideIdx> {
        self.pre_boarded[vehicle.get()]
    }

    pub fn vehicles_iter(&self) -> impl Iterator<Item = VehicleIdx> {
        (0..self.num_vehicles()).map(VehicleIdx::new)
    }

    pub fn rides_iter(&self) -> impl Iterator<Item = RideIdx> {
        (0..self.num_rides()).map(RideIdx::new)
    }
}

pub fn normalize(problem: &Problem) -> Result<NormalizedProblem, ProblemError> {
    problem.validate()?;

    let num_vehicles = problem.vehicles().len();
    let num_rides = problem.ride_requests().len();
    let num_nodes = 2 * num_vehicles + 2 * num_rides;

    let mut tasks = Vec::with_capacity(num_nodes);
    let mut seat_demands = vec![0_i64; num_nodes];
    let mut wheelchair_demands = vec![0_i64; num_nodes];

    for vehicle in problem.vehicles() {
        for (depot, kind) in [
            (vehicle.depot_start(), TaskKind::DepotStart),
            (vehicle.depot_end(), TaskKind::DepotEnd),
        ] {
            tasks.push(PickupDeliveryTask {
                kind,
                coordinates: depot.coordinates(),
                time_window: *depot.time_window(),
                address: depot.address().to_owned(),
                stop_id: Some(depot.id().to_owned()),
                node: NodeIdx::new(tasks.len()),
                ride: None,
            });
        }
    }

    let mut ride_pairs = Vec::with_capacity(num_rides);

    for (ride_index, ride) in problem.ride_requests().iter().enumerate() {
        let ride_idx = RideIdx::new(ride_index);

        // validate() guarantees both endpoints are present
        let pickup = ride
            .pickup()
            .ok_or_else(|| ProblemError::InvalidInput(format!("ride {} pickup", ride.id())))?;
        let delivery = ride
            .delivery()
            .ok_or_else(|| ProblemError::InvalidInput(format!("ride {} delivery", ride.id())))?;

        let pickup_node = NodeIdx::new(tasks.len());
        let delivery_node = NodeIdx::new(tasks.len() + 1);

        for (stop, kind, node) in [
            (pickup, TaskKind::Pickup, pickup_node),
            (delivery, TaskKind::Delivery, delivery_node),
        ] {
            tasks.push(PickupDeliveryTask {
                kind,
                coordinates: stop.coordinates(),
                time_window: *stop.time_window(),
                address: stop.address().to_owned(),
                stop_id: stop.stop_id().map(str::to_owned),
                node,
                ride: Some(ride_idx),
            });
        }

        seat_demands[pickup_node.get()] = ride.seat_demand();
        seat_demands[delivery_node.get()] = -ride.seat_demand();
        wheelchair_demands[pickup_node.get()] = ride.wheelchair_demand();
        wheelchair_demands[delivery_node.get()] = -ride.wheelchair_demand();

        ride_pairs.push((pickup_node, delivery_node));
    }

    let pre_boarded = problem
        .vehicles()
        .iter()
        .map(|vehicle| {
            vehicle.active_ride_id_pre_boarded().map(|ride_id| {
                let index = problem
                    .ride_requests()
                    .iter()
                    .position(|ride| ride.id() == ride_id)
                    .expect("validated pre-boarded ride id");
                RideIdx::new(index)
            })
        })
        .collect();

    Ok(NormalizedProblem {
        coordinates: tasks.iter().map(|task| task.coordinates()).collect(),
        seat_demands,
        wheelchair_demands,
        seat_capacities: problem
            .vehicles()
            .iter()
            .map(Vehicle::seat_capacity)
            .collect(),
        wheelchair_capacities: problem
            .vehicles()
            .iter()
            .map(Vehicle::wheelchair_capacity)
            .collect(),
        vehicle_starts: (0..num_vehicles).map(|k| NodeIdx::new(2 * k)).collect(),
        vehicle_ends: (0..num_vehicles).map(|k| NodeIdx::new(2 * k + 1)).collect(),
        ride_pairs,
        pre_boarded,
        tasks,
    })
}
