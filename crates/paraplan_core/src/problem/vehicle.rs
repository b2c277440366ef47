use fxhash::FxHashSet;
use serde::{Deserialize, Serialize};

use super::{Characteristic, Depot, TimeWindow};

/// One vehicle of the fleet. `wheel_chair_capacity` keeps the historical
/// wire spelling.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Vehicle {
    id: String,
    #[serde(default)]
    seat_capacity: i64,
    #[serde(rename = "wheel_chair_capacity", default)]
    wheelchair_capacity: i64,
    #[serde(default)]
    time_window: TimeWindow,
    depot_start: Depot,
    depot_end: Depot,
    #[serde(default)]
    supported_characteristics: FxHashSet<Characteristic>,
    #[serde(default)]
    with_rest: bool,
    #[serde(default)]
    active_ride_id_pre_boarded: Option<String>,
}

impl Vehicle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn seat_capacity(&self) -> i64 {
        self.seat_capacity
    }

    pub fn wheelchair_capacity(&self) -> i64 {
        self.wheelchair_capacity
    }

    pub fn time_window(&self) -> &TimeWindow {
        &self.time_window
    }

    pub fn depot_start(&self) -> &Depot {
        &self.depot_start
    }

    pub fn depot_end(&self) -> &Depot {
        &self.depot_end
    }

    pub fn supported_characteristics(&self) -> &FxHashSet<Characteristic> {
        &self.supported_characteristics
    }

    pub fn with_rest(&self) -> bool {
        self.with_rest
    }

    pub fn active_ride_id_pre_boarded(&self) -> Option<&str> {
        self.active_ride_id_pre_boarded.as_deref()
    }
}

#[derive(Default)]
pub struct VehicleBuilder {
    id: Option<String>,
    seat_capacity: i64,
    wheelchair_capacity: i64,
    time_window: TimeWindow,
    depot_start: Option<Depot>,
    depot_end: Option<Depot>,
    supported_characteristics: FxHashSet<Characteristic>,
    with_rest: bool,
    active_ride_id_pre_boarded: Option<String>,
}

impl VehicleBuilder {
    pub fn set_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn set_seat_capacity(mut self, capacity: i64) -> Self {
        self.seat_capacity = capacity;
        self
    }

    pub fn set_wheelchair_capacity(mut self, capacity: i64) -> Self {
        self.wheelchair_capacity = capacity;
        self
    }

    pub fn set_time_window(mut self, time_window: TimeWindow) -> Self {
        self.time_window = time_window;
        self
    }

    pub fn set_depot_start(mut self, depot: Depot) -> Self {
        self.depot_start = Some(depot);
        self
    }

    pub fn set_depot_end(mut self, depot: Depot) -> Self {
        self.depot_end = Some(depot);
        self
    }

    pub fn add_supported_characteristic(mut self, tag: impl Into<String>) -> Self {
        self.supported_characteristics
            .insert(Characteristic::new(tag));
        self
    }

    pub fn set_with_rest(mut self, with_rest: bool) -> Self {
        self.with_rest = with_rest;
        self
    }

    pub fn set_active_ride_id_pre_boarded(mut self, ride_id: impl Into<String>) -> Self {
        self.active_ride_id_pre_boarded = Some(ride_id.into());
        self
    }

    pub fn build(self) -> Vehicle {
        Vehicle {
            id: self.id.expect("Expected vehicle id"),
            seat_capacity: self.seat_capacity,
            wheelchair_capacity: self.wheelchair_capacity,
            time_window: self.time_window,
            depot_start: self.depot_start.expect("Expected start depot"),
            depot_end: self.depot_end.expect("Expected end depot"),
            supported_characteristics: self.supported_characteristics,
            with_rest: self.with_rest,
            active_ride_id_pre_boarded: self.active_ride_id_pre_boarded,
        }
    }
}
