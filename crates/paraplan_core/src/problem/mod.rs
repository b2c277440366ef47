mod characteristic;
mod coordinate;
mod depot;
mod ride;
mod time_window;
mod vehicle;

pub use characteristic::{Characteristic, ELECTRIC_RAMP_TAG};
pub use coordinate::Coordinate;
pub use depot::Depot;
pub use ride::{RideDirection, RideRequest, RideRequestBuilder, RideStop};
pub use time_window::{DAY_SECONDS, TimeWindow};
pub use vehicle::{Vehicle, VehicleBuilder};

use serde::{Deserialize, Serialize};

use crate::error::ProblemError;

/// One day of paratransit work: the fleet and the rides to schedule.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Problem {
    #[serde(default)]
    vehicles: Vec<Vehicle>,
    #[serde(default)]
    ride_requests: Vec<RideRequest>,
}

impl Problem {
    pub fn new(vehicles: Vec<Vehicle>, ride_requests: Vec<RideRequest>) -> Self {
        Problem {
            vehicles,
            ride_requests,
        }
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn ride_requests(&self) -> &[RideRequest] {
        &self.ride_requests
    }

    /// Validation runs before any matrix call; every failure maps to a
    /// stable error kind at the HTTP boundary.
    pub fn validate(&self) -> Result<(), ProblemError> {
        for vehicle in &self.vehicles {
            if vehicle.seat_capacity() < 0 || vehicle.wheelchair_capacity() < 0 {
                return Err(ProblemError::NegativeCapacity(vehicle.id().to_owned()));
            }

            vehicle
                .time_window()
                .validate(&format!("vehicle {}", vehicle.id()))?;
            vehicle
                .depot_start()
                .time_window()
                .validate(&format!("depot {}", vehicle.depot_start().id()))?;
            vehicle
                .depot_end()
                .time_window()
                .validate(&format!("depot {}", vehicle.depot_end().id()))?;

            if let Some(ride_id) = vehicle.active_ride_id_pre_boarded()
                && !self.ride_requests.iter().any(|ride| ride.id() == ride_id)
            {
                return Err(ProblemError::InvalidInput(format!(
                    "vehicle {} references unknown pre-boarded ride {ride_id}",
                    vehicle.id()
                )));
            }
        }

        for ride in &self.ride_requests {
            let pickup = ride.pickup().ok_or_else(|| {
                ProblemError::InvalidInput(format!("ride {} is missing its pickup", ride.id()))
            })?;
            let delivery = ride.delivery().ok_or_else(|| {
                ProblemError::InvalidInput(format!("ride {} is missing its delivery", ride.id()))
            })?;

            pickup
                .time_window()
                .validate(&format!("ride {} pickup", ride.id()))?;
            delivery
                .time_window()
                .validate(&format!("ride {} delivery", ride.id()))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn depot(id: &str) -> Depot {
        Depot::new(id, Coordinate::new(0.0, 0.0), "", TimeWindow::default())
    }

    fn stop() -> RideStop {
        RideStop::new(Coordinate::new(0.0, 1.0), "", TimeWindow::default(), None)
    }

    #[test]
    fn test_validate_accepts_well_formed_problem() {
        let vehicle = VehicleBuilder::default()
            .set_id("v1")
            .set_seat_capacity(4)
            .set_depot_start(depot("d1"))
            .set_depot_end(depot("d2"))
            .build();

        let ride = RideRequestBuilder::default()
            .set_id("r1")
            .set_user_id("u1")
            .set_pickup(stop())
            .set_delivery(stop())
            .build();

        let problem = Problem::new(vec![vehicle], vec![ride]);
        assert!(problem.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_negative_capacity() {
        let vehicle = VehicleBuilder::default()
            .set_id("v1")
            .set_seat_capacity(-1)
            .set_depot_start(depot("d1"))
            .set_depot_end(depot("d2"))
            .build();

        let problem = Problem::new(vec![vehicle], vec![]);
        assert_eq!(
            problem.validate(),
            Err(ProblemError::NegativeCapacity("v1".to_owned()))
        );
    }

    #[test]
    fn test_validate_rejects_inverted_window() {
        let vehicle = VehicleBuilder::default()
            .set_id("v1")
            .set_time_window(TimeWindow::new(7200, 3600))
            .set_depot_start(depot("d1"))
            .set_depot_end(depot("d2"))
            .build();

        let problem = Problem::new(vec![vehicle], vec![]);
        assert!(matches!(
            problem.validate(),
            Err(ProblemError::InvalidTimeWindow(_))
        ));
    }

    #[test]
    fn test_validate_rejects_missing_delivery() {
        let vehicle = VehicleBuilder::default()
            .set_id("v1")
            .set_depot_start(depot("d1"))
            .set_depot_end(depot("d2"))
            .build();

        let ride = RideRequestBuilder::default()
            .set_id("r1")
            .set_user_id("u1")
            .set_pickup(stop())
            .build();

        let problem = Problem::new(vec![vehicle], vec![ride]);
        assert!(matches!(
            problem.validate(),
            Err(ProblemError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_validate_rejects_unknown_pre_boarded_ride() {
        let vehicle = VehicleBuilder::default()
            .set_id("v1")
            .set_depot_start(depot("d1"))
            .set_depot_end(depot("d2"))
            .set_active_ride_id_pre_boarded("ghost")
            .build();

        let problem = Problem::new(vec![vehicle], vec![]);
        assert!(matches!(
            problem.validate(),
            Err(ProblemError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_problem_json_field_names() {
        let json = r#"{
            "vehicles": [{
                "id": "v1",
                "seat_capacity": 4,
                "wheel_chair_capacity": 1,
                "time_window": {"start": "06:00:00", "end": "14:00:00"},
                "depot_start": {
                    "id": "d1",
                    "coordinates": {"latitude": -34.9, "longitude": -56.2},
                    "address": "Base"
                },
                "depot_end": {
                    "id": "d1",
                    "coordinates": {"latitude": -34.9, "longitude": -56.2}
                },
                "supported_characteristics": ["rampa_electrica"],
                "with_rest": true
            }],
            "ride_requests": [{
                "id": "r1",
                "user_id": "u1",
                "has_companion": true,
                "wheelchair_required": false,
                "direction": "going",
                "pickup": {
                    "coordinates": {"latitude": -34.91, "longitude": -56.21},
                    "time_window": {"start": "08:00:00", "end": "09:00:00"},
                    "address": "Pickup corner"
                },
                "delivery": {
                    "coordinates": {"latitude": -34.92, "longitude": -56.22},
                    "time_window": {"start": "09:00:00", "end": "10:00:00"}
                },
                "characteristics": []
            }]
        }"#;

        let problem: Problem = serde_json::from_str(json).unwrap();
        assert!(problem.validate().is_ok());

        let vehicle = &problem.vehicles()[0];
        assert_eq!(vehicle.seat_capacity(), 4);
        assert_eq!(vehicle.wheelchair_capacity(), 1);
        assert!(vehicle.with_rest());
        assert_eq!(vehicle.time_window().start(), 6 * 3600);

        let ride = &problem.ride_requests()[0];
        assert_eq!(ride.direction(), RideDirection::Going);
        assert!(ride.has_companion());
        assert_eq!(ride.pickup().unwrap().time_window().end(), 9 * 3600);
    }
}
