use fxhash::FxHashSet;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use super::{Characteristic, Coordinate, TimeWindow};

/// Leg of the day the ride belongs to. The wire value is matched
/// case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RideDirection {
    Going,
    Return,
}

impl<'de> Deserialize<'de> for RideDirection {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        match value.to_uppercase().as_str() {
            "GOING" => Ok(RideDirection::Going),
            "RETURN" => Ok(RideDirection::Return),
            other => Err(de::Error::custom(format!(
                "unknown ride direction {other:?}"
            ))),
        }
    }
}

/// Pickup or delivery endpoint of a ride as supplied by the client.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RideStop {
    coordinates: Coordinate,
    #[serde(default)]
    address: String,
    #[serde(default)]
    time_window: TimeWindow,
    #[serde(default)]
    stop_id: Option<String>,
}

impl RideStop {
    pub fn new(
        coordinates: Coordinate,
        address: impl Into<String>,
        time_window: TimeWindow,
        stop_id: Option<String>,
    ) -> Self {
        RideStop {
            coordinates,
            address: address.into(),
            time_window,
            stop_id,
        }
    }

    pub fn coordinates(&self) -> Coordinate {
        self.coordinates
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn time_window(&self) -> &TimeWindow {
        &self.time_window
    }

    pub fn stop_id(&self) -> Option<&str> {
        self.stop_id.as_deref()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RideRequest {
    id: String,
    user_id: String,
    #[serde(default)]
    has_companion: bool,
    #[serde(default)]
    wheelchair_required: bool,
    pickup: Option<RideStop>,
    delivery: Option<RideStop>,
    direction: RideDirection,
    #[serde(default)]
    characteristics: FxHashSet<Characteristic>,
}

impl RideRequest {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn has_companion(&self) -> bool {
        self.has_companion
    }

    pub fn wheelchair_required(&self) -> bool {
        self.wheelchair_required
    }

    pub fn pickup(&self) -> Option<&RideStop> {
        self.pickup.as_ref()
    }

    pub fn delivery(&self) -> Option<&RideStop> {
        self.delivery.as_ref()
    }

    pub fn direction(&self) -> RideDirection {
        self.direction
    }

    pub fn characteristics(&self) -> &FxHashSet<Characteristic> {
        &self.characteristics
    }

    /// Seats consumed while the ride is on board: the passenger unless
    /// travelling in their wheelchair, plus the companion.
    pub fn seat_demand(&self) -> i64 {
        i64::from(!self.wheelchair_required) + i64::from(self.has_companion)
    }

    pub fn wheelchair_demand(&self) -> i64 {
        i64::from(self.wheelchair_required)
    }
}

#[derive(Default)]
pub struct RideRequestBuilder {
    id: Option<String>,
    user_id: Option<String>,
    has_companion: bool,
    wheelchair_required: bool,
    pickup: Option<RideStop>,
    delivery: Option<RideStop>,
    direction: Option<RideDirection>,
    characteristics: FxHashSet<Characteristic>,
}

impl RideRequestBuilder {
    pub fn set_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn set_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn set_has_companion(mut self, has_companion: bool) -> Self {
        self.has_companion = has_companion;
        self
    }

    pub fn set_wheelchair_required(mut self, wheelchair_required: bool) -> Self {
        self.wheelchair_required = wheelchair_required;
        self
    }

    pub fn set_pickup(mut self, pickup: RideStop) -> Self {
        self.pickup = Some(pickup);
        self
    }

    pub fn set_delivery(mut self, delivery: RideStop) -> Self {
        self.delivery = Some(delivery);
        self
    }

    pub fn set_direction(mut self, direction: RideDirection) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn add_characteristic(mut self, tag: impl Into<String>) -> Self {
        self.characteristics.insert(Characteristic::new(tag));
        self
    }

    pub fn build(self) -> RideRequest {
        RideRequest {
            id: self.id.expect("Expected ride id"),
            user_id: self.user_id.expect("Expected user id"),
            has_companion: self.has_companion,
            wheelchair_required: self.wheelchair_required,
            pickup: self.pickup,
            delivery: self.delivery,
            direction: self.direction.unwrap_or(RideDirection::Going),
            characteristics: self.characteristics,
        }
    }
}
