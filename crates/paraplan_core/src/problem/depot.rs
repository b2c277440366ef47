use serde::{Deserialize, Serialize};

use super::{Coordinate, TimeWindow};

/// Start or end location of exactly one vehicle, with its own permitted
/// time window.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Depot {
    id: String,
    coordinates: Coordinate,
    #[serde(default)]
    address: String,
    #[serde(default)]
    time_window: TimeWindow,
}

impl Depot {
    pub fn new(
        id: impl Into<String>,
        coordinates: Coordinate,
        address: impl Into<String>,
        time_window: TimeWindow,
    ) -> Self {
        Depot {
            id: id.into(),
            coordinates,
            address: address.into(),
            time_window,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
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
}
