use serde::{Deserialize, Serialize};

/// Rides needing an electric ramp take longer to board (see service-stop
/// times in the solver).
pub const ELECTRIC_RAMP_TAG: &str = "rampa_electrica";

/// Free-form accessibility tag; a ride is only served by vehicles that
/// support every tag it carries.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Characteristic(String);

impl Characteristic {
    pub fn new(tag: impl Into<String>) -> Self {
        Characteristic(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
