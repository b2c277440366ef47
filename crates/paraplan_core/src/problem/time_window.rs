use serde::{Deserialize, Serialize};

use crate::Seconds;
use crate::error::ProblemError;
use crate::timefmt::seconds_of_day;

pub const DAY_SECONDS: Seconds = 86_400;

/// Closed interval of seconds-of-day. Defaults to the whole day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct TimeWindow {
    #[serde(default, with = "seconds_of_day")]
    start: Seconds,
    #[serde(default = "day_end", with = "seconds_of_day")]
    end: Seconds,
}

fn day_end() -> Seconds {
    DAY_SECONDS
}

impl Default for TimeWindow {
    fn default() -> Self {
        TimeWindow {
            start: 0,
            end: DAY_SECONDS,
        }
    }
}

impl TimeWindow {
    pub fn new(start: Seconds, end: Seconds) -> Self {
        TimeWindow { start, end }
    }

    pub fn start(&self) -> Seconds {
        self.start
    }

    pub fn end(&self) -> Seconds {
        self.end
    }

    pub fn contains(&self, time: Seconds) -> bool {
        self.start <= time && time <= self.end
    }

    pub fn intersect(&self, other: &TimeWindow) -> TimeWindow {
        TimeWindow {
            start: self.start.max(other.start),
            end: self.end.min(other.end),
        }
    }

    pub fn validate(&self, context: &str) -> Result<(), ProblemError> {
        if self.start > self.end {
            return Err(ProblemError::InvalidTimeWindow(context.to_owned()));
        }

        if self.start < 0 || self.end > DAY_SECONDS {
            return Err(ProblemError::InvalidInput(format!(
                "time window for {context} lies outside the day"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_spans_the_day() {
        let window = TimeWindow::default();
        assert_eq!(window.start(), 0);
        assert_eq!(window.end(), DAY_SECONDS);
    }

    #[test]
    fn test_validate() {
        assert!(TimeWindow::new(0, 0).validate("t").is_ok());
        assert!(TimeWindow::new(3600, 7200).validate("t").is_ok());
        assert!(TimeWindow::new(7200, 3600).validate("t").is_err());
        assert!(TimeWindow::new(0, DAY_SECONDS + 1).validate("t").is_err());
    }

    #[test]
    fn test_intersect() {
        let shift = TimeWindow::new(3600, 36_000);
        let depot = TimeWindow::new(0, 18_000);
        assert_eq!(shift.intersect(&depot), TimeWindow::new(3600, 18_000));
    }

    #[test]
    fn test_wire_format() {
        let window: TimeWindow =
            serde_json::from_str(r#"{"start": "08:30:00", "end": "10:00:00"}"#).unwrap();
        assert_eq!(window, TimeWindow::new(30_600, 36_000));

        let json = serde_json::to_string(&window).unwrap();
        assert_eq!(json, r#"{"start":"08:30:00","end":"10:00:00"}"#);
    }

    #[test]
    fn test_defaults_when_fields_missing() {
        let window: TimeWindow = serde_json::from_str("{}").unwrap();
        assert_eq!(window, TimeWindow::default());
    }
}
