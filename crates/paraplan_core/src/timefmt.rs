//! Seconds-of-day values travel on the wire as `"HH:MM:SS"` strings.

pub type Seconds = i64;

pub fn format(seconds: Seconds) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        seconds % 3600 / 60,
        seconds % 60
    )
}

pub fn parse(value: &str) -> Result<Seconds, String> {
    let mut parts = value.split(':');

    let (Some(hours), Some(minutes), Some(seconds), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(format!("expected HH:MM:SS, got {value:?}"));
    };

    let hours: Seconds = hours
        .parse()
        .map_err(|_| format!("invalid hours in {value:?}"))?;
    let minutes: Seconds = minutes
        .parse()
        .map_err(|_| format!("invalid minutes in {value:?}"))?;
    let seconds: Seconds = seconds
        .parse()
        .map_err(|_| format!("invalid seconds in {value:?}"))?;

    if !(0..60).contains(&minutes) || !(0..60).contains(&seconds) || hours < 0 {
        return Err(format!("out-of-range time component in {value:?}"));
    }

    Ok(hours * 3600 + minutes * 60 + seconds)
}

pub mod seconds_of_day {
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};

    use super::Seconds;

    pub fn serialize<S>(value: &Seconds, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format(*value))
    }

    struct SecondsVisitor;

    impl Visitor<'_> for SecondsVisitor {
        type Value = Seconds;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("an \"HH:MM:SS\" string or a number of seconds")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            super::parse(value).map_err(de::Error::custom)
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
            Ok(value as Seconds)
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
            Ok(value)
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Seconds, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(SecondsVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format() {
        assert_eq!(format(0), "00:00:00");
        assert_eq!(format(3661), "01:01:01");
        assert_eq!(format(86_400), "24:00:00");
    }

    #[test]
    fn test_parse() {
        assert_eq!(parse("00:00:00").unwrap(), 0);
        assert_eq!(parse("01:01:01").unwrap(), 3661);
        assert_eq!(parse("24:00:00").unwrap(), 86_400);
        assert!(parse("7:61:00").is_err());
        assert!(parse("07:00").is_err());
        assert!(parse("abc").is_err());
    }

    #[test]
    fn test_round_trip() {
        for seconds in [0, 1, 59, 60, 3599, 3600, 43_200, 86_399, 86_400] {
            assert_eq!(parse(&format(seconds)).unwrap(), seconds);
        }
    }
}
