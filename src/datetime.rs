//! Timestamp codec for transition and reschedule-target instants.
//!
//! The surrounding system historically produced two encodings for the same
//! kind of value: a naive local form (`YYYY-MM-DD HH:mm:ss`, no offset) and
//! an explicit-offset form (`YYYY-MM-DDTHH:mm:ss±HH:mm`). The explicit
//! offset form round-trips unambiguously across client/server timezone
//! differences, so it is the canonical encoding for everything this crate
//! writes. Naive-local survives only as a documented legacy format, and
//! [`decode`] accepts both.

use chrono::{DateTime, FixedOffset, Local, LocalResult, NaiveDateTime, TimeZone, Timelike};
use thiserror::Error;

/// Canonical wire format: explicit UTC offset, second precision.
pub const EXPLICIT_OFFSET_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Legacy wire format: no offset, implicitly device-local time.
pub const NAIVE_LOCAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Which serialized form to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    ExplicitOffset,
    NaiveLocal,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateTimeError {
    #[error("Unparsable timestamp: {0:?}")]
    Unparsable(String),

    /// A naive wall-clock time that occurs twice locally (DST fall-back).
    #[error("Ambiguous local time: {0:?}")]
    AmbiguousLocal(String),

    /// A naive wall-clock time skipped locally (DST spring-forward).
    #[error("Nonexistent local time: {0:?}")]
    NonexistentLocal(String),
}

/// Current device-local instant, truncated to whole seconds so that every
/// persisted timestamp survives [`encode`]/[`decode`] unchanged.
pub fn now_local() -> DateTime<FixedOffset> {
    let now = Local::now();
    now.with_nanosecond(0).unwrap_or(now).fixed_offset()
}

/// Serialize an instant in the requested encoding.
pub fn encode(t: DateTime<FixedOffset>, encoding: Encoding) -> String {
    match encoding {
        Encoding::ExplicitOffset => t.format(EXPLICIT_OFFSET_FORMAT).to_string(),
        Encoding::NaiveLocal => t.format(NAIVE_LOCAL_FORMAT).to_string(),
    }
}

/// Serialize in the canonical explicit-offset encoding.
pub fn encode_canonical(t: DateTime<FixedOffset>) -> String {
    encode(t, Encoding::ExplicitOffset)
}

/// Parse either supported encoding back into an instant.
///
/// Naive-local input is interpreted in the device's current timezone.
/// Unparsable input is an error, never a silent default.
pub fn decode(s: &str) -> Result<DateTime<FixedOffset>, DateTimeError> {
    if let Ok(t) = DateTime::parse_from_str(s, EXPLICIT_OFFSET_FORMAT) {
        return Ok(t);
    }
    let naive = NaiveDateTime::parse_from_str(s, NAIVE_LOCAL_FORMAT)
        .map_err(|_| DateTimeError::Unparsable(s.to_string()))?;
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(t) => Ok(t.fixed_offset()),
        LocalResult::Ambiguous(_, _) => Err(DateTimeError::AmbiguousLocal(s.to_string())),
        LocalResult::None => Err(DateTimeError::NonexistentLocal(s.to_string())),
    }
}

/// Serde adapter: `Option<DateTime<FixedOffset>>` as a canonical string.
///
/// Used with `skip_serializing_if = "Option::is_none"` on every lifecycle
/// timestamp field, so absent values never reach the wire.
pub mod canonical_opt {
    use chrono::{DateTime, FixedOffset};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(
        value: &Option<DateTime<FixedOffset>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(t) => serializer.serialize_str(&super::encode_canonical(*t)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<FixedOffset>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            Some(s) => super::decode(&s).map(Some).map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn instant(offset_hours: i32) -> DateTime<FixedOffset> {
        let offset = FixedOffset::east_opt(offset_hours * 3600).unwrap();
        NaiveDate::from_ymd_opt(2026, 2, 3)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap()
            .and_local_timezone(offset)
            .unwrap()
    }

    #[test]
    fn canonical_form_carries_the_offset() {
        assert_eq!(encode_canonical(instant(-3)), "2026-02-03T14:30:00-03:00");
        assert_eq!(encode_canonical(instant(2)), "2026-02-03T14:30:00+02:00");
    }

    #[test]
    fn legacy_form_drops_the_offset() {
        assert_eq!(
            encode(instant(-3), Encoding::NaiveLocal),
            "2026-02-03 14:30:00"
        );
    }

    #[test]
    fn explicit_offset_round_trips() {
        let t = instant(-3);
        assert_eq!(decode(&encode_canonical(t)).unwrap(), t);
    }

    #[test]
    fn naive_local_round_trips_in_device_timezone() {
        // A local instant encoded without offset must come back as the same
        // instant once reinterpreted locally.
        let t = now_local();
        let decoded = decode(&encode(t, Encoding::NaiveLocal)).unwrap();
        assert_eq!(decoded, t);
    }

    #[test]
    fn garbage_is_an_error_not_a_default() {
        assert!(matches!(
            decode("03/02/2026 14:30"),
            Err(DateTimeError::Unparsable(_))
        ));
        assert!(decode("").is_err());
    }

    #[test]
    fn now_local_has_whole_seconds() {
        assert_eq!(now_local().nanosecond(), 0);
    }

    #[test]
    fn canonical_opt_skips_absent_values() {
        #[derive(serde::Serialize)]
        struct Probe {
            #[serde(
                skip_serializing_if = "Option::is_none",
                with = "super::canonical_opt"
            )]
            at: Option<DateTime<FixedOffset>>,
        }
        let empty = serde_json::to_string(&Probe { at: None }).unwrap();
        assert_eq!(empty, "{}");
        let set = serde_json::to_string(&Probe {
            at: Some(instant(-3)),
        })
        .unwrap();
        assert_eq!(set, "{\"at\":\"2026-02-03T14:30:00-03:00\"}");
    }
}
