//! Type conversions used by the strict accessor variants.
//!
//! Responsibilities:
//! - Convert stored values (strings, numbers, booleans, arrays, maps) into
//!   the caller's requested type, reporting failures instead of zeroing.
//!
//! Does NOT handle:
//! - Path resolution or zero-value fallbacks (see engine.rs); the zero-value
//!   getters are thin `unwrap_or_default` wrappers around these functions.
//!
//! Invariants:
//! - Numeric strings parse to the target numeric type.
//! - RFC 3339-like strings parse to UTC timestamps; bare integers are Unix
//!   seconds.
//! - Duration strings use `1h2m3s` unit notation; bare integers are
//!   nanoseconds.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value;
use thiserror::Error;

use crate::value::Aggregate;

/// Failure to convert a present value into the requested type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CastError {
    /// The stored value's shape cannot represent the requested type.
    #[error("cannot cast {actual} to {expected}")]
    Incompatible {
        expected: &'static str,
        actual: &'static str,
    },

    /// The stored value has a castable shape but an unparseable content.
    #[error("invalid {expected} value {value:?}")]
    Invalid {
        expected: &'static str,
        value: String,
    },
}

fn shape_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn incompatible(expected: &'static str, value: &Value) -> CastError {
    CastError::Incompatible {
        expected,
        actual: shape_of(value),
    }
}

fn invalid(expected: &'static str, value: impl ToString) -> CastError {
    CastError::Invalid {
        expected,
        value: value.to_string(),
    }
}

pub fn to_string(value: &Value) -> Result<String, CastError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(incompatible("string", other)),
    }
}

pub fn to_bool(value: &Value) -> Result<bool, CastError> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => Ok(n.as_f64().is_some_and(|f| f != 0.0)),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "1" | "t" | "true" => Ok(true),
            "0" | "f" | "false" => Ok(false),
            _ => Err(invalid("bool", s)),
        },
        other => Err(incompatible("bool", other)),
    }
}

pub fn to_i64(value: &Value) -> Result<i64, CastError> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i)
            } else if let Some(f) = n.as_f64() {
                Ok(f as i64)
            } else {
                Err(invalid("integer", n))
            }
        }
        Value::String(s) => s.trim().parse().map_err(|_| invalid("integer", s)),
        Value::Bool(b) => Ok(i64::from(*b)),
        other => Err(incompatible("integer", other)),
    }
}

pub fn to_u64(value: &Value) -> Result<u64, CastError> {
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Ok(u)
            } else if let Some(f) = n.as_f64().filter(|f| *f >= 0.0) {
                Ok(f as u64)
            } else {
                Err(invalid("unsigned integer", n))
            }
        }
        Value::String(s) => s.trim().parse().map_err(|_| invalid("unsigned integer", s)),
        Value::Bool(b) => Ok(u64::from(*b)),
        other => Err(incompatible("unsigned integer", other)),
    }
}

pub fn to_f64(value: &Value) -> Result<f64, CastError> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| invalid("float", n)),
        Value::String(s) => s.trim().parse().map_err(|_| invalid("float", s)),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        other => Err(incompatible("float", other)),
    }
}

/// Accepted string layouts, tried in order after RFC 3339.
const DATE_TIME_LAYOUTS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

pub fn to_datetime(value: &Value) -> Result<DateTime<Utc>, CastError> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
                return Ok(parsed.with_timezone(&Utc));
            }
            for layout in DATE_TIME_LAYOUTS {
                if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, layout) {
                    return Ok(naive.and_utc());
                }
            }
            if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
                return Ok(date.and_time(NaiveTime::MIN).and_utc());
            }
            Err(invalid("time", s))
        }
        Value::Number(n) => {
            let secs = n.as_i64().ok_or_else(|| invalid("time", n))?;
            DateTime::from_timestamp(secs, 0).ok_or_else(|| invalid("time", n))
        }
        other => Err(incompatible("time", other)),
    }
}

pub fn to_duration(value: &Value) -> Result<Duration, CastError> {
    match value {
        Value::String(s) => parse_duration(s),
        // Bare numbers are nanosecond counts.
        Value::Number(n) => {
            let nanos = n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
                .ok_or_else(|| invalid("duration", n))?;
            Ok(Duration::from_nanos(nanos))
        }
        other => Err(incompatible("duration", other)),
    }
}

/// Parse a unit-suffixed duration string such as `"1h2m3s"` or `"150ms"`.
///
/// Units: `ns`, `us`/`µs`, `ms`, `s`, `m`, `h`. Fractions are allowed
/// (`"1.5h"`); a bare `"0"` is the zero duration.
fn parse_duration(input: &str) -> Result<Duration, CastError> {
    let trimmed = input.trim();
    if trimmed == "0" {
        return Ok(Duration::ZERO);
    }
    if trimmed.is_empty() {
        return Err(invalid("duration", input));
    }

    let mut rest = trimmed;
    let mut total = Duration::ZERO;
    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !c.is_ascii_digit() && c != '.')
            .ok_or_else(|| invalid("duration", input))?;
        if digits == 0 {
            return Err(invalid("duration", input));
        }
        let amount: f64 = rest[..digits]
            .parse()
            .map_err(|_| invalid("duration", input))?;
        rest = &rest[digits..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let nanos_per_unit = match &rest[..unit_len] {
            "ns" => 1.0,
            "us" | "\u{00b5}s" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 6e10,
            "h" => 3.6e12,
            _ => return Err(invalid("duration", input)),
        };
        rest = &rest[unit_len..];
        total += Duration::from_nanos((amount * nanos_per_unit) as u64);
    }
    Ok(total)
}

pub fn to_string_vec(value: &Value) -> Result<Vec<String>, CastError> {
    match value {
        Value::Array(items) => items.iter().map(to_string).collect(),
        Value::String(s) => Ok(s.split_whitespace().map(str::to_string).collect()),
        other => Err(incompatible("string array", other)),
    }
}

pub fn to_i64_vec(value: &Value) -> Result<Vec<i64>, CastError> {
    match value {
        Value::Array(items) => items.iter().map(to_i64).collect(),
        other => Err(incompatible("integer array", other)),
    }
}

pub fn to_map(value: &Value) -> Result<Aggregate, CastError> {
    match value {
        Value::Object(map) => Ok(map.clone()),
        other => Err(incompatible("map", other)),
    }
}

pub fn to_string_map(value: &Value) -> Result<HashMap<String, String>, CastError> {
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(key, nested)| Ok((key.clone(), to_string(nested)?)))
            .collect(),
        other => Err(incompatible("string map", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_string_handles_scalars() {
        assert_eq!(to_string(&json!("x")).unwrap(), "x");
        assert_eq!(to_string(&json!(8080)).unwrap(), "8080");
        assert_eq!(to_string(&json!(true)).unwrap(), "true");
        assert!(to_string(&json!({ "a": 1 })).is_err());
    }

    #[test]
    fn test_to_bool_accepts_common_spellings() {
        for truthy in [json!(true), json!("true"), json!("T"), json!("1"), json!(2)] {
            assert!(to_bool(&truthy).unwrap(), "{truthy:?}");
        }
        for falsy in [json!(false), json!("false"), json!("0"), json!(0)] {
            assert!(!to_bool(&falsy).unwrap(), "{falsy:?}");
        }
        assert!(to_bool(&json!("yes-ish")).is_err());
    }

    #[test]
    fn test_numeric_strings_parse() {
        assert_eq!(to_i64(&json!("9090")).unwrap(), 9090);
        assert_eq!(to_i64(&json!(-3)).unwrap(), -3);
        assert_eq!(to_u64(&json!("18")).unwrap(), 18);
        assert!(to_u64(&json!(-1)).is_err());
        assert_eq!(to_f64(&json!("2.5")).unwrap(), 2.5);
        assert!(to_i64(&json!("not a number")).is_err());
    }

    #[test]
    fn test_to_datetime_accepts_rfc3339_and_date_only() {
        let ts = to_datetime(&json!("2025-06-01T12:30:00Z")).unwrap();
        assert_eq!(ts.to_rfc3339(), "2025-06-01T12:30:00+00:00");

        let midnight = to_datetime(&json!("2025-06-01")).unwrap();
        assert_eq!(midnight.to_rfc3339(), "2025-06-01T00:00:00+00:00");

        let from_unix = to_datetime(&json!(0)).unwrap();
        assert_eq!(from_unix, DateTime::UNIX_EPOCH);

        assert!(to_datetime(&json!("yesterday-ish")).is_err());
    }

    #[test]
    fn test_duration_strings() {
        assert_eq!(
            to_duration(&json!("1h2m3s")).unwrap(),
            Duration::from_secs(3723)
        );
        assert_eq!(
            to_duration(&json!("150ms")).unwrap(),
            Duration::from_millis(150)
        );
        assert_eq!(
            to_duration(&json!("1.5h")).unwrap(),
            Duration::from_secs(5400)
        );
        assert_eq!(to_duration(&json!("0")).unwrap(), Duration::ZERO);
        assert_eq!(to_duration(&json!(1_000)).unwrap(), Duration::from_nanos(1_000));
        assert!(to_duration(&json!("10 parsecs")).is_err());
        assert!(to_duration(&json!("h")).is_err());
    }

    #[test]
    fn test_collection_casts() {
        assert_eq!(
            to_string_vec(&json!(["a", 1, true])).unwrap(),
            vec!["a", "1", "true"]
        );
        assert_eq!(to_string_vec(&json!("a b c")).unwrap(), vec!["a", "b", "c"]);
        assert_eq!(to_i64_vec(&json!([1, "2", 3])).unwrap(), vec![1, 2, 3]);
        assert!(to_i64_vec(&json!("1,2")).is_err());

        let map = to_string_map(&json!({ "user": "admin", "retries": 3 })).unwrap();
        assert_eq!(map["user"], "admin");
        assert_eq!(map["retries"], "3");
    }
}
