//! Lenient field decoders for backend payloads.
//!
//! The series endpoint is produced by a dataframe export, so numbers may arrive
//! as strings, `null`, or be absent. These decoders never fail on a wrong type;
//! they yield `None` and let callers pick a default.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accept a JSON number or numeric string; anything else becomes `None`.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Value = Deserialize::deserialize(deserializer)?;
    Ok(value_to_f64(&value))
}

/// Like [`lenient_f64`], truncated to whole seconds.
pub fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Value = Deserialize::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(ref num) if num.is_i64() => num.as_i64(),
        other => value_to_f64(&other).map(|secs| secs.trunc() as i64),
    })
}

fn value_to_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(num) => num.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "lenient_f64")]
        value: Option<f64>,
        #[serde(default, deserialize_with = "lenient_i64")]
        secs: Option<i64>,
    }

    fn probe(raw: &str) -> Probe {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn numbers_and_numeric_strings_decode() {
        assert_eq!(probe(r#"{"value": 1.5}"#).value, Some(1.5));
        assert_eq!(probe(r#"{"value": " 2.25 "}"#).value, Some(2.25));
        assert_eq!(probe(r#"{"secs": 1700000000}"#).secs, Some(1_700_000_000));
        assert_eq!(probe(r#"{"secs": 1700000000.9}"#).secs, Some(1_700_000_000));
    }

    #[test]
    fn wrong_types_become_none() {
        assert_eq!(probe(r#"{"value": null}"#).value, None);
        assert_eq!(probe(r#"{"value": "NaN"}"#).value, None);
        assert_eq!(probe(r#"{"value": "abc"}"#).value, None);
        assert_eq!(probe(r#"{"value": [1]}"#).value, None);
        assert_eq!(probe(r#"{"secs": true}"#).secs, None);
    }

    #[test]
    fn missing_fields_default_to_none() {
        let p = probe("{}");
        assert_eq!(p.value, None);
        assert_eq!(p.secs, None);
    }
}
