use reqwest::header::{HeaderMap, LOCATION};
use serde_json::Value;

use crate::errors::{CheckError, Result};

/// Id of a created resource from `Location: /api/v2.0/registries/12`.
pub(crate) fn id_from_location(headers: &HeaderMap, url: &str) -> Result<i64> {
    let missing = || CheckError::MissingLocation {
        url: url.to_string(),
    };

    let location = headers
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(missing)?;

    location
        .rsplit('/')
        .next()
        .and_then(|segment| segment.parse::<i64>().ok())
        .ok_or_else(missing)
}

/// Id stored under `field` in a JSON response body. Accepts integers,
/// whole-number floats and numeric strings.
pub(crate) fn id_from_body(body: &str, field: &str, url: &str) -> Result<i64> {
    let missing = || CheckError::MissingBodyId {
        url: url.to_string(),
        field: field.to_string(),
    };

    let json: Value = serde_json::from_str(body).map_err(|_| missing())?;

    match json.get(field) {
        Some(Value::Number(n)) => match n.as_i64() {
            Some(id) => Ok(id),
            None => n
                .as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
                .ok_or_else(missing),
        },
        Some(Value::String(s)) => s.trim().parse().map_err(|_| missing()),
        _ => Err(missing()),
    }
}
