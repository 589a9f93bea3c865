//! Response assertions
//!
//! Every failure names the body path and the concrete expected and actual
//! values.

use serde_json::Value;

use crate::common::{Error, Result};
use crate::http::ApiResponse;

use super::config::{BodyAssertion, ResponseExpectation};

/// Check a response against a step's expectations
pub fn check_response(response: &ApiResponse, expect: &ResponseExpectation) -> Result<()> {
    if let Some(expected) = expect.status {
        if response.status != expected {
            return Err(Error::TestAssertion(format!(
                "Expected status {}, got {}. Body: {}",
                expected,
                response.status,
                preview(&response.body)
            )));
        }
    }

    if let Some(forbidden) = expect.status_not {
        if response.status == forbidden {
            return Err(Error::TestAssertion(format!(
                "Expected status other than {}, got {}",
                forbidden, response.status
            )));
        }
    }

    for assertion in &expect.body {
        check_body(&response.body, assertion)?;
    }

    Ok(())
}

/// Check a single body assertion
pub fn check_body(body: &Value, assertion: &BodyAssertion) -> Result<()> {
    let label = path_label(&assertion.path);
    let actual = lookup(body, &assertion.path);

    if let Some(should_exist) = assertion.exists {
        if should_exist != actual.is_some() {
            return Err(Error::TestAssertion(if should_exist {
                format!("Expected {} to exist. Body: {}", label, preview(body))
            } else {
                format!("Expected {} to be absent, got {}", label, display(actual))
            }));
        }
    }

    let needs_value = assertion.equals.is_some()
        || assertion.includes.is_some()
        || assertion.is_array.is_some()
        || assertion.min_len.is_some();
    if !needs_value {
        return Ok(());
    }

    let Some(actual) = actual else {
        return Err(Error::TestAssertion(format!(
            "{} not found. Body: {}",
            label,
            preview(body)
        )));
    };

    if let Some(expected) = &assertion.equals {
        if !values_match(actual, expected) {
            return Err(Error::TestAssertion(format!(
                "{}: expected {}, got {}",
                label, expected, actual
            )));
        }
    }

    if let Some(subset) = &assertion.includes {
        deep_includes(actual, subset).map_err(|m| {
            Error::TestAssertion(format!(
                "{}: expected to include {} but {}",
                label,
                subset,
                m.describe()
            ))
        })?;
    }

    if let Some(should_be_array) = assertion.is_array {
        if should_be_array != actual.is_array() {
            return Err(Error::TestAssertion(format!(
                "{}: expected {}an array, got {}",
                label,
                if should_be_array { "" } else { "not " },
                type_name(actual)
            )));
        }
    }

    if let Some(min) = assertion.min_len {
        let len = match actual {
            Value::Array(items) => items.len(),
            Value::String(s) => s.chars().count(),
            Value::Object(map) => map.len(),
            other => {
                return Err(Error::TestAssertion(format!(
                    "{}: expected something with a length, got {}",
                    label,
                    type_name(other)
                )))
            }
        };
        if len < min {
            return Err(Error::TestAssertion(format!(
                "{}: expected length >= {}, got {}",
                label, min, len
            )));
        }
    }

    Ok(())
}

/// Resolve a dot-separated path; numeric segments index arrays
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Where a deep inclusion check diverged
#[derive(Debug, PartialEq)]
pub struct Mismatch {
    pub key: Option<String>,
    pub expected: Value,
    pub actual: Option<Value>,
}

impl Mismatch {
    pub fn describe(&self) -> String {
        match (&self.key, &self.actual) {
            (Some(key), Some(actual)) => format!(
                "'{}' was {} (expected {})",
                key, actual, self.expected
            ),
            (Some(key), None) => format!("'{}' is missing", key),
            (None, Some(actual)) => format!("value was {}", actual),
            (None, None) => "value is missing".to_string(),
        }
    }
}

/// Deep partial inclusion
///
/// Every key of `subset` must be present in `actual` with a deep-equal
/// value. Extra keys in `actual` are ignored. A non-object subset is
/// compared with deep equality.
pub fn deep_includes(actual: &Value, subset: &Value) -> std::result::Result<(), Mismatch> {
    let Value::Object(expected) = subset else {
        return if values_match(actual, subset) {
            Ok(())
        } else {
            Err(Mismatch {
                key: None,
                expected: subset.clone(),
                actual: Some(actual.clone()),
            })
        };
    };

    let Value::Object(actual) = actual else {
        return Err(Mismatch {
            key: None,
            expected: subset.clone(),
            actual: Some(actual.clone()),
        });
    };

    for (key, want) in expected {
        match actual.get(key) {
            Some(got) if values_match(got, want) => {}
            got => {
                return Err(Mismatch {
                    key: Some(key.clone()),
                    expected: want.clone(),
                    actual: got.cloned(),
                })
            }
        }
    }
    Ok(())
}

/// Deep equality where numbers compare by value
pub fn values_match(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => {
            if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
                a == b
            } else if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
                a == b
            } else {
                a.as_f64() == b.as_f64()
            }
        }
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_match(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(k, v)| b.get(k).is_some_and(|w| values_match(v, w)))
        }
        _ => actual == expected,
    }
}

fn path_label(path: &str) -> String {
    if path.is_empty() {
        "body".to_string()
    } else {
        format!("body.{}", path)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn display(value: Option<&Value>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "nothing".to_string())
}

fn preview(body: &Value) -> String {
    let text = body.to_string();
    if text.chars().count() > 200 {
        format!("{}...", text.chars().take(200).collect::<String>())
    } else {
        text
    }
}
