//! Per-suite state threaded through every step
//!
//! Holds the artifacts earlier steps produced (auth token, created booking
//! id) and renders `{{placeholder}}` templates from them.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

use crate::common::config::Credentials;
use crate::common::{Error, Result};

/// Keys a step may produce or consume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateKey {
    Token,
    BookingId,
}

impl StateKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateKey::Token => "token",
            StateKey::BookingId => "booking_id",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "token" => Some(StateKey::Token),
            "booking_id" => Some(StateKey::BookingId),
            _ => None,
        }
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State for one suite run
#[derive(Debug, Clone)]
pub struct SuiteState {
    values: HashMap<StateKey, Value>,
    credentials: Credentials,
}

impl SuiteState {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            values: HashMap::new(),
            credentials,
        }
    }

    pub fn get(&self, key: StateKey) -> Option<&Value> {
        self.values.get(&key)
    }

    pub fn set(&mut self, key: StateKey, value: Value) {
        tracing::debug!("state: {} = {}", key, value);
        self.values.insert(key, value);
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn contains(&self, key: StateKey) -> bool {
        self.values.contains_key(&key)
    }

    /// Get a value a step depends on
    pub fn require(&self, key: StateKey) -> Result<&Value> {
        self.get(key).ok_or_else(|| Error::missing_state(key))
    }

    /// Resolve a placeholder name to its JSON value
    fn lookup(&self, name: &str) -> Result<Value> {
        match name {
            "username" => Ok(Value::String(self.credentials.username.clone())),
            "password" => Ok(Value::String(self.credentials.password.clone())),
            _ => match StateKey::parse(name) {
                Some(key) => self.require(key).cloned(),
                None => Err(Error::Config(format!(
                    "Unknown placeholder '{{{{{}}}}}'. Supported: token, booking_id, username, password",
                    name
                ))),
            },
        }
    }

    /// Substitute every `{{name}}` in a string
    pub fn render(&self, template: &str) -> Result<String> {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            let Some(len) = rest[start + 2..].find("}}") else {
                break;
            };
            out.push_str(&rest[..start]);
            let name = rest[start + 2..start + 2 + len].trim();
            out.push_str(&plain(&self.lookup(name)?));
            rest = &rest[start + 2 + len + 2..];
        }

        out.push_str(rest);
        Ok(out)
    }

    /// Substitute placeholders inside a JSON body
    ///
    /// A string that is exactly one placeholder becomes the raw value, so
    /// `"{{booking_id}}"` stays a number.
    pub fn render_value(&self, value: &Value) -> Result<Value> {
        match value {
            Value::String(s) => {
                if let Some(name) = sole_placeholder(s) {
                    return self.lookup(name);
                }
                Ok(Value::String(self.render(s)?))
            }
            Value::Array(items) => items
                .iter()
                .map(|v| self.render_value(v))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            Value::Object(map) => {
                let mut out = serde_json::Map::with_capacity(map.len());
                for (k, v) in map {
                    out.insert(k.clone(), self.render_value(v)?);
                }
                Ok(Value::Object(out))
            }
            other => Ok(other.clone()),
        }
    }
}

/// Render a value for interpolation into text
fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn sole_placeholder(s: &str) -> Option<&str> {
    let inner = s.strip_prefix("{{")?.strip_suffix("}}")?;
    if inner.contains("{{") || inner.contains("}}") {
        return None;
    }
    Some(inner.trim())
}
