//! Test suite configuration types
//!
//! Defines the data structures for deserializing YAML test suites.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::http::HttpMethod;

use super::state::StateKey;

/// A complete test suite loaded from a YAML file
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct TestSuite {
    /// Name of the suite
    pub name: String,
    /// Optional description of what the suite verifies
    pub description: Option<String>,
    /// Hooks run once before any step (e.g., obtaining a token)
    #[serde(default)]
    pub before_all: Vec<TestStep>,
    /// The ordered steps
    pub steps: Vec<TestStep>,
    /// Best-effort cleanup run once after all steps
    #[serde(default)]
    pub after_all: Vec<TestStep>,
}

/// One request plus its expectations
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct TestStep {
    /// Human-readable step name
    pub name: String,
    /// State produced by earlier steps that this step consumes
    #[serde(default)]
    pub requires: Vec<StateKey>,
    /// The request to send
    pub request: RequestSpec,
    /// Expectations for the response
    pub expect: Option<ResponseExpectation>,
    /// Values to store for later steps: state key -> body path
    #[serde(default)]
    pub save: BTreeMap<StateKey, String>,
    /// Marks a step that pins lenient service behavior rather than a contract
    pub quirk: Option<String>,
}

impl TestStep {
    /// Everything the step needs from suite state, in a stable order
    pub fn required_keys(&self) -> Vec<StateKey> {
        let mut keys = self.requires.clone();
        if self.request.auth {
            keys.push(StateKey::Token);
        }
        keys.sort();
        keys.dedup();
        keys
    }
}

/// Request description
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct RequestSpec {
    /// HTTP method (default: GET)
    #[serde(default)]
    pub method: HttpMethod,
    /// Path relative to the base URL; may contain placeholders
    pub path: String,
    /// Extra headers; values may contain placeholders
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// JSON body; strings may contain placeholders
    pub body: Option<Value>,
    /// Send the suite token as `Cookie: token=<value>`
    #[serde(default)]
    pub auth: bool,
    /// Fail the step on any non-2xx status before expectations run
    #[serde(default = "default_fail_on_status_code")]
    pub fail_on_status_code: bool,
}

fn default_fail_on_status_code() -> bool {
    true
}

/// Expectations for a response
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct ResponseExpectation {
    /// Exact expected status
    pub status: Option<u16>,
    /// Status the response must not have
    pub status_not: Option<u16>,
    /// Assertions on the body
    #[serde(default)]
    pub body: Vec<BodyAssertion>,
}

/// Assertion on a value inside the response body
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct BodyAssertion {
    /// Dot-separated path (empty = whole body)
    #[serde(default)]
    pub path: String,
    /// Expected value (deep equality)
    pub equals: Option<Value>,
    /// Subset the value must contain
    pub includes: Option<Value>,
    /// Whether the path must exist (has-property)
    pub exists: Option<bool>,
    /// Whether the value must be an array
    pub is_array: Option<bool>,
    /// Minimum length of an array or string
    pub min_len: Option<usize>,
}
