//! Checks against captured HTTP responses
//!
//! [`Response`] is a plain record filled in by whatever HTTP client the
//! caller uses; no request is ever sent from here.

use dm_core::{value, Pattern, Value};
use serde::{Deserialize, Serialize};
use serde_json::Map;

use crate::assert::Assert;

pub const STATUS_ROOT: &str = "STATUS";
pub const HEADER_ROOT: &str = "HEADER";
pub const BODY_ROOT: &str = "BODY";

/// Response from an API call, capturing everything a check may need
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
    pub raw_body: String,
}

impl Response {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set a JSON body, keeping its text form in `raw_body`
    pub fn with_json(mut self, body: Value) -> Self {
        self.raw_body = body.to_string();
        self.body = Some(body);
        self
    }

    /// Set a raw body, decoding it as JSON when possible
    pub fn with_text(mut self, raw: impl Into<String>) -> Self {
        self.raw_body = raw.into();
        self.body = serde_json::from_str(&self.raw_body).ok();
        self
    }

    /// Headers as an object keyed by lower-cased name.
    ///
    /// Repeated headers are joined with ", ".
    pub fn header_map(&self) -> Value {
        let mut map = Map::new();
        for (name, value) in &self.headers {
            let name = name.to_ascii_lowercase();
            match map.get_mut(&name) {
                Some(Value::String(existing)) => {
                    existing.push_str(", ");
                    existing.push_str(value);
                }
                _ => {
                    map.insert(name, Value::String(value.clone()));
                }
            }
        }
        Value::Object(map)
    }
}

/// Chained checks on one [`Response`], recorded on the owning [`Assert`]
pub struct ResponseCheck<'a> {
    t: &'a mut Assert,
    response: &'a Response,
    failed: bool,
}

impl<'a> ResponseCheck<'a> {
    pub(crate) fn new(t: &'a mut Assert, response: &'a Response) -> Self {
        Self {
            t,
            response,
            failed: false,
        }
    }

    pub fn cmp_status(&mut self, expected: impl Into<Pattern>) -> &mut Self {
        let status = Value::from(self.response.status);
        self.check(STATUS_ROOT, &status, expected.into())
    }

    /// Compare the header object, e.g. with `ops::contains_key("etag")`
    pub fn cmp_header(&mut self, expected: impl Into<Pattern>) -> &mut Self {
        let headers = self.response.header_map();
        self.check(HEADER_ROOT, &headers, expected.into())
    }

    /// Compare the decoded JSON body; a missing or non-JSON body fails
    pub fn cmp_json_body(&mut self, expected: impl Into<Pattern>) -> &mut Self {
        let response = self.response;
        match &response.body {
            Some(body) => self.check(BODY_ROOT, body, expected.into()),
            None => {
                self.t.record(format!(
                    "{}: expected a JSON body, got {}",
                    BODY_ROOT,
                    value::render(&Value::String(response.raw_body.clone()))
                ));
                self.failed = true;
                self
            }
        }
    }

    /// Compare the raw body text
    pub fn cmp_body(&mut self, expected: impl Into<Pattern>) -> &mut Self {
        let raw = Value::String(self.response.raw_body.clone());
        self.check(BODY_ROOT, &raw, expected.into())
    }

    /// Whether any check on this response failed
    pub fn failed(&self) -> bool {
        self.failed
    }

    fn check(&mut self, root: &str, actual: &Value, expected: Pattern) -> &mut Self {
        if !self.t.cmp_rooted(root, actual, &expected) {
            self.failed = true;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContextConfig;
    use dm_core::ops;
    use serde_json::json;

    fn created() -> Response {
        Response::new(201)
            .with_header("Content-Type", "application/json")
            .with_header("Set-Cookie", "a=1")
            .with_header("set-cookie", "b=2")
            .with_json(json!({"id": 7, "name": "Bob", "age": 41}))
    }

    #[test]
    fn test_header_map_lowercases_and_joins() {
        assert_eq!(
            created().header_map(),
            json!({"content-type": "application/json", "set-cookie": "a=1, b=2"})
        );
    }

    #[test]
    fn test_chained_checks_pass() {
        let mut t = Assert::with_config("create", ContextConfig::new());
        let response = created();
        let failed = t
            .response(&response)
            .cmp_status(201)
            .cmp_header(ops::contains_key("content-type"))
            .cmp_json_body(Pattern::partial([("name", "Bob")]))
            .failed();
        assert!(!failed);
        assert!(!t.failed());
        assert_eq!(t.checks(), 3);
    }

    #[test]
    fn test_failures_use_response_roots() {
        let mut t = Assert::with_config("create", ContextConfig::new());
        let response = created();
        let failed = t
            .response(&response)
            .cmp_status(200)
            .cmp_json_body(Pattern::partial([("name", "Alice")]))
            .failed();
        assert!(failed);
        assert!(t.failures()[0].report.contains("STATUS"));
        assert!(t.failures()[1].report.contains("BODY.name"));
    }

    #[test]
    fn test_text_body() {
        let mut t = Assert::with_config("text", ContextConfig::new());
        let response = Response::new(500).with_text("internal error");
        assert!(response.body.is_none());

        let check_failed = t
            .response(&response)
            .cmp_body(ops::has_suffix("error"))
            .cmp_json_body(ops::ignore())
            .failed();
        assert!(check_failed);
        assert_eq!(t.failures().len(), 1);
        assert!(t.failures()[0].report.contains("expected a JSON body"));
    }
}
