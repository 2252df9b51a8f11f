//! Assertion context
//!
//! [`Assert`] runs comparisons for one named test, keeps every failure
//! report and accumulates captured values. In *require* mode the first
//! failure panics instead.
//!
//! A single test can mix both behaviours through [`Assert::fatal`]:
//!
//! ```ignore
//! let created = store.create(&bob);
//! t.fatal().cmp_no_error(&created);   // stops the test on error
//! t.cmp(&created?, Pattern::partial([("id", ops::not_zero())]));
//! ```

use dm_core::{compare_serialize, Captures, Pattern, PatternError};
use dm_json::Params;
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

use crate::config::ContextConfig;
use crate::response::{Response, ResponseCheck};

/// A failed check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// Name of the test (`parent/child` for sub-tests)
    pub test: String,
    /// Rendered mismatch report
    pub report: String,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.test, self.report.trim_end())
    }
}

/// Runs checks for a single test and records their outcome
#[derive(Debug)]
pub struct Assert {
    name: String,
    config: ContextConfig,
    root_name: String,
    checks: usize,
    failures: Vec<Failure>,
    captures: Captures,
    /// Set while a [`Fatal`] check runs
    enforcing: bool,
}

impl Assert {
    /// Context configured from the environment
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, ContextConfig::from_env())
    }

    /// Context that panics on its first failure
    pub fn require(name: impl Into<String>) -> Self {
        Self::with_config(name, ContextConfig::from_env().with_fail_fast(true))
    }

    pub fn with_config(name: impl Into<String>, config: ContextConfig) -> Self {
        let root_name = config.root_name.clone();
        Self {
            name: name.into(),
            config,
            root_name,
            checks: 0,
            failures: Vec::new(),
            captures: Captures::new(),
            enforcing: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Rename the root of failure paths for the following checks
    pub fn root_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.root_name = name.into();
        self
    }

    /// Compare `actual` against `expected`; returns whether it matched
    pub fn cmp<T, P>(&mut self, actual: &T, expected: P) -> bool
    where
        T: Serialize + ?Sized,
        P: Into<Pattern>,
    {
        let root = self.root_name.clone();
        self.cmp_rooted(&root, actual, &expected.into())
    }

    /// Compare `actual` against a strict JSON template
    pub fn cmp_json<T>(&mut self, actual: &T, template: &str, params: &Params) -> bool
    where
        T: Serialize + ?Sized,
    {
        match dm_json::json(template, params) {
            Ok(pattern) => {
                let root = self.root_name.clone();
                self.cmp_rooted(&root, actual, &pattern)
            }
            Err(err) => {
                self.checks += 1;
                self.record(format!("{}: invalid template: {}", self.root_name, err));
                false
            }
        }
    }

    /// Check that `result` is `Ok`
    pub fn cmp_no_error<T, E: fmt::Display>(&mut self, result: &Result<T, E>) -> bool {
        self.checks += 1;
        match result {
            Ok(_) => true,
            Err(err) => {
                self.record(format!("{}: expected no error, got: {}", self.root_name, err));
                false
            }
        }
    }

    /// Check that `result` is `Err`
    pub fn cmp_error<T: fmt::Debug, E>(&mut self, result: &Result<T, E>) -> bool {
        self.checks += 1;
        match result {
            Ok(value) => {
                self.record(format!(
                    "{}: expected an error, got Ok({:?})",
                    self.root_name, value
                ));
                false
            }
            Err(_) => true,
        }
    }

    /// Check that `result` is `Err` and that its message matches `expected`
    pub fn cmp_error_matching<T, E, P>(&mut self, result: &Result<T, E>, expected: P) -> bool
    where
        T: fmt::Debug,
        E: fmt::Display,
        P: Into<Pattern>,
    {
        match result {
            Ok(value) => {
                self.checks += 1;
                self.record(format!(
                    "{}: expected an error, got Ok({:?})",
                    self.root_name, value
                ));
                false
            }
            Err(err) => {
                let root = self.root_name.clone();
                self.cmp_rooted(&root, &err.to_string(), &expected.into())
            }
        }
    }

    /// Checks that stop the test on failure, recorded with the others
    pub fn fatal(&mut self) -> Fatal<'_> {
        Fatal { t: self }
    }

    /// Run a named sub-test; its failures and captures fold into this one
    pub fn run(&mut self, name: &str, f: impl FnOnce(&mut Assert)) -> bool {
        let mut child = Assert::with_config(format!("{}/{}", self.name, name), self.config.clone());
        child.root_name = self.root_name.clone();
        f(&mut child);

        let passed = !child.failed();
        debug!(test = %child.name, passed, "sub-test finished");
        self.checks += child.checks;
        self.failures.extend(child.failures);
        self.captures.merge(child.captures);
        passed
    }

    /// Checks against a captured HTTP response
    pub fn response<'a>(&'a mut self, response: &'a Response) -> ResponseCheck<'a> {
        ResponseCheck::new(self, response)
    }

    /// Values captured by successful comparisons so far
    pub fn captures(&self) -> &Captures {
        &self.captures
    }

    pub fn checks(&self) -> usize {
        self.checks
    }

    pub fn failed(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    /// Print a summary of this test to stdout
    pub fn print_summary(&self) {
        if self.failed() {
            println!(
                "❌ {} - {}/{} checks failed",
                self.name,
                self.failures.len(),
                self.checks
            );
            for failure in &self.failures {
                println!("{}", failure.report.trim_end());
            }
        } else {
            println!("✅ {} - {} checks passed", self.name, self.checks);
        }
    }

    /// Consume the context, panicking with every report if a check failed
    pub fn finish(self) {
        if self.failed() {
            let reports: Vec<String> = self.failures.iter().map(Failure::to_string).collect();
            panic!(
                "{} check(s) failed in {}:\n{}",
                self.failures.len(),
                self.name,
                reports.join("\n")
            );
        }
    }

    pub(crate) fn cmp_rooted<T>(&mut self, root: &str, actual: &T, expected: &Pattern) -> bool
    where
        T: Serialize + ?Sized,
    {
        self.checks += 1;
        let options = self.config.compare_options(root);
        match compare_serialize(actual, expected, &options) {
            Ok(result) if result.matched() => {
                self.captures.merge(result.captures);
                true
            }
            Ok(result) => {
                self.record(result.report(self.config.max_errors));
                false
            }
            Err(err @ PatternError::Serialize { .. }) => {
                self.record(format!("{}: cannot serialize actual value: {}", root, err));
                false
            }
            Err(err) => {
                self.record(format!("{}: {}", root, err));
                false
            }
        }
    }

    /// Run `check` with fail-fast forced on
    fn enforced<R>(&mut self, check: impl FnOnce(&mut Assert) -> R) -> R {
        let previous = std::mem::replace(&mut self.enforcing, true);
        let outcome = check(self);
        self.enforcing = previous;
        outcome
    }

    pub(crate) fn record(&mut self, report: String) {
        warn!(test = %self.name, "check failed\n{}", report.trim_end());
        let failure = Failure {
            test: self.name.clone(),
            report,
        };
        let message = failure.to_string();
        self.failures.push(failure);
        if self.config.fail_fast || self.enforcing {
            self.enforcing = false;
            panic!("{}", message);
        }
    }
}

/// Require view of an [`Assert`], returned by [`Assert::fatal`].
///
/// A failing check is recorded on the owning context, then panics.
pub struct Fatal<'a> {
    t: &'a mut Assert,
}

impl Fatal<'_> {
    pub fn cmp<T, P>(&mut self, actual: &T, expected: P) -> bool
    where
        T: Serialize + ?Sized,
        P: Into<Pattern>,
    {
        self.t.enforced(|t| t.cmp(actual, expected))
    }

    pub fn cmp_json<T>(&mut self, actual: &T, template: &str, params: &Params) -> bool
    where
        T: Serialize + ?Sized,
    {
        self.t.enforced(|t| t.cmp_json(actual, template, params))
    }

    pub fn cmp_no_error<T, E: fmt::Display>(&mut self, result: &Result<T, E>) -> bool {
        self.t.enforced(|t| t.cmp_no_error(result))
    }

    pub fn cmp_error<T: fmt::Debug, E>(&mut self, result: &Result<T, E>) -> bool {
        self.t.enforced(|t| t.cmp_error(result))
    }

    pub fn cmp_error_matching<T, E, P>(&mut self, result: &Result<T, E>, expected: P) -> bool
    where
        T: fmt::Debug,
        E: fmt::Display,
        P: Into<Pattern>,
    {
        self.t.enforced(|t| t.cmp_error_matching(result, expected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dm_core::ops;
    use serde_json::json;
    use std::panic::{self, AssertUnwindSafe};

    fn assert_ctx(name: &str) -> Assert {
        Assert::with_config(name, ContextConfig::new())
    }

    #[test]
    fn test_cmp_records_failures() {
        let mut t = assert_ctx("person");
        assert!(t.cmp(&json!({"age": 41}), Pattern::partial([("age", ops::between(40, 45))])));
        assert!(!t.cmp(&json!({"age": 41}), Pattern::partial([("age", ops::gt(50))])));

        assert_eq!(t.checks(), 2);
        assert_eq!(t.failures().len(), 1);
        assert_eq!(t.failures()[0].test, "person");
        assert!(t.failures()[0].report.contains("DATA.age"));
    }

    #[test]
    fn test_root_name_applies_to_following_checks() {
        let mut t = assert_ctx("root");
        t.root_name("PERSON");
        t.cmp(&json!(1), 2);
        assert!(t.failures()[0].report.contains("PERSON"));
    }

    #[test]
    fn test_cmp_serializes_structs() {
        #[derive(Serialize)]
        struct Person {
            name: String,
            age: u8,
        }

        let mut t = assert_ctx("struct");
        let bob = Person {
            name: "Bob".to_string(),
            age: 41,
        };
        assert!(t.cmp(&bob, json!({"name": "Bob", "age": 41})));
    }

    #[test]
    fn test_cmp_json_template_error_is_a_failure() {
        let mut t = assert_ctx("template");
        assert!(!t.cmp_json(&json!({}), r#"{"id": }"#, &Params::new()));
        assert!(t.failures()[0].report.contains("invalid template"));
    }

    #[test]
    fn test_template_error_counts_as_a_check() {
        let mut t = assert_ctx("template");
        t.cmp_json(&json!({}), "[1", &Params::new());
        assert_eq!(t.checks(), 1);
        assert_eq!(t.failures().len(), 1);
    }

    #[test]
    fn test_error_message_matching() {
        let mut t = assert_ctx("errors");
        let missing: Result<u8, String> = Err("User not found".to_string());
        assert!(t.cmp_error_matching(&missing, "User not found"));
        assert!(t.cmp_error_matching(&missing, ops::has_suffix("not found")));
        assert!(!t.cmp_error_matching(&missing, ops::has_prefix("Order")));
        assert!(!t.cmp_error_matching(&Ok::<u8, String>(3), ops::ignore()));

        assert_eq!(t.checks(), 4);
        assert_eq!(t.failures().len(), 2);
        assert!(t.failures()[0].report.contains("HasPrefix"));
        assert!(t.failures()[1].report.contains("got Ok(3)"));
    }

    #[test]
    fn test_fatal_stops_while_plain_checks_continue() {
        let mut t = assert_ctx("mixed");
        assert!(!t.cmp(&json!(1), 2));
        assert!(t.fatal().cmp_no_error(&Ok::<u8, String>(1)));

        let stopped = panic::catch_unwind(AssertUnwindSafe(|| {
            t.fatal().cmp_no_error(&Err::<u8, String>("db down".to_string()));
            t.cmp(&json!(3), 4);
        }));
        assert!(stopped.is_err());

        // Both failures land in the same list; the check after the fatal one never ran
        assert_eq!(t.failures().len(), 2);
        assert!(t.failures()[1].report.contains("db down"));
        assert_eq!(t.checks(), 3);

        // Plain checks keep going after the fatal failure was caught
        assert!(!t.config().fail_fast);
        assert!(!t.cmp(&json!(3), 4));
        assert_eq!(t.failures().len(), 3);
    }

    #[test]
    fn test_error_checks() {
        let mut t = assert_ctx("errors");
        let ok: Result<u8, String> = Ok(1);
        let err: Result<u8, String> = Err("boom".to_string());

        assert!(t.cmp_no_error(&ok));
        assert!(t.cmp_error(&err));
        assert!(!t.cmp_no_error(&err));
        assert!(!t.cmp_error(&ok));
        assert_eq!(t.failures().len(), 2);
        assert!(t.failures()[0].report.contains("boom"));
    }

    #[test]
    fn test_run_folds_sub_tests() {
        let mut t = assert_ctx("parent");
        let passed = t.run("child", |t| {
            t.cmp(&json!({"id": 7}), Pattern::record([("id", ops::catch("id", ops::not_zero()))]));
            t.cmp(&json!(1), 2);
        });
        assert!(!passed);
        assert_eq!(t.failures()[0].test, "parent/child");
        assert_eq!(t.captures().value("id"), Some(&json!(7)));
    }

    #[test]
    #[should_panic(expected = "DATA")]
    fn test_require_panics_on_first_failure() {
        let mut t = Assert::with_config("require", ContextConfig::new().with_fail_fast(true));
        t.cmp(&json!(1), 2);
    }

    #[test]
    #[should_panic(expected = "1 check(s) failed in finish")]
    fn test_finish_panics_when_failed() {
        let mut t = assert_ctx("finish");
        t.cmp(&json!("a"), "b");
        t.finish();
    }
}
