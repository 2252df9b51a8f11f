//! Test suites with lifecycle hooks
//!
//! A [`Suite`] owns its state and an ordered list of tests. Lifecycle
//! behaviour lives in a [`Hooks`] value that can be built once and shared
//! between suites, or extended with [`Hooks::then_setup`] and
//! [`Hooks::then_destroy`].
//!
//! Lifecycle of [`Suite::run`]:
//! 1. `setup` once; on error nothing else runs
//! 2. for each test: `pre_test`, the test, `post_test`
//! 3. `destroy` once
//!
//! A `pre_test` error skips its test. A `post_test` error fails its test.
//!
//! Each test receives one [`Assert`]. Plain checks keep going after a
//! failure; checks made through [`Assert::fatal`] end the test instead.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::assert::{Assert, Failure};
use crate::config::ContextConfig;
use crate::error::{SuiteError, SuiteResult};

type StateHook<S> = Arc<dyn Fn(&mut S) -> SuiteResult<()> + Send + Sync>;
type TestHook<S> = Arc<dyn Fn(&mut S, &str) -> SuiteResult<()> + Send + Sync>;
type TestFn<S> = Box<dyn Fn(&mut S, &mut Assert)>;

/// Lifecycle callbacks of a suite
pub struct Hooks<S> {
    setup: Option<StateHook<S>>,
    pre_test: Option<TestHook<S>>,
    post_test: Option<TestHook<S>>,
    destroy: Option<StateHook<S>>,
}

impl<S> Clone for Hooks<S> {
    fn clone(&self) -> Self {
        Self {
            setup: self.setup.clone(),
            pre_test: self.pre_test.clone(),
            post_test: self.post_test.clone(),
            destroy: self.destroy.clone(),
        }
    }
}

impl<S> Default for Hooks<S> {
    fn default() -> Self {
        Self {
            setup: None,
            pre_test: None,
            post_test: None,
            destroy: None,
        }
    }
}

impl<S> fmt::Debug for Hooks<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("setup", &self.setup.is_some())
            .field("pre_test", &self.pre_test.is_some())
            .field("post_test", &self.post_test.is_some())
            .field("destroy", &self.destroy.is_some())
            .finish()
    }
}

impl<S: 'static> Hooks<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn setup(mut self, f: impl Fn(&mut S) -> SuiteResult<()> + Send + Sync + 'static) -> Self {
        self.setup = Some(Arc::new(f));
        self
    }

    /// Called before each test with its name
    pub fn pre_test(
        mut self,
        f: impl Fn(&mut S, &str) -> SuiteResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.pre_test = Some(Arc::new(f));
        self
    }

    /// Called after each test that ran, with its name
    pub fn post_test(
        mut self,
        f: impl Fn(&mut S, &str) -> SuiteResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.post_test = Some(Arc::new(f));
        self
    }

    pub fn destroy(mut self, f: impl Fn(&mut S) -> SuiteResult<()> + Send + Sync + 'static) -> Self {
        self.destroy = Some(Arc::new(f));
        self
    }

    /// Run the current setup, then `f` if it succeeded
    pub fn then_setup(
        mut self,
        f: impl Fn(&mut S) -> SuiteResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.setup = Some(chain(self.setup.take(), Arc::new(f)));
        self
    }

    /// Run the current destroy, then `f` even if it failed.
    ///
    /// The first error is returned.
    pub fn then_destroy(
        mut self,
        f: impl Fn(&mut S) -> SuiteResult<()> + Send + Sync + 'static,
    ) -> Self {
        let base = self.destroy.take();
        self.destroy = Some(Arc::new(move |state: &mut S| {
            let first = base.as_ref().map_or(Ok(()), |base| base(state));
            let second = f(state);
            first.and(second)
        }));
        self
    }

    fn run_setup(&self, state: &mut S) -> SuiteResult<()> {
        self.setup.as_ref().map_or(Ok(()), |f| f(state))
    }

    fn run_pre_test(&self, state: &mut S, test: &str) -> SuiteResult<()> {
        self.pre_test.as_ref().map_or(Ok(()), |f| f(state, test))
    }

    fn run_post_test(&self, state: &mut S, test: &str) -> SuiteResult<()> {
        self.post_test.as_ref().map_or(Ok(()), |f| f(state, test))
    }

    fn run_destroy(&self, state: &mut S) -> SuiteResult<()> {
        self.destroy.as_ref().map_or(Ok(()), |f| f(state))
    }
}

fn chain<S: 'static>(first: Option<StateHook<S>>, second: StateHook<S>) -> StateHook<S> {
    match first {
        None => second,
        Some(first) => Arc::new(move |state: &mut S| {
            first(state)?;
            second(state)
        }),
    }
}

/// Lifecycle stage a hook error came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStage {
    Setup,
    PreTest,
    PostTest,
    Destroy,
}

impl fmt::Display for HookStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookStage::Setup => write!(f, "setup"),
            HookStage::PreTest => write!(f, "pre_test"),
            HookStage::PostTest => write!(f, "post_test"),
            HookStage::Destroy => write!(f, "destroy"),
        }
    }
}

/// A hook that returned an error
#[derive(Debug)]
pub struct HookFailure {
    pub stage: HookStage,
    /// Test the hook ran for, if any
    pub test: Option<String>,
    pub error: SuiteError,
}

impl fmt::Display for HookFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.test {
            Some(test) => write!(f, "{} hook failed for {}: {}", self.stage, test, self.error),
            None => write!(f, "{} hook failed: {}", self.stage, self.error),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestStatus {
    Passed,
    Failed,
    /// Not run because `pre_test` failed; counts as a failure
    Skipped,
}

/// Result of one test
#[derive(Debug, Clone)]
pub struct TestOutcome {
    pub name: String,
    pub status: TestStatus,
    pub checks: usize,
    pub failures: Vec<Failure>,
}

impl TestOutcome {
    pub fn passed(&self) -> bool {
        self.status == TestStatus::Passed
    }
}

/// Result of [`Suite::run`]
#[derive(Debug)]
pub struct SuiteReport {
    pub suite: String,
    pub outcomes: Vec<TestOutcome>,
    pub hook_failures: Vec<HookFailure>,
}

impl SuiteReport {
    /// Every test passed and no hook failed
    pub fn passed(&self) -> bool {
        self.hook_failures.is_empty() && self.outcomes.iter().all(TestOutcome::passed)
    }

    pub fn outcome(&self, test: &str) -> Option<&TestOutcome> {
        self.outcomes.iter().find(|o| o.name == test)
    }

    pub fn failed_tests(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| !o.passed())
            .map(|o| o.name.as_str())
            .collect()
    }

    /// Print summary of all outcomes
    pub fn print_summary(&self) {
        println!("\n=== Suite {} ===", self.suite);
        for outcome in &self.outcomes {
            match outcome.status {
                TestStatus::Passed => println!("✅ {} - PASS", outcome.name),
                TestStatus::Failed => println!("❌ {} - FAIL", outcome.name),
                TestStatus::Skipped => println!("⏭  {} - SKIPPED", outcome.name),
            }
            for failure in &outcome.failures {
                println!("{}", failure.report.trim_end());
            }
        }
        for failure in &self.hook_failures {
            println!("❌ {}", failure);
        }

        let passed = self.outcomes.iter().filter(|o| o.passed()).count();
        println!();
        println!("Results: {}/{} passed", passed, self.outcomes.len());
    }
}

/// Named tests sharing a state value and lifecycle hooks
pub struct Suite<S> {
    name: String,
    state: S,
    hooks: Hooks<S>,
    config: ContextConfig,
    tests: Vec<(String, TestFn<S>)>,
}

impl<S: 'static> Suite<S> {
    pub fn new(name: impl Into<String>, state: S) -> Self {
        Self {
            name: name.into(),
            state,
            hooks: Hooks::default(),
            config: ContextConfig::from_env(),
            tests: Vec::new(),
        }
    }

    pub fn with_hooks(mut self, hooks: Hooks<S>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_config(mut self, config: ContextConfig) -> Self {
        self.config = config;
        self
    }

    /// Append a test; tests run in insertion order
    pub fn test(mut self, name: impl Into<String>, f: impl Fn(&mut S, &mut Assert) + 'static) -> Self {
        self.tests.push((name.into(), Box::new(f)));
        self
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn into_state(self) -> S {
        self.state
    }

    /// Run the whole lifecycle
    pub fn run(&mut self) -> SuiteReport {
        let Suite {
            name: suite,
            state,
            hooks,
            config,
            tests,
        } = self;

        info!(suite = %suite, tests = tests.len(), "Running suite");
        let mut report = SuiteReport {
            suite: suite.clone(),
            outcomes: Vec::with_capacity(tests.len()),
            hook_failures: Vec::new(),
        };

        if let Err(error) = hooks.run_setup(state) {
            warn!(suite = %suite, error = %error, "Suite setup failed, no test run");
            report.hook_failures.push(HookFailure {
                stage: HookStage::Setup,
                test: None,
                error,
            });
            return report;
        }

        for (name, test) in tests.iter() {
            let assert = Assert::with_config(format!("{}/{}", suite, name), config.clone());
            let outcome = run_test(hooks, state, name, test, assert, &mut report.hook_failures);
            debug!(suite = %suite, test = %name, status = ?outcome.status, "Test finished");
            report.outcomes.push(outcome);
        }

        if let Err(error) = hooks.run_destroy(state) {
            warn!(suite = %suite, error = %error, "Suite destroy failed");
            report.hook_failures.push(HookFailure {
                stage: HookStage::Destroy,
                test: None,
                error,
            });
        }

        info!(
            suite = %suite,
            passed = report.passed(),
            failed = report.failed_tests().len(),
            "Suite finished"
        );
        report
    }
}

fn run_test<S: 'static>(
    hooks: &Hooks<S>,
    state: &mut S,
    name: &str,
    test: &TestFn<S>,
    mut t: Assert,
    hook_failures: &mut Vec<HookFailure>,
) -> TestOutcome {
    if let Err(error) = hooks.run_pre_test(state, name) {
        warn!(test = %name, error = %error, "pre_test hook failed, skipping test");
        hook_failures.push(HookFailure {
            stage: HookStage::PreTest,
            test: Some(name.to_string()),
            error,
        });
        return TestOutcome {
            name: name.to_string(),
            status: TestStatus::Skipped,
            checks: 0,
            failures: Vec::new(),
        };
    }

    let run = panic::catch_unwind(AssertUnwindSafe(|| test(state, &mut t)));
    let mut failures = t.failures().to_vec();
    // A require-mode panic has already recorded its failure
    if let Err(payload) = run {
        if failures.is_empty() {
            failures.push(Failure {
                test: t.name().to_string(),
                report: format!("test panicked: {}", panic_message(payload.as_ref())),
            });
        }
    }

    let mut status = if failures.is_empty() {
        TestStatus::Passed
    } else {
        TestStatus::Failed
    };

    if let Err(error) = hooks.run_post_test(state, name) {
        warn!(test = %name, error = %error, "post_test hook failed");
        hook_failures.push(HookFailure {
            stage: HookStage::PostTest,
            test: Some(name.to_string()),
            error,
        });
        status = TestStatus::Failed;
    }

    TestOutcome {
        name: name.to_string(),
        status,
        checks: t.checks(),
        failures,
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    type Log = Arc<Mutex<Vec<String>>>;

    fn logging_hooks(log: &Log) -> Hooks<u32> {
        let (a, b, c, d) = (log.clone(), log.clone(), log.clone(), log.clone());
        Hooks::new()
            .setup(move |_| {
                a.lock().unwrap().push("setup".to_string());
                Ok(())
            })
            .pre_test(move |_, test| {
                b.lock().unwrap().push(format!("pre:{}", test));
                Ok(())
            })
            .post_test(move |_, test| {
                c.lock().unwrap().push(format!("post:{}", test));
                Ok(())
            })
            .destroy(move |_| {
                d.lock().unwrap().push("destroy".to_string());
                Ok(())
            })
    }

    fn suite(hooks: Hooks<u32>) -> Suite<u32> {
        Suite::new("demo", 0)
            .with_config(ContextConfig::new())
            .with_hooks(hooks)
            .test("one", |n, t| {
                *n += 1;
                t.cmp(&json!(*n), 1);
            })
            .test("two", |n, t| {
                *n += 1;
                t.cmp(&json!(*n), 3);
            })
    }

    #[test]
    fn test_lifecycle_order() {
        let log = Log::default();
        let mut suite = suite(logging_hooks(&log));
        let report = suite.run();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["setup", "pre:one", "post:one", "pre:two", "post:two", "destroy"]
        );
        assert_eq!(report.failed_tests(), vec!["two"]);
        assert_eq!(report.outcome("two").unwrap().failures[0].test, "demo/two");
        assert_eq!(*suite.state(), 2);
    }

    #[test]
    fn test_setup_failure_runs_nothing() {
        let log = Log::default();
        let hooks = logging_hooks(&log).then_setup(|_| Err(SuiteError::hook("no database")));
        let report = suite(hooks).run();

        assert_eq!(*log.lock().unwrap(), vec!["setup"]);
        assert!(report.outcomes.is_empty());
        assert_eq!(report.hook_failures[0].stage, HookStage::Setup);
        assert!(!report.passed());
    }

    #[test]
    fn test_pre_test_failure_skips_test() {
        let hooks = Hooks::new().pre_test(|_, test| {
            if test == "one" {
                Err(SuiteError::hook("not ready"))
            } else {
                Ok(())
            }
        });
        let mut suite = suite(hooks);
        let report = suite.run();

        assert_eq!(report.outcome("one").unwrap().status, TestStatus::Skipped);
        // Only "two" touched the counter, so it saw 1
        assert_eq!(report.outcome("two").unwrap().status, TestStatus::Failed);
        assert_eq!(*suite.state(), 1);
    }

    #[test]
    fn test_post_test_failure_fails_test() {
        let hooks = Hooks::new().post_test(|_, _| Err(SuiteError::hook("leak detected")));
        let report = suite(hooks).run();

        let one = report.outcome("one").unwrap();
        assert_eq!(one.status, TestStatus::Failed);
        assert!(one.failures.is_empty());
        assert_eq!(report.hook_failures.len(), 2);
    }

    #[test]
    fn test_shared_and_extended_hooks() {
        let log = Log::default();
        let base = logging_hooks(&log);
        let extra = log.clone();
        let derived = base.clone().then_destroy(move |_| {
            extra.lock().unwrap().push("derived destroy".to_string());
            Ok(())
        });

        suite(base).run();
        suite(derived).run();

        let log = log.lock().unwrap();
        assert_eq!(log.iter().filter(|l| *l == "setup").count(), 2);
        assert_eq!(log.last().map(String::as_str), Some("derived destroy"));
    }

    #[test]
    fn test_panicking_test_is_contained() {
        let mut suite = Suite::new("panics", ())
            .with_config(ContextConfig::new().with_fail_fast(true))
            .test("require", |_, t| {
                t.cmp(&json!(1), 2);
                unreachable!("require mode stops at the first failure");
            })
            .test("boom", |_, _| panic!("boom"))
            .test("after", |_, t| {
                t.cmp(&json!(1), 1);
            });
        let report = suite.run();

        assert_eq!(report.failed_tests(), vec!["require", "boom"]);
        let failures = &report.outcome("require").unwrap().failures;
        assert_eq!(failures.len(), 1);
        assert!(failures[0].report.contains("DATA"));
        let failure = &report.outcome("boom").unwrap().failures[0];
        assert_eq!(failure.report, "test panicked: boom");
        assert!(report.outcome("after").unwrap().passed());
    }

    #[test]
    fn test_fatal_check_ends_only_its_test() {
        let mut suite = Suite::new("mixed", 0)
            .with_config(ContextConfig::new())
            .test("connect", |n, t| {
                t.cmp(&json!(*n), 1);
                let connected: Result<(), String> = Err("refused".to_string());
                t.fatal().cmp_no_error(&connected);
                *n += 100;
            })
            .test("after", |n, t| {
                *n += 1;
                t.cmp(&json!(*n), 1);
            });
        let report = suite.run();

        let connect = report.outcome("connect").unwrap();
        assert_eq!(connect.status, TestStatus::Failed);
        assert_eq!(connect.checks, 2);
        assert_eq!(connect.failures.len(), 2);
        assert!(connect.failures[1].report.contains("refused"));
        assert!(report.outcome("after").unwrap().passed());
        assert_eq!(*suite.state(), 1);
    }
}
