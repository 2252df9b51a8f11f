//! Configuration for assertion contexts

use dm_core::{CompareOptions, DEFAULT_MAX_DEPTH, DEFAULT_ROOT};
use std::env;
use std::str::FromStr;
use tracing::warn;

pub const ROOT_NAME_VAR: &str = "DEEPMATCH_ROOT_NAME";
pub const MAX_ERRORS_VAR: &str = "DEEPMATCH_MAX_ERRORS";
pub const FAIL_FAST_VAR: &str = "DEEPMATCH_FAIL_FAST";
pub const MAX_DEPTH_VAR: &str = "DEEPMATCH_MAX_DEPTH";

/// Failing paths rendered per report unless configured otherwise
pub const DEFAULT_MAX_ERRORS: usize = 10;

/// Settings shared by every check made through an [`Assert`](crate::Assert)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextConfig {
    /// Name of the root value in failure paths (`DATA`)
    pub root_name: String,
    /// Failing paths rendered per report, `None` for all of them
    pub max_errors: Option<usize>,
    /// Panic on the first failed check
    pub fail_fast: bool,
    /// Nesting depth at which comparison stops
    pub max_depth: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl ContextConfig {
    /// Built-in defaults, ignoring the environment
    pub fn new() -> Self {
        Self {
            root_name: DEFAULT_ROOT.to_string(),
            max_errors: Some(DEFAULT_MAX_ERRORS),
            fail_fast: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Load configuration from `DEEPMATCH_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through `lookup`, falling back to the built-in
    /// default for unset or invalid values
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::new();

        if let Some(name) = lookup(ROOT_NAME_VAR) {
            let name = name.trim();
            if name.is_empty() {
                warn!(var = ROOT_NAME_VAR, "empty root name, using default");
            } else {
                config.root_name = name.to_string();
            }
        }

        if let Some(raw) = lookup(MAX_ERRORS_VAR) {
            match raw.trim().parse::<i64>() {
                Ok(n) if n < 0 => config.max_errors = None,
                Ok(n) => config.max_errors = Some(n as usize),
                Err(_) => warn!(var = MAX_ERRORS_VAR, value = %raw, "invalid value, using default"),
            }
        }

        if let Some(raw) = lookup(FAIL_FAST_VAR) {
            match parse_flag(&raw) {
                Some(flag) => config.fail_fast = flag,
                None => warn!(var = FAIL_FAST_VAR, value = %raw, "invalid value, using default"),
            }
        }

        if let Some(depth) = parse_var::<usize>(&lookup, MAX_DEPTH_VAR) {
            if depth == 0 {
                warn!(var = MAX_DEPTH_VAR, "depth must be positive, using default");
            } else {
                config.max_depth = depth;
            }
        }

        config
    }

    pub fn with_root_name(mut self, name: impl Into<String>) -> Self {
        self.root_name = name.into();
        self
    }

    pub fn with_max_errors(mut self, max_errors: Option<usize>) -> Self {
        self.max_errors = max_errors;
        self
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Engine options for a comparison rooted at `root_name`
    pub fn compare_options(&self, root_name: &str) -> CompareOptions {
        CompareOptions::new()
            .with_root_name(root_name)
            .with_max_depth(self.max_depth)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, var: &str) -> Option<T> {
    let raw = lookup(var)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(var, value = %raw, "invalid value, using default");
            None
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
