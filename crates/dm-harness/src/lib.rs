//! Test-facing layer over the deepmatch engine
//!
//! - [`Assert`]: named assertion context recording every failed check
//! - [`Suite`]: tests sharing state and lifecycle [`Hooks`]
//! - [`Response`]: captured HTTP responses checked via [`ResponseCheck`]
//! - [`ContextConfig`]: settings read from `DEEPMATCH_*` variables
//!
//! ```ignore
//! use dm_core::{ops, Pattern};
//! use dm_harness::Assert;
//! use serde_json::json;
//!
//! let mut t = Assert::new("create person");
//! t.cmp(&json!({"id": 7, "name": "Bob"}), Pattern::partial([("id", ops::not_zero())]));
//! t.finish();
//! ```

pub mod assert;
pub mod config;
pub mod error;
pub mod logging;
pub mod response;
pub mod suite;

pub use assert::{Assert, Failure, Fatal};
pub use config::ContextConfig;
pub use error::{SuiteError, SuiteResult};
pub use response::{Response, ResponseCheck};
pub use suite::{HookFailure, HookStage, Hooks, Suite, SuiteReport, TestOutcome, TestStatus};
