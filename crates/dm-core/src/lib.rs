//! Structural matcher engine
//!
//! This crate decides whether an actual JSON value satisfies an expected
//! [`Pattern`] and reports every mismatch with its path.
//!
//! # Patterns
//!
//! - Literals compare by exact equality (type and value)
//! - Records compare named fields in `Strict`, `Partial` or `Subset` mode
//! - Sequences compare index-wise
//! - Operators (`NotZero`, `Between`, `Len`, `Bag`, `All`, `Catch`...) are
//!   built with the functions in [`ops`]
//!
//! # Example
//!
//! ```ignore
//! use dm_core::{compare, ops, Pattern};
//! use serde_json::json;
//!
//! let got = json!({"id": 7, "name": "Bob", "age": 41});
//! let expected = Pattern::partial([
//!     ("name", Pattern::from("Bob")),
//!     ("age", ops::between(40, 45)),
//! ]);
//!
//! let result = compare(&got, &expected);
//! assert!(result.matched(), "{}", result);
//! ```

mod bag;
mod captures;
mod compare;
mod error;
mod operator;
pub mod ops;
mod path;
mod pattern;
mod result;
pub mod smuggle;
pub mod value;

pub use captures::Captures;
pub use compare::{compare, compare_serialize, compare_with, CompareOptions, DEFAULT_MAX_DEPTH};
pub use error::{PatternError, PatternResult};
pub use operator::{BagKind, Bound, Bounds, Kind, Operator, Predicate, Transform};
pub use path::{Path, DEFAULT_ROOT};
pub use pattern::{Pattern, RecordMode};
pub use result::{ComparisonResult, DiffCategory, Node};

// Re-export serde_json Value for convenience
pub use serde_json::Value;
