//! Operator constructors
//!
//! Each function returns a ready-to-use [`Pattern`]:
//!
//! ```ignore
//! use dm_core::{ops, Pattern};
//!
//! let person = Pattern::partial([
//!     ("id", ops::not_zero()),
//!     ("name", Pattern::from("Bob")),
//!     ("age", ops::between(40, 45)),
//!     ("children", ops::len(2)),
//! ]);
//! ```

use serde_json::Value;

use crate::error::PatternResult;
use crate::operator::{BagKind, Bound, Bounds, Kind, Operator, Predicate, Transform};
use crate::pattern::Pattern;

pub fn ignore() -> Pattern {
    Operator::Ignore.into()
}

pub fn zero() -> Pattern {
    Operator::Zero.into()
}

pub fn not_zero() -> Pattern {
    Operator::NotZero.into()
}

pub fn empty() -> Pattern {
    Operator::Empty.into()
}

pub fn not_empty() -> Pattern {
    Operator::NotEmpty.into()
}

pub fn nil() -> Pattern {
    Operator::Nil.into()
}

pub fn not_nil() -> Pattern {
    Operator::NotNil.into()
}

/// Inclusive range `low <= x <= high`
pub fn between<B: Into<Bound>>(low: B, high: B) -> Pattern {
    Operator::Between {
        low: low.into(),
        high: high.into(),
        bounds: Bounds::InIn,
    }
    .into()
}

pub fn between_with<B: Into<Bound>>(low: B, high: B, bounds: Bounds) -> Pattern {
    Operator::Between {
        low: low.into(),
        high: high.into(),
        bounds,
    }
    .into()
}

pub fn gt(bound: impl Into<Bound>) -> Pattern {
    Operator::Gt(bound.into()).into()
}

pub fn gte(bound: impl Into<Bound>) -> Pattern {
    Operator::Gte(bound.into()).into()
}

pub fn lt(bound: impl Into<Bound>) -> Pattern {
    Operator::Lt(bound.into()).into()
}

pub fn lte(bound: impl Into<Bound>) -> Pattern {
    Operator::Lte(bound.into()).into()
}

/// Length matches `expected` (a number or any pattern)
pub fn len(expected: impl Into<Pattern>) -> Pattern {
    Operator::Len(Box::new(expected.into())).into()
}

pub fn has_prefix(prefix: impl Into<String>) -> Pattern {
    Operator::HasPrefix(prefix.into()).into()
}

pub fn has_suffix(suffix: impl Into<String>) -> Pattern {
    Operator::HasSuffix(suffix.into()).into()
}

pub fn contains(expected: impl Into<Pattern>) -> Pattern {
    Operator::Contains(Box::new(expected.into())).into()
}

/// Regex match on a string; fails to build on an invalid expression
pub fn re(pattern: &str) -> PatternResult<Pattern> {
    Operator::re(pattern).map(Pattern::Op)
}

pub fn contains_key(key: impl Into<String>) -> Pattern {
    Operator::ContainsKey(key.into()).into()
}

pub fn keys(expected: impl Into<Pattern>) -> Pattern {
    Operator::Keys(Box::new(expected.into())).into()
}

pub fn isa(kind: Kind) -> Pattern {
    Operator::Isa(kind).into()
}

pub fn bag<I, P>(items: I) -> Pattern
where
    I: IntoIterator<Item = P>,
    P: Into<Pattern>,
{
    bag_of(BagKind::Bag, items)
}

pub fn super_bag_of<I, P>(items: I) -> Pattern
where
    I: IntoIterator<Item = P>,
    P: Into<Pattern>,
{
    bag_of(BagKind::SuperBagOf, items)
}

pub fn sub_bag_of<I, P>(items: I) -> Pattern
where
    I: IntoIterator<Item = P>,
    P: Into<Pattern>,
{
    bag_of(BagKind::SubBagOf, items)
}

fn bag_of<I, P>(kind: BagKind, items: I) -> Pattern
where
    I: IntoIterator<Item = P>,
    P: Into<Pattern>,
{
    Operator::Bag {
        kind,
        items: items.into_iter().map(Into::into).collect(),
    }
    .into()
}

pub fn array_each(expected: impl Into<Pattern>) -> Pattern {
    Operator::ArrayEach(Box::new(expected.into())).into()
}

pub fn all<I, P>(items: I) -> Pattern
where
    I: IntoIterator<Item = P>,
    P: Into<Pattern>,
{
    Operator::All(items.into_iter().map(Into::into).collect()).into()
}

pub fn any<I, P>(items: I) -> Pattern
where
    I: IntoIterator<Item = P>,
    P: Into<Pattern>,
{
    Operator::Any(items.into_iter().map(Into::into).collect()).into()
}

pub fn none<I, P>(items: I) -> Pattern
where
    I: IntoIterator<Item = P>,
    P: Into<Pattern>,
{
    Operator::NoneOf(items.into_iter().map(Into::into).collect()).into()
}

pub fn not(expected: impl Into<Pattern>) -> Pattern {
    Operator::Not(Box::new(expected.into())).into()
}

/// Capture the actual value into `slot` when `expected` matches
pub fn catch(slot: impl Into<String>, expected: impl Into<Pattern>) -> Pattern {
    Operator::Catch {
        slot: slot.into(),
        pattern: Box::new(expected.into()),
    }
    .into()
}

/// Custom predicate; `name` is shown in reports
pub fn code(
    name: impl Into<String>,
    predicate: impl Fn(&Value) -> bool + Send + Sync + 'static,
) -> Pattern {
    Operator::Code {
        name: name.into(),
        predicate: Predicate::new(predicate),
    }
    .into()
}

/// Transform the actual value with `transform`, then match it against `expected`
pub fn smuggle(
    name: impl Into<String>,
    transform: impl Fn(&Value) -> Result<Value, String> + Send + Sync + 'static,
    expected: impl Into<Pattern>,
) -> Pattern {
    Operator::Smuggle {
        name: name.into(),
        transform: Transform::new(transform),
        pattern: Box::new(expected.into()),
    }
    .into()
}
