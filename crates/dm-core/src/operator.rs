//! Operator nodes
//!
//! Operators are named predicates usable anywhere inside a [`Pattern`].
//! They form a closed set evaluated by the engine in `compare.rs`; the
//! `Code` and `Smuggle` variants carry user closures for checks that
//! cannot be expressed with the built-in operators.

use regex::Regex;
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::error::{PatternError, PatternResult};
use crate::pattern::Pattern;

/// Comparable bound used by ordering operators
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    Number(f64),
    String(String),
}

impl Bound {
    /// Build a bound from a literal JSON value
    pub fn from_value(operator: &str, value: &Value) -> PatternResult<Self> {
        match value {
            Value::Number(n) => n
                .as_f64()
                .map(Bound::Number)
                .ok_or_else(|| PatternError::invalid_argument(operator, "number out of range")),
            Value::String(s) => Ok(Bound::String(s.clone())),
            other => Err(PatternError::invalid_argument(
                operator,
                format!("expected a number or a string, got {}", other),
            )),
        }
    }

    /// Order `actual` relative to this bound, `None` when kinds differ
    pub fn order(&self, actual: &Value) -> Option<Ordering> {
        match (actual, self) {
            (Value::Number(n), Bound::Number(b)) => n.as_f64()?.partial_cmp(b),
            (Value::String(s), Bound::String(b)) => Some(s.as_str().cmp(b.as_str())),
            _ => None,
        }
    }

    /// Order two bounds of the same kind
    fn order_bound(&self, other: &Bound) -> Option<Ordering> {
        match (self, other) {
            (Bound::Number(a), Bound::Number(b)) => a.partial_cmp(b),
            (Bound::String(a), Bound::String(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// `low > high`: no value can fall between them
    pub fn is_reversed(low: &Bound, high: &Bound) -> bool {
        low.order_bound(high) == Some(Ordering::Greater)
    }

    fn same_kind(&self, other: &Bound) -> bool {
        matches!(
            (self, other),
            (Bound::Number(_), Bound::Number(_)) | (Bound::String(_), Bound::String(_))
        )
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Bound::Number(_) => "number",
            Bound::String(_) => "string",
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Number(n) => write!(f, "{}", n),
            Bound::String(s) => write!(f, "{:?}", s),
        }
    }
}

macro_rules! bound_from_number {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Bound {
                fn from(n: $t) -> Self {
                    Bound::Number(n as f64)
                }
            }
        )*
    };
}

bound_from_number!(i32, i64, u32, u64, usize, f32, f64);

impl From<&str> for Bound {
    fn from(s: &str) -> Self {
        Bound::String(s.to_string())
    }
}

impl From<String> for Bound {
    fn from(s: String) -> Self {
        Bound::String(s)
    }
}

/// Which ends of a `Between` range are included
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bounds {
    /// `low <= x <= high`
    #[default]
    InIn,
    /// `low <= x < high`
    InOut,
    /// `low < x <= high`
    OutIn,
    /// `low < x < high`
    OutOut,
}

/// JSON kind checked by `Isa`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Null,
    Bool,
    Number,
    Integer,
    String,
    Array,
    Object,
}

impl Kind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "null" => Some(Kind::Null),
            "bool" | "boolean" => Some(Kind::Bool),
            "number" => Some(Kind::Number),
            "integer" | "int" => Some(Kind::Integer),
            "string" => Some(Kind::String),
            "array" => Some(Kind::Array),
            "object" => Some(Kind::Object),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::Bool => "bool",
            Kind::Number => "number",
            Kind::Integer => "integer",
            Kind::String => "string",
            Kind::Array => "array",
            Kind::Object => "object",
        }
    }

    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Kind::Null => value.is_null(),
            Kind::Bool => value.is_boolean(),
            Kind::Number => value.is_number(),
            Kind::Integer => value.is_i64() || value.is_u64(),
            Kind::String => value.is_string(),
            Kind::Array => value.is_array(),
            Kind::Object => value.is_object(),
        }
    }
}

/// Flavour of permutation-invariant sequence matching
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BagKind {
    /// Every element matched by exactly one sub-pattern and vice versa
    Bag,
    /// Every sub-pattern matched; extra elements allowed
    SuperBagOf,
    /// Every element matched; unused sub-patterns allowed
    SubBagOf,
}

impl BagKind {
    pub fn name(&self) -> &'static str {
        match self {
            BagKind::Bag => "Bag",
            BagKind::SuperBagOf => "SuperBagOf",
            BagKind::SubBagOf => "SubBagOf",
        }
    }
}

/// User predicate for the `Code` operator
#[derive(Clone)]
pub struct Predicate(Arc<dyn Fn(&Value) -> bool + Send + Sync>);

impl Predicate {
    pub fn new(f: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, value: &Value) -> bool {
        (self.0)(value)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(<fn>)")
    }
}

/// User transformation for the `Smuggle` operator
#[derive(Clone)]
pub struct Transform(Arc<dyn Fn(&Value) -> Result<Value, String> + Send + Sync>);

impl Transform {
    pub fn new(f: impl Fn(&Value) -> Result<Value, String> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, value: &Value) -> Result<Value, String> {
        (self.0)(value)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Transform(<fn>)")
    }
}

/// Operator definition
#[derive(Debug, Clone)]
pub enum Operator {
    /// Always matches
    Ignore,
    Zero,
    NotZero,
    Empty,
    NotEmpty,
    Nil,
    NotNil,

    Between {
        low: Bound,
        high: Bound,
        bounds: Bounds,
    },
    Gt(Bound),
    Gte(Bound),
    Lt(Bound),
    Lte(Bound),

    /// Length of a string, array or object matches the inner pattern
    Len(Box<Pattern>),
    HasPrefix(String),
    HasSuffix(String),
    /// Substring of a string, or some element of an array or object
    Contains(Box<Pattern>),
    Re(Regex),
    ContainsKey(String),
    /// Sorted key list of an object matches the inner pattern
    Keys(Box<Pattern>),
    Isa(Kind),

    Bag {
        kind: BagKind,
        items: Vec<Pattern>,
    },
    ArrayEach(Box<Pattern>),

    All(Vec<Pattern>),
    Any(Vec<Pattern>),
    NoneOf(Vec<Pattern>),
    Not(Box<Pattern>),

    /// Store the actual value in a named slot when the inner pattern matches
    Catch {
        slot: String,
        pattern: Box<Pattern>,
    },
    Code {
        name: String,
        predicate: Predicate,
    },
    /// Transform the actual value, then match the result
    Smuggle {
        name: String,
        transform: Transform,
        pattern: Box<Pattern>,
    },
}

impl Operator {
    /// Between with explicit bound kinds; both bounds must be the same kind
    pub fn between(low: Bound, high: Bound, bounds: Bounds) -> PatternResult<Self> {
        if !low.same_kind(&high) {
            return Err(PatternError::InvalidBounds {
                operator: "Between".to_string(),
                reason: format!(
                    "low is a {} but high is a {}",
                    low.kind_name(),
                    high.kind_name()
                ),
            });
        }
        if Bound::is_reversed(&low, &high) {
            return Err(PatternError::InvalidBounds {
                operator: "Between".to_string(),
                reason: format!("low {} is greater than high {}", low, high),
            });
        }
        Ok(Operator::Between { low, high, bounds })
    }

    /// Compile a regex operator
    pub fn re(pattern: &str) -> PatternResult<Self> {
        Regex::new(pattern)
            .map(Operator::Re)
            .map_err(|source| PatternError::InvalidRegex {
                pattern: pattern.to_string(),
                source,
            })
    }

    /// Operator name as used in templates
    pub fn name(&self) -> &str {
        match self {
            Operator::Ignore => "Ignore",
            Operator::Zero => "Zero",
            Operator::NotZero => "NotZero",
            Operator::Empty => "Empty",
            Operator::NotEmpty => "NotEmpty",
            Operator::Nil => "Nil",
            Operator::NotNil => "NotNil",
            Operator::Between { .. } => "Between",
            Operator::Gt(_) => "Gt",
            Operator::Gte(_) => "Gte",
            Operator::Lt(_) => "Lt",
            Operator::Lte(_) => "Lte",
            Operator::Len(_) => "Len",
            Operator::HasPrefix(_) => "HasPrefix",
            Operator::HasSuffix(_) => "HasSuffix",
            Operator::Contains(_) => "Contains",
            Operator::Re(_) => "Re",
            Operator::ContainsKey(_) => "ContainsKey",
            Operator::Keys(_) => "Keys",
            Operator::Isa(_) => "Isa",
            Operator::Bag { kind, .. } => kind.name(),
            Operator::ArrayEach(_) => "ArrayEach",
            Operator::All(_) => "All",
            Operator::Any(_) => "Any",
            Operator::NoneOf(_) => "None",
            Operator::Not(_) => "Not",
            Operator::Catch { .. } => "Catch",
            Operator::Code { name, .. } => name.as_str(),
            Operator::Smuggle { name, .. } => name.as_str(),
        }
    }

    /// Human readable description used as the "expected" side of a report
    pub fn describe(&self) -> String {
        match self {
            Operator::Between { low, high, bounds } => {
                let (open, close) = match bounds {
                    Bounds::InIn => ('[', ']'),
                    Bounds::InOut => ('[', ')'),
                    Bounds::OutIn => ('(', ']'),
                    Bounds::OutOut => ('(', ')'),
                };
                format!("Between{}{}, {}{}", open, low, high, close)
            }
            Operator::Gt(b) | Operator::Gte(b) | Operator::Lt(b) | Operator::Lte(b) => {
                format!("{}({})", self.name(), b)
            }
            Operator::Len(p) | Operator::Contains(p) | Operator::Keys(p) => {
                format!("{}({})", self.name(), p.describe())
            }
            Operator::ArrayEach(p) | Operator::Not(p) => {
                format!("{}({})", self.name(), p.describe())
            }
            Operator::HasPrefix(s) | Operator::HasSuffix(s) | Operator::ContainsKey(s) => {
                format!("{}({:?})", self.name(), s)
            }
            Operator::Re(re) => format!("Re({:?})", re.as_str()),
            Operator::Isa(kind) => format!("Isa({})", kind.name()),
            Operator::Bag { items, .. }
            | Operator::All(items)
            | Operator::Any(items)
            | Operator::NoneOf(items) => {
                let inner: Vec<String> = items.iter().map(Pattern::describe).collect();
                format!("{}({})", self.name(), inner.join(", "))
            }
            Operator::Catch { slot, pattern } => {
                format!("Catch({:?}, {})", slot, pattern.describe())
            }
            Operator::Code { name, .. } => format!("Code({})", name),
            Operator::Smuggle { name, pattern, .. } => {
                format!("Smuggle({}, {})", name, pattern.describe())
            }
            _ => format!("{}()", self.name()),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bound_order() {
        let bound = Bound::from(40);
        assert_eq!(bound.order(&json!(41)), Some(Ordering::Greater));
        assert_eq!(bound.order(&json!(40.0)), Some(Ordering::Equal));
        assert_eq!(bound.order(&json!("40")), None);

        let bound = Bound::from("m");
        assert_eq!(bound.order(&json!("a")), Some(Ordering::Less));
    }

    #[test]
    fn test_between_rejects_mixed_bounds() {
        let err = Operator::between(Bound::from(1), Bound::from("z"), Bounds::InIn).unwrap_err();
        assert!(matches!(err, PatternError::InvalidBounds { .. }));
    }

    #[test]
    fn test_between_rejects_reversed_range() {
        let err = Operator::between(Bound::from(45), Bound::from(40), Bounds::InIn).unwrap_err();
        assert!(err.to_string().contains("low 45 is greater than high 40"), "{}", err);
        assert!(Operator::between(Bound::from("z"), Bound::from("a"), Bounds::InIn).is_err());
        assert!(Operator::between(Bound::from(40), Bound::from(40), Bounds::InIn).is_ok());
    }

    #[test]
    fn test_invalid_regex() {
        let err = Operator::re("(unclosed").unwrap_err();
        assert!(matches!(err, PatternError::InvalidRegex { .. }));
    }

    #[test]
    fn test_describe() {
        let op = Operator::between(Bound::from(40), Bound::from(45), Bounds::InOut).unwrap();
        assert_eq!(op.describe(), "Between[40, 45)");
        assert_eq!(Operator::NotZero.describe(), "NotZero()");
        assert_eq!(
            Operator::HasSuffix("Z".to_string()).describe(),
            r#"HasSuffix("Z")"#
        );
        assert_eq!(Operator::Isa(Kind::Integer).describe(), "Isa(integer)");
    }

    #[test]
    fn test_kind_matches() {
        assert!(Kind::Integer.matches(&json!(3)));
        assert!(!Kind::Integer.matches(&json!(3.5)));
        assert!(Kind::Number.matches(&json!(3.5)));
        assert_eq!(Kind::from_name("boolean"), Some(Kind::Bool));
        assert_eq!(Kind::from_name("date"), None);
    }
}
