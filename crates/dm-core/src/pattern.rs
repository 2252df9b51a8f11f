//! Pattern trees

use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;

use crate::operator::Operator;
use crate::value::truncate;

/// How a record pattern treats fields it does not list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordMode {
    /// Actual must have exactly the listed fields
    #[default]
    Strict,
    /// Listed fields must be present; other actual fields are ignored
    Partial,
    /// Actual may not have unlisted fields; listed fields may be absent
    Subset,
}

impl fmt::Display for RecordMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordMode::Strict => write!(f, "strict"),
            RecordMode::Partial => write!(f, "partial"),
            RecordMode::Subset => write!(f, "subset"),
        }
    }
}

/// Expected shape of a value
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Exact equality, recursing into objects and arrays for reporting
    Literal(Value),
    /// Named-field composite with an explicit mode
    Record {
        fields: IndexMap<String, Pattern>,
        mode: RecordMode,
    },
    /// Ordered, index-wise sequence
    Sequence(Vec<Pattern>),
    Op(Operator),
}

impl Pattern {
    pub fn literal(value: impl Into<Value>) -> Self {
        Pattern::Literal(value.into())
    }

    /// Record requiring exactly these fields
    pub fn record<I, K, P>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: Into<Pattern>,
    {
        Self::record_with_mode(fields, RecordMode::Strict)
    }

    /// Record requiring these fields and ignoring any other
    pub fn partial<I, K, P>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: Into<Pattern>,
    {
        Self::record_with_mode(fields, RecordMode::Partial)
    }

    /// Record allowing only these fields, each of them optional
    pub fn subset<I, K, P>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: Into<Pattern>,
    {
        Self::record_with_mode(fields, RecordMode::Subset)
    }

    pub fn record_with_mode<I, K, P>(fields: I, mode: RecordMode) -> Self
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: Into<Pattern>,
    {
        Pattern::Record {
            fields: fields
                .into_iter()
                .map(|(k, p)| (k.into(), p.into()))
                .collect(),
            mode,
        }
    }

    /// Ordered sequence of element patterns
    pub fn seq<I, P>(items: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Pattern>,
    {
        Pattern::Sequence(items.into_iter().map(Into::into).collect())
    }

    /// Re-interpret this pattern as a record of the given mode.
    ///
    /// Literal objects become records of literals. Returns `None` when the
    /// pattern is not object-shaped.
    pub fn into_record(self, mode: RecordMode) -> Option<Self> {
        match self {
            Pattern::Record { fields, .. } => Some(Pattern::Record { fields, mode }),
            Pattern::Literal(Value::Object(map)) => Some(Pattern::Record {
                fields: map
                    .into_iter()
                    .map(|(k, v)| (k, Pattern::Literal(v)))
                    .collect(),
                mode,
            }),
            _ => None,
        }
    }

    /// Human readable description used as the "expected" side of a report
    pub fn describe(&self) -> String {
        let text = match self {
            Pattern::Literal(value) => value.to_string(),
            Pattern::Record { fields, mode } => {
                let inner: Vec<String> = fields
                    .iter()
                    .map(|(k, p)| format!("{:?}: {}", k, p.describe()))
                    .collect();
                let body = format!("{{{}}}", inner.join(", "));
                match mode {
                    RecordMode::Strict => body,
                    RecordMode::Partial => format!("SuperMapOf({})", body),
                    RecordMode::Subset => format!("SubMapOf({})", body),
                }
            }
            Pattern::Sequence(items) => {
                let inner: Vec<String> = items.iter().map(Pattern::describe).collect();
                format!("[{}]", inner.join(", "))
            }
            Pattern::Op(op) => op.describe(),
        };
        truncate(text)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl From<Value> for Pattern {
    fn from(value: Value) -> Self {
        Pattern::Literal(value)
    }
}

impl From<Operator> for Pattern {
    fn from(op: Operator) -> Self {
        Pattern::Op(op)
    }
}

impl From<Vec<Pattern>> for Pattern {
    fn from(items: Vec<Pattern>) -> Self {
        Pattern::Sequence(items)
    }
}

macro_rules! pattern_from_literal {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Pattern {
                fn from(v: $t) -> Self {
                    Pattern::Literal(Value::from(v))
                }
            }
        )*
    };
}

pattern_from_literal!(bool, i32, i64, u32, u64, f64, String, &str);
