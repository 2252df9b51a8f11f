//! Comparison engine
//!
//! Walks the actual value and the pattern together and builds a [`Node`]
//! tree. Composite patterns compare every child and aggregate failures, so
//! a single call reports all mismatches.
//!
//! # Catch slots
//!
//! `Catch` stages the actual value as soon as its inner pattern matched.
//! Speculative evaluations (failing `Any` branches, `Not`, `None`, bag
//! probes) roll back whatever they staged. Staged values are committed
//! write-once into the result's [`Captures`] at the end of the run.

use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;
use tracing::{debug, trace};

use crate::bag::max_matching;
use crate::captures::Captures;
use crate::error::{PatternError, PatternResult};
use crate::operator::{BagKind, Bound, Bounds, Operator};
use crate::path::{Path, DEFAULT_ROOT};
use crate::pattern::{Pattern, RecordMode};
use crate::result::{ComparisonResult, DiffCategory, Node};
use crate::value::{is_empty, is_zero, kind_name, length, render};

/// Default bound on traversal depth
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Options for a comparison run
#[derive(Debug, Clone)]
pub struct CompareOptions {
    /// Label of the root value in paths
    pub root_name: String,
    /// Deeper nodes are reported as `Depth` mismatches
    pub max_depth: usize,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            root_name: DEFAULT_ROOT.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl CompareOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root_name(mut self, name: impl Into<String>) -> Self {
        self.root_name = name.into();
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

/// Compare `actual` against `pattern` with default options
pub fn compare(actual: &Value, pattern: &Pattern) -> ComparisonResult {
    compare_with(actual, pattern, &CompareOptions::default())
}

/// Compare `actual` against `pattern`
pub fn compare_with(actual: &Value, pattern: &Pattern, options: &CompareOptions) -> ComparisonResult {
    let mut engine = Engine {
        options,
        staged: Vec::new(),
    };
    let root = engine.compare_node(&Path::root(&options.root_name), actual, pattern);

    let mut captures = Captures::new();
    for (slot, value) in engine.staged {
        captures.write_once(slot, value);
    }

    let result = ComparisonResult { root, captures };
    debug!(
        root = %options.root_name,
        matched = result.matched(),
        failures = result.failures().len(),
        captured = result.captures.len(),
        "Comparison finished"
    );
    result
}

/// Serialize `actual` to JSON, then compare it
pub fn compare_serialize<T: Serialize + ?Sized>(
    actual: &T,
    pattern: &Pattern,
    options: &CompareOptions,
) -> PatternResult<ComparisonResult> {
    let value = serde_json::to_value(actual).map_err(|source| PatternError::Serialize { source })?;
    Ok(compare_with(&value, pattern, options))
}

struct Engine<'o> {
    options: &'o CompareOptions,
    staged: Vec<(String, Value)>,
}

impl Engine<'_> {
    fn compare_node(&mut self, path: &Path, actual: &Value, pattern: &Pattern) -> Node {
        if path.depth() > self.options.max_depth {
            return Node::new(path.to_string(), pattern.describe(), render(actual))
                .fail(DiffCategory::Depth)
                .with_message(format!("maximum depth {} exceeded", self.options.max_depth));
        }

        let node = match pattern {
            Pattern::Literal(expected) => self.compare_literal(path, actual, expected),
            Pattern::Record { fields, mode } => {
                let fields: Vec<(&String, &Pattern)> = fields.iter().collect();
                self.compare_record(path, actual, &fields, *mode, pattern)
            }
            Pattern::Sequence(items) => {
                let items: Vec<&Pattern> = items.iter().collect();
                self.compare_sequence(path, actual, &items, pattern)
            }
            Pattern::Op(op) => self.compare_op(path, actual, op),
        };

        if !node.matched {
            trace!(path = %node.path, category = ?node.category, "Mismatch");
        }
        node
    }

    /// Evaluate without keeping any capture staged by the evaluation
    fn probe(&mut self, path: &Path, actual: &Value, pattern: &Pattern) -> Node {
        let mark = self.staged.len();
        let node = self.compare_node(path, actual, pattern);
        self.staged.truncate(mark);
        node
    }

    fn compare_literal(&mut self, path: &Path, actual: &Value, expected: &Value) -> Node {
        match (expected, actual) {
            (Value::Object(fields), Value::Object(_)) => {
                let literals: Vec<(&String, Pattern)> = fields
                    .iter()
                    .map(|(k, v)| (k, Pattern::Literal(v.clone())))
                    .collect();
                let refs: Vec<(&String, &Pattern)> = literals.iter().map(|(k, p)| (*k, p)).collect();
                let whole = Pattern::Literal(expected.clone());
                self.compare_record(path, actual, &refs, RecordMode::Strict, &whole)
            }
            (Value::Array(items), Value::Array(_)) => {
                let literals: Vec<Pattern> = items.iter().cloned().map(Pattern::Literal).collect();
                let refs: Vec<&Pattern> = literals.iter().collect();
                let whole = Pattern::Literal(expected.clone());
                self.compare_sequence(path, actual, &refs, &whole)
            }
            _ => {
                let node = Node::new(path.to_string(), expected.to_string(), render(actual));
                if kind_name(expected) != kind_name(actual) {
                    node.fail(DiffCategory::Type).with_message(format!(
                        "{} expected, got {}",
                        kind_name(expected),
                        kind_name(actual)
                    ))
                } else if expected != actual {
                    node.fail(DiffCategory::Value)
                } else {
                    node
                }
            }
        }
    }

    fn compare_record(
        &mut self,
        path: &Path,
        actual: &Value,
        fields: &[(&String, &Pattern)],
        mode: RecordMode,
        whole: &Pattern,
    ) -> Node {
        let node = Node::new(path.to_string(), whole.describe(), render(actual));
        let Value::Object(object) = actual else {
            return type_mismatch(node, "object", actual);
        };

        let mut children = Vec::with_capacity(fields.len());
        for (name, expected) in fields {
            let field_path = path.field(name);
            match object.get(name.as_str()) {
                Some(value) => children.push(self.compare_node(&field_path, value, expected)),
                None if mode == RecordMode::Subset => {}
                None => children.push(
                    Node::new(field_path.to_string(), expected.describe(), "(missing)".to_string())
                        .fail(DiffCategory::Missing),
                ),
            }
        }

        if mode != RecordMode::Partial {
            for (name, value) in object {
                if !fields.iter().any(|(k, _)| *k == name) {
                    children.push(
                        Node::new(
                            path.field(name).to_string(),
                            "(not expected)".to_string(),
                            render(value),
                        )
                        .fail(DiffCategory::Extra),
                    );
                }
            }
        }

        node.with_children(children)
    }

    fn compare_sequence(
        &mut self,
        path: &Path,
        actual: &Value,
        items: &[&Pattern],
        whole: &Pattern,
    ) -> Node {
        let mut node = Node::new(path.to_string(), whole.describe(), render(actual));
        let Value::Array(elements) = actual else {
            return type_mismatch(node, "array", actual);
        };

        let mut children = Vec::with_capacity(items.len().max(elements.len()));
        for index in 0..items.len().max(elements.len()) {
            let item_path = path.index(index);
            match (elements.get(index), items.get(index)) {
                (Some(value), Some(expected)) => {
                    children.push(self.compare_node(&item_path, value, expected))
                }
                (None, Some(expected)) => children.push(
                    Node::new(item_path.to_string(), expected.describe(), "(missing)".to_string())
                        .fail(DiffCategory::Missing),
                ),
                (Some(value), None) => children.push(
                    Node::new(item_path.to_string(), "(not expected)".to_string(), render(value))
                        .fail(DiffCategory::Extra),
                ),
                (None, None) => {}
            }
        }

        if elements.len() != items.len() {
            node = node.fail(DiffCategory::Length).with_message(format!(
                "{} item(s) expected, got {}",
                items.len(),
                elements.len()
            ));
        }
        node.with_children(children)
    }

    fn compare_op(&mut self, path: &Path, actual: &Value, op: &Operator) -> Node {
        let node = Node::new(path.to_string(), op.describe(), render(actual));

        match op {
            Operator::Ignore => node,
            Operator::Zero => check(node, is_zero(actual)),
            Operator::NotZero => check(node, !is_zero(actual)),
            Operator::Empty | Operator::NotEmpty => match is_empty(actual) {
                Some(empty) => check(node, empty == matches!(op, Operator::Empty)),
                None => type_mismatch(node, "string, array, object or null", actual),
            },
            Operator::Nil => check(node, actual.is_null()),
            Operator::NotNil => check(node, !actual.is_null()),

            Operator::Between { low, high, bounds } => {
                if Bound::is_reversed(low, high) {
                    return node
                        .fail(DiffCategory::Operator)
                        .with_message(format!("empty range: {} is greater than {}", low, high));
                }
                let (Some(lo), Some(hi)) = (low.order(actual), high.order(actual)) else {
                    return type_mismatch(node, bound_kind(low), actual);
                };
                let above_low = match bounds {
                    Bounds::InIn | Bounds::InOut => lo != Ordering::Less,
                    Bounds::OutIn | Bounds::OutOut => lo == Ordering::Greater,
                };
                let below_high = match bounds {
                    Bounds::InIn | Bounds::OutIn => hi != Ordering::Greater,
                    Bounds::InOut | Bounds::OutOut => hi == Ordering::Less,
                };
                check(node, above_low && below_high)
            }
            Operator::Gt(bound) => ordered(node, bound, actual, |o| o == Ordering::Greater),
            Operator::Gte(bound) => ordered(node, bound, actual, |o| o != Ordering::Less),
            Operator::Lt(bound) => ordered(node, bound, actual, |o| o == Ordering::Less),
            Operator::Lte(bound) => ordered(node, bound, actual, |o| o != Ordering::Greater),

            Operator::Len(expected) => match length(actual) {
                Some(len) => {
                    let child = self.compare_node(&path.call("len"), &Value::from(len), expected);
                    node.with_children(vec![child])
                }
                None => type_mismatch(node, "string, array or object", actual),
            },
            Operator::HasPrefix(prefix) => match actual.as_str() {
                Some(s) => check(node, s.starts_with(prefix.as_str())),
                None => type_mismatch(node, "string", actual),
            },
            Operator::HasSuffix(suffix) => match actual.as_str() {
                Some(s) => check(node, s.ends_with(suffix.as_str())),
                None => type_mismatch(node, "string", actual),
            },
            Operator::Contains(expected) => self.compare_contains(node, path, actual, expected),
            Operator::Re(re) => match actual.as_str() {
                Some(s) => check(node, re.is_match(s)),
                None => type_mismatch(node, "string", actual),
            },
            Operator::ContainsKey(key) => match actual.as_object() {
                Some(object) => check(node, object.contains_key(key.as_str())),
                None => type_mismatch(node, "object", actual),
            },
            Operator::Keys(expected) => match actual.as_object() {
                Some(object) => {
                    let mut keys: Vec<&String> = object.keys().collect();
                    keys.sort();
                    let keys = Value::Array(keys.into_iter().map(|k| Value::from(k.as_str())).collect());
                    let child = self.compare_node(&path.call("keys"), &keys, expected);
                    node.with_children(vec![child])
                }
                None => type_mismatch(node, "object", actual),
            },
            Operator::Isa(kind) => check(node, kind.matches(actual)),

            Operator::Bag { kind, items } => self.compare_bag(node, path, actual, *kind, items),
            Operator::ArrayEach(expected) => match actual.as_array() {
                Some(elements) => {
                    let children = elements
                        .iter()
                        .enumerate()
                        .map(|(i, v)| self.compare_node(&path.index(i), v, expected))
                        .collect();
                    node.with_children(children)
                }
                None => type_mismatch(node, "array", actual),
            },

            Operator::All(items) => {
                let children: Vec<Node> = items
                    .iter()
                    .map(|p| self.compare_node(path, actual, p))
                    .collect();
                node.with_children(children)
            }
            Operator::Any(items) => {
                let mut children = Vec::with_capacity(items.len());
                for expected in items {
                    let mark = self.staged.len();
                    let child = self.compare_node(path, actual, expected);
                    if !child.matched {
                        self.staged.truncate(mark);
                    }
                    children.push(child);
                }
                if children.iter().any(|c| c.matched) {
                    Node { children, ..node }
                } else {
                    let count = children.len();
                    node.fail(DiffCategory::Operator)
                        .with_message(format!("none of {} alternative(s) matched", count))
                        .with_children(children)
                }
            }
            Operator::NoneOf(items) => {
                let hits: Vec<usize> = items
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| self.probe(path, actual, p).matched)
                    .map(|(i, _)| i)
                    .collect();
                if hits.is_empty() {
                    node
                } else {
                    node.fail(DiffCategory::Operator).with_message(format!(
                        "alternative(s) #{} matched",
                        hits.iter().map(usize::to_string).collect::<Vec<_>>().join(", #")
                    ))
                }
            }
            Operator::Not(expected) => {
                if self.probe(path, actual, expected).matched {
                    node.fail(DiffCategory::Operator)
                        .with_message("negated pattern matched")
                } else {
                    node
                }
            }

            Operator::Catch { slot, pattern } => {
                let inner = self.compare_node(path, actual, pattern);
                if inner.matched {
                    trace!(slot = %slot, path = %inner.path, "Catch slot staged");
                    self.staged.push((slot.clone(), actual.clone()));
                }
                inner
            }
            Operator::Code { predicate, .. } => check(node, predicate.call(actual)),
            Operator::Smuggle {
                name,
                transform,
                pattern,
            } => match transform.call(actual) {
                Ok(value) => {
                    let child = self.compare_node(&path.call(name), &value, pattern);
                    node.with_children(vec![child])
                }
                Err(message) => node.fail(DiffCategory::Operator).with_message(message),
            },
        }
    }

    fn compare_contains(&mut self, node: Node, path: &Path, actual: &Value, expected: &Pattern) -> Node {
        match actual {
            Value::String(s) => match expected {
                Pattern::Literal(Value::String(needle)) => check(node, s.contains(needle.as_str())),
                _ => node
                    .fail(DiffCategory::Operator)
                    .with_message("only a literal string can be searched in a string"),
            },
            Value::Array(elements) => {
                let candidates = elements.iter().enumerate().map(|(i, v)| (path.index(i), v));
                self.contains_any(node, candidates, expected)
            }
            Value::Object(object) => {
                let candidates = object.iter().map(|(k, v)| (path.field(k), v));
                self.contains_any(node, candidates, expected)
            }
            _ => type_mismatch(node, "string, array or object", actual),
        }
    }

    /// Match the first candidate accepted by `expected`, re-running it so
    /// its node and catches are kept
    fn contains_any<'v>(
        &mut self,
        node: Node,
        candidates: impl Iterator<Item = (Path, &'v Value)>,
        expected: &Pattern,
    ) -> Node {
        for (item_path, value) in candidates {
            if self.probe(&item_path, value, expected).matched {
                let child = self.compare_node(&item_path, value, expected);
                return node.with_children(vec![child]);
            }
        }
        node.fail(DiffCategory::Operator)
    }

    fn compare_bag(
        &mut self,
        node: Node,
        path: &Path,
        actual: &Value,
        kind: BagKind,
        items: &[Pattern],
    ) -> Node {
        let Value::Array(elements) = actual else {
            return type_mismatch(node, "array", actual);
        };

        let compatible: Vec<Vec<bool>> = items
            .iter()
            .map(|expected| {
                elements
                    .iter()
                    .enumerate()
                    .map(|(i, v)| self.probe(&path.index(i), v, expected).matched)
                    .collect()
            })
            .collect();
        let owner = max_matching(&compatible, elements.len());

        let unmatched_items: Vec<usize> = (0..items.len())
            .filter(|row| !owner.contains(&Some(*row)))
            .collect();
        let unmatched_elements: Vec<usize> = (0..elements.len())
            .filter(|col| owner[*col].is_none())
            .collect();

        let ok = match kind {
            BagKind::Bag => unmatched_items.is_empty() && unmatched_elements.is_empty(),
            BagKind::SuperBagOf => unmatched_items.is_empty(),
            BagKind::SubBagOf => unmatched_elements.is_empty(),
        };

        if !ok {
            let mut parts = Vec::new();
            if kind != BagKind::SubBagOf && !unmatched_items.is_empty() {
                let missing: Vec<String> = unmatched_items.iter().map(|&r| items[r].describe()).collect();
                parts.push(format!("missing: {}", missing.join(", ")));
            }
            if kind != BagKind::SuperBagOf && !unmatched_elements.is_empty() {
                let extra: Vec<String> = unmatched_elements.iter().map(|&c| render(&elements[c])).collect();
                parts.push(format!("extra: {}", extra.join(", ")));
            }
            debug!(
                path = %path,
                bag = kind.name(),
                missing = unmatched_items.len(),
                extra = unmatched_elements.len(),
                "Bag assignment failed"
            );
            return node.fail(DiffCategory::Bag).with_message(parts.join("; "));
        }

        // Re-run the chosen pairs for real so their nodes and catches are kept
        let children = owner
            .iter()
            .enumerate()
            .filter_map(|(col, row)| row.map(|row| (col, row)))
            .map(|(col, row)| self.compare_node(&path.index(col), &elements[col], &items[row]))
            .collect();
        node.with_children(children)
    }
}

fn check(node: Node, ok: bool) -> Node {
    if ok {
        node
    } else {
        node.fail(DiffCategory::Operator)
    }
}

fn ordered(node: Node, bound: &Bound, actual: &Value, accept: impl Fn(Ordering) -> bool) -> Node {
    match bound.order(actual) {
        Some(order) => check(node, accept(order)),
        None => type_mismatch(node, bound_kind(bound), actual),
    }
}

fn bound_kind(bound: &Bound) -> &'static str {
    match bound {
        Bound::Number(_) => "number",
        Bound::String(_) => "string",
    }
}

fn type_mismatch(node: Node, expected_kind: &str, actual: &Value) -> Node {
    node.fail(DiffCategory::Type)
        .with_message(format!("{} expected, got {}", expected_kind, kind_name(actual)))
}
