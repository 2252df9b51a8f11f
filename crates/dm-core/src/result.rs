//! Comparison results and diff reports

use std::fmt;

use crate::captures::Captures;

/// Why a node failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffCategory {
    /// Same kind, different value
    Value,
    /// Kind of the actual value incompatible with the pattern
    Type,
    /// Field or element expected but absent
    Missing,
    /// Field or element present but not expected
    Extra,
    /// Sequence length differs
    Length,
    /// Operator predicate not satisfied
    Operator,
    /// No acceptable assignment between bag elements and sub-patterns
    Bag,
    /// Traversal exceeded the configured depth
    Depth,
}

impl fmt::Display for DiffCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffCategory::Value => write!(f, "VALUE"),
            DiffCategory::Type => write!(f, "TYPE"),
            DiffCategory::Missing => write!(f, "MISSING"),
            DiffCategory::Extra => write!(f, "EXTRA"),
            DiffCategory::Length => write!(f, "LENGTH"),
            DiffCategory::Operator => write!(f, "OPERATOR"),
            DiffCategory::Bag => write!(f, "BAG"),
            DiffCategory::Depth => write!(f, "DEPTH"),
        }
    }
}

/// One visited location of the actual value
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub path: String,
    pub matched: bool,
    pub expected: String,
    pub actual: String,
    /// Set when this node failed on its own rather than through a child
    pub category: Option<DiffCategory>,
    pub message: Option<String>,
    pub children: Vec<Node>,
}

impl Node {
    pub(crate) fn new(path: String, expected: String, actual: String) -> Self {
        Self {
            path,
            matched: true,
            expected,
            actual,
            category: None,
            message: None,
            children: Vec::new(),
        }
    }

    pub(crate) fn fail(mut self, category: DiffCategory) -> Self {
        self.matched = false;
        self.category = Some(category);
        self
    }

    pub(crate) fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attach children; the node fails if any child failed
    pub(crate) fn with_children(mut self, children: Vec<Node>) -> Self {
        if children.iter().any(|c| !c.matched) {
            self.matched = false;
        }
        self.children = children;
        self
    }

    fn collect_failures<'a>(&'a self, out: &mut Vec<&'a Node>) {
        if self.matched {
            return;
        }
        if self.category.is_some() {
            out.push(self);
        }
        for child in &self.children {
            child.collect_failures(out);
        }
    }
}

/// Outcome of comparing an actual value against a pattern
#[derive(Debug, Clone)]
pub struct ComparisonResult {
    pub root: Node,
    pub captures: Captures,
}

impl ComparisonResult {
    pub fn matched(&self) -> bool {
        self.root.matched
    }

    /// Every node that failed on its own, in traversal order
    pub fn failures(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        self.root.collect_failures(&mut out);
        out
    }

    /// Multi-line diff report, one line per failing path.
    ///
    /// `max_errors` limits the number of lines; the remainder is summarized.
    pub fn report(&self, max_errors: Option<usize>) -> String {
        let failures = self.failures();
        if failures.is_empty() {
            return format!("{}: all checks passed", self.root.path);
        }

        let mut out = format!("{} mismatch(es):\n", failures.len());
        let limit = max_errors.unwrap_or(usize::MAX);
        for node in failures.iter().take(limit) {
            let category = node.category.map(|c| c.to_string()).unwrap_or_default();
            out.push_str(&format!(
                "   [{:>8}] {}: expected {}, got {}",
                category, node.path, node.expected, node.actual
            ));
            if let Some(message) = &node.message {
                out.push_str(&format!(" ({})", message));
            }
            out.push('\n');
        }
        if failures.len() > limit {
            out.push_str(&format!(
                "   ... and {} more mismatch(es)\n",
                failures.len() - limit
            ));
        }
        out
    }

    /// Print the report to stdout
    pub fn print_summary(&self) {
        if self.matched() {
            println!("✅ {} - PASS", self.root.path);
        } else {
            println!("❌ {} - FAIL", self.root.path);
            print!("{}", self.report(None));
        }
    }
}

impl fmt::Display for ComparisonResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.report(None))
    }
}
