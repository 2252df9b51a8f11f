//! Values bound to template placeholders

use dm_core::Pattern;
use indexmap::IndexMap;

/// Patterns referenced from a template as `$1`, `$2`... or `$name`
#[derive(Debug, Clone, Default)]
pub struct Params {
    positional: Vec<Pattern>,
    named: IndexMap<String, Pattern>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the next numbered placeholder (`$1` first)
    pub fn with(mut self, pattern: impl Into<Pattern>) -> Self {
        self.positional.push(pattern.into());
        self
    }

    /// Bind `$name`
    pub fn with_named(mut self, name: impl Into<String>, pattern: impl Into<Pattern>) -> Self {
        self.named.insert(name.into(), pattern.into());
        self
    }

    /// Pattern bound to `$index` (1-based)
    pub fn positional(&self, index: usize) -> Option<&Pattern> {
        index.checked_sub(1).and_then(|i| self.positional.get(i))
    }

    pub fn named(&self, name: &str) -> Option<&Pattern> {
        self.named.get(name)
    }

    pub fn len(&self) -> usize {
        self.positional.len() + self.named.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<P: Into<Pattern>> FromIterator<P> for Params {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self {
            positional: iter.into_iter().map(Into::into).collect(),
            named: IndexMap::new(),
        }
    }
}
