//! Traversal paths used to label comparison nodes

use std::fmt;

/// Root label used when the caller does not provide one
pub const DEFAULT_ROOT: &str = "DATA";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Field(String),
    Index(usize),
    /// Wraps everything before it, e.g. `len(DATA.children)`
    Call(String),
}

/// Location of a value inside the actual document, e.g. `DATA.children[1].id`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    root: String,
    segments: Vec<Segment>,
}

impl Path {
    /// Create a path pointing at the root value
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            root: name.into(),
            segments: Vec::new(),
        }
    }

    /// Path to a named field of this value
    pub fn field(&self, name: &str) -> Self {
        self.push(Segment::Field(name.to_string()))
    }

    /// Path to an element of this sequence
    pub fn index(&self, index: usize) -> Self {
        self.push(Segment::Index(index))
    }

    /// Path to a value derived from this one by `name` (`len`, `keys`, a smuggler...)
    pub fn call(&self, name: &str) -> Self {
        self.push(Segment::Call(name.to_string()))
    }

    /// Number of segments below the root
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    fn push(&self, segment: Segment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self {
            root: self.root.clone(),
            segments,
        }
    }
}

impl Default for Path {
    fn default() -> Self {
        Self::root(DEFAULT_ROOT)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = self.root.clone();
        for segment in &self.segments {
            match segment {
                Segment::Field(name) if is_identifier(name) => {
                    out.push('.');
                    out.push_str(name);
                }
                Segment::Field(name) => {
                    let quoted =
                        serde_json::to_string(name).unwrap_or_else(|_| format!("\"{}\"", name));
                    out.push('[');
                    out.push_str(&quoted);
                    out.push(']');
                }
                Segment::Index(index) => {
                    out.push_str(&format!("[{}]", index));
                }
                Segment::Call(name) => {
                    out = format!("{}({})", name, out);
                }
            }
        }
        f.write_str(&out)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_path() {
        let path = Path::default().field("children").index(1).field("id");
        assert_eq!(path.to_string(), "DATA.children[1].id");
        assert_eq!(path.depth(), 3);
    }

    #[test]
    fn test_non_identifier_field_is_quoted() {
        let path = Path::root("BODY").field("content-type");
        assert_eq!(path.to_string(), r#"BODY["content-type"]"#);
    }

    #[test]
    fn test_call_wraps_prefix() {
        let path = Path::root("PERSON").field("children").call("len");
        assert_eq!(path.to_string(), "len(PERSON.children)");

        let nested = path.call("keys").index(0);
        assert_eq!(nested.to_string(), "keys(len(PERSON.children))[0]");
    }
}
