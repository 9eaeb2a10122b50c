//! Lists
//!
//! An ordered sequence of values. Lists are how the parser hands commands to
//! the evaluator (one value per word) and how the list commands represent
//! their data. A list renders back to a single value by joining its elements
//! with spaces; the escaped rendering is re-parseable and round-trips
//! byte-exactly, including embedded braces.

use crate::bytes::{is_punct, is_space};
use crate::value::Value;

#[derive(Clone, Default, Debug)]
pub struct List {
    items: Vec<Value>,
}

/// An element must be brace-quoted if it is empty or contains any
/// punctuation or whitespace byte.
fn needs_escape(s: &[u8]) -> bool {
    s.is_empty() || s.iter().any(|&b| is_punct(b) || is_space(b))
}

impl List {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value, taking ownership.
    pub fn append(&mut self, val: Value) {
        self.items.push(val);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Borrow an element; out of range is `None`.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.items
    }

    /// Join the elements into a single value, separated by single spaces.
    ///
    /// With `escape`, elements that need it are wrapped in `{...}`. A brace
    /// inside an element cannot simply be emitted (the wrapper must stay
    /// balanced), so the wrapper is closed, the brace is emitted as the
    /// quoted escape `"\o"` / `"\c"`, and the wrapper reopens. The parser
    /// concatenates adjacent word productions, so the rendering reads back
    /// as the original bytes.
    pub fn to_value(&self, escape: bool) -> Value {
        let mut val = Value::empty();
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                val.append_byte(b' ');
            }

            if escape && needs_escape(item.as_bytes()) {
                val.append_byte(b'{');
                for &b in item.as_bytes() {
                    match b {
                        b'{' => val.append_bytes(b"}\"\\o\"{"),
                        b'}' => val.append_bytes(b"}\"\\c\"{"),
                        _ => val.append_byte(b),
                    }
                }
                val.append_byte(b'}');
            } else {
                val.append(item);
            }
        }
        val
    }
}

impl FromIterator<Value> for List {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a List {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
