//! Document value types for the rill view engine.
//!
//! `DocValue` is the engine's representation of an arbitrary nested document.
//! Unlike a plain JSON value it carries a *total* order and a hash so that
//! group keys can be compared structurally, sort keys can live in ordered
//! containers, and min/max accumulators can keep ordered multisets.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::hash::{Hash, Hasher};

/// A document is just a value; pipelines do not require object-shaped roots.
pub type Document = DocValue;

/// An opaque nested document value.
#[derive(Clone, Debug)]
pub enum DocValue {
    /// Absent-as-a-value; sorts before everything else.
    Null,
    /// Boolean.
    Bool(bool),
    /// Numbers are stored as f64; ordering uses `total_cmp`.
    Number(f64),
    /// UTF-8 string.
    String(String),
    /// Ordered array of values.
    Array(Vec<DocValue>),
    /// Object with sorted keys for O(log n) lookup.
    Object(DocObject),
}

/// An object with entries kept sorted by key for binary search.
#[derive(Clone, Debug, Default)]
pub struct DocObject {
    /// Entries stored sorted by key.
    entries: Vec<(String, DocValue)>,
}

impl DocObject {
    /// Creates a new empty object.
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Creates an object with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the object has no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Gets a value by key. O(log n)
    pub fn get(&self, key: &str) -> Option<&DocValue> {
        self.entries
            .binary_search_by(|(k, _)| k.as_str().cmp(key))
            .ok()
            .map(|idx| &self.entries[idx].1)
    }

    /// Gets a mutable value by key. O(log n)
    pub fn get_mut(&mut self, key: &str) -> Option<&mut DocValue> {
        self.entries
            .binary_search_by(|(k, _)| k.as_str().cmp(key))
            .ok()
            .map(|idx| &mut self.entries[idx].1)
    }

    /// Inserts a key-value pair, maintaining sorted order.
    pub fn insert(&mut self, key: impl Into<String>, value: DocValue) {
        let key = key.into();
        match self.entries.binary_search_by(|(k, _)| k.as_str().cmp(&key)) {
            Ok(idx) => {
                self.entries[idx].1 = value;
            }
            Err(idx) => {
                self.entries.insert(idx, (key, value));
            }
        }
    }

    /// Removes a key and returns its value if present.
    pub fn remove(&mut self, key: &str) -> Option<DocValue> {
        self.entries
            .binary_search_by(|(k, _)| k.as_str().cmp(key))
            .ok()
            .map(|idx| self.entries.remove(idx).1)
    }

    /// Returns true if the object contains the given key.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries
            .binary_search_by(|(k, _)| k.as_str().cmp(key))
            .is_ok()
    }

    /// Returns an iterator over the keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Returns an iterator over key-value pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DocValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, DocValue)> for DocObject {
    fn from_iter<I: IntoIterator<Item = (String, DocValue)>>(iter: I) -> Self {
        let mut obj = DocObject::new();
        for (k, v) in iter {
            obj.insert(k, v);
        }
        obj
    }
}

impl DocValue {
    /// Returns true if this is a null value.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, DocValue::Null)
    }

    /// Returns true if this is an array.
    #[inline]
    pub fn is_array(&self) -> bool {
        matches!(self, DocValue::Array(_))
    }

    /// Returns true if this is an object.
    #[inline]
    pub fn is_object(&self) -> bool {
        matches!(self, DocValue::Object(_))
    }

    /// Returns the boolean value if this is a Bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DocValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the numeric value if this is a Number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DocValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the number as i64 if this is an integral Number.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DocValue::Number(n) => {
                let i = *n as i64;
                if (i as f64) == *n {
                    Some(i)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Returns a reference to the string if this is a String.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DocValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Returns a reference to the array if this is an Array.
    pub fn as_array(&self) -> Option<&Vec<DocValue>> {
        match self {
            DocValue::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Returns a reference to the object if this is an Object.
    pub fn as_object(&self) -> Option<&DocObject> {
        match self {
            DocValue::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Returns a mutable reference to the object if this is an Object.
    pub fn as_object_mut(&mut self) -> Option<&mut DocObject> {
        match self {
            DocValue::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Gets a value by key if this is an Object.
    pub fn get(&self, key: &str) -> Option<&DocValue> {
        self.as_object().and_then(|obj| obj.get(key))
    }

    /// Gets a value by index if this is an Array.
    pub fn get_index(&self, index: usize) -> Option<&DocValue> {
        self.as_array().and_then(|arr| arr.get(index))
    }

    /// Rank of the variant in the canonical sort order:
    /// Null < Bool < Number < String < Array < Object.
    fn type_rank(&self) -> u8 {
        match self {
            DocValue::Null => 0,
            DocValue::Bool(_) => 1,
            DocValue::Number(_) => 2,
            DocValue::String(_) => 3,
            DocValue::Array(_) => 4,
            DocValue::Object(_) => 5,
        }
    }
}

impl PartialEq for DocValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DocValue {}

impl PartialOrd for DocValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DocValue {
    /// Total canonical order: variants rank Null < Bool < Number < String <
    /// Array < Object; numbers compare with `total_cmp`, arrays and objects
    /// lexicographically.
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (DocValue::Null, DocValue::Null) => Ordering::Equal,
            (DocValue::Bool(a), DocValue::Bool(b)) => a.cmp(b),
            (DocValue::Number(a), DocValue::Number(b)) => a.total_cmp(b),
            (DocValue::String(a), DocValue::String(b)) => a.cmp(b),
            (DocValue::Array(a), DocValue::Array(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    match x.cmp(y) {
                        Ordering::Equal => {}
                        ord => return ord,
                    }
                }
                a.len().cmp(&b.len())
            }
            (DocValue::Object(a), DocValue::Object(b)) => {
                for ((ka, va), (kb, vb)) in a.iter().zip(b.iter()) {
                    match ka.cmp(kb).then_with(|| va.cmp(vb)) {
                        Ordering::Equal => {}
                        ord => return ord,
                    }
                }
                a.len().cmp(&b.len())
            }
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }
}

impl Hash for DocValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_rank().hash(state);
        match self {
            DocValue::Null => {}
            DocValue::Bool(b) => b.hash(state),
            DocValue::Number(n) => n.to_bits().hash(state),
            DocValue::String(s) => s.hash(state),
            DocValue::Array(arr) => {
                arr.len().hash(state);
                for v in arr {
                    v.hash(state);
                }
            }
            DocValue::Object(obj) => {
                obj.len().hash(state);
                for (k, v) in obj.iter() {
                    k.hash(state);
                    v.hash(state);
                }
            }
        }
    }
}

// From implementations for convenient construction
impl From<bool> for DocValue {
    fn from(v: bool) -> Self {
        DocValue::Bool(v)
    }
}

impl From<i32> for DocValue {
    fn from(v: i32) -> Self {
        DocValue::Number(v as f64)
    }
}

impl From<i64> for DocValue {
    fn from(v: i64) -> Self {
        DocValue::Number(v as f64)
    }
}

impl From<f64> for DocValue {
    fn from(v: f64) -> Self {
        DocValue::Number(v)
    }
}

impl From<String> for DocValue {
    fn from(v: String) -> Self {
        DocValue::String(v)
    }
}

impl From<&str> for DocValue {
    fn from(v: &str) -> Self {
        DocValue::String(v.to_string())
    }
}

impl From<Vec<DocValue>> for DocValue {
    fn from(v: Vec<DocValue>) -> Self {
        DocValue::Array(v)
    }
}

impl From<DocObject> for DocValue {
    fn from(v: DocObject) -> Self {
        DocValue::Object(v)
    }
}

impl<T> From<Option<T>> for DocValue
where
    T: Into<DocValue>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => DocValue::Null,
        }
    }
}
