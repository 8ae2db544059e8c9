//! Dotted-path access into document values.
//!
//! Paths are dot-separated field names (`"a.b.c"`). A segment that parses as
//! an unsigned integer indexes into an array. Resolution never fails: an
//! unresolvable path yields `None`, the engine-wide "missing" sentinel.

use crate::value::DocValue;
use alloc::string::String;
use alloc::vec::Vec;

impl DocValue {
    /// Resolves a dotted path against this value.
    ///
    /// Returns `None` ("missing") when any segment does not resolve.
    pub fn path(&self, path: &str) -> Option<&DocValue> {
        let mut current = self;
        for segment in path.split('.') {
            current = match current {
                DocValue::Object(obj) => obj.get(segment)?,
                DocValue::Array(arr) => {
                    let idx: usize = segment.parse().ok()?;
                    arr.get(idx)?
                }
                _ => return None,
            };
        }
        Some(current)
    }

    /// Sets the value at a dotted path, creating intermediate objects.
    ///
    /// Non-object intermediates are replaced by objects; array segments are
    /// not writable through this method.
    pub fn set_path(&mut self, path: &str, value: DocValue) {
        let segments: Vec<&str> = path.split('.').collect();
        set_inner(self, &segments, value);
    }

    /// Removes the value at a dotted path. A missing path is a no-op.
    pub fn remove_path(&mut self, path: &str) {
        let segments: Vec<&str> = path.split('.').collect();
        remove_inner(self, &segments);
    }
}

fn set_inner(target: &mut DocValue, segments: &[&str], value: DocValue) {
    let (head, rest) = match segments.split_first() {
        Some(split) => split,
        None => return,
    };

    if !target.is_object() {
        *target = DocValue::Object(crate::value::DocObject::new());
    }
    let obj = match target.as_object_mut() {
        Some(obj) => obj,
        None => return,
    };

    if rest.is_empty() {
        obj.insert(String::from(*head), value);
        return;
    }

    if obj.get(*head).is_none() {
        obj.insert(
            String::from(*head),
            DocValue::Object(crate::value::DocObject::new()),
        );
    }
    if let Some(child) = obj.get_mut(*head) {
        set_inner(child, rest, value);
    }
}

fn remove_inner(target: &mut DocValue, segments: &[&str]) {
    let (head, rest) = match segments.split_first() {
        Some(split) => split,
        None => return,
    };
    let obj = match target.as_object_mut() {
        Some(obj) => obj,
        None => return,
    };
    if rest.is_empty() {
        obj.remove(head);
    } else if let Some(child) = obj.get_mut(*head) {
        remove_inner(child, rest);
    }
}
