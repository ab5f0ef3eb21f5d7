//! Loop runtime context
//!
//! The per-iteration metadata record visible to templates as `loop`:
//! `index` (1-based), `count`, `first`, `last`, `even`/`odd` parity, the
//! current iteration `key`, and a `parent` link to the enclosing loop's
//! context. Contexts chain explicitly: entering a nested loop boxes the
//! active context as the new one's parent, and leaving restores it
//! unchanged, so the enclosing loop never observes inner-loop state.

use crate::value::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct LoopContext {
    pub index: i64,
    pub count: i64,
    pub first: bool,
    pub last: bool,
    pub even: bool,
    pub odd: bool,
    pub key: Value,
    pub parent: Option<Box<LoopContext>>,
}

impl LoopContext {
    /// Establish the context immediately before iteration 1.
    pub fn enter(count: i64, first_key: Value, parent: Option<Box<LoopContext>>) -> Self {
        Self {
            index: 1,
            count,
            first: true,
            last: count == 1,
            even: false,
            odd: true,
            key: first_key,
            parent,
        }
    }

    /// Advance to the next iteration.
    pub fn advance(&mut self, key: Value) {
        self.index += 1;
        self.first = false;
        self.last = self.index == self.count;
        self.even = self.index % 2 == 0;
        self.odd = !self.even;
        self.key = key;
    }

    /// Tear the context down, restoring the enclosing loop's context.
    pub fn exit(self) -> Option<Box<LoopContext>> {
        self.parent
    }

    /// Materialize the metadata record (including the parent chain) as a
    /// map value, so paths like `loop.parent.index` resolve like any other
    /// member access.
    pub fn meta_value(&self) -> Value {
        let mut meta = BTreeMap::new();
        meta.insert("index".to_string(), Value::Int(self.index));
        meta.insert("count".to_string(), Value::Int(self.count));
        meta.insert("first".to_string(), Value::Bool(self.first));
        meta.insert("last".to_string(), Value::Bool(self.last));
        meta.insert("even".to_string(), Value::Bool(self.even));
        meta.insert("odd".to_string(), Value::Bool(self.odd));
        meta.insert("key".to_string(), self.key.clone());
        if let Some(parent) = &self.parent {
            meta.insert("parent".to_string(), parent.meta_value());
        }
        Value::Map(meta)
    }
}
