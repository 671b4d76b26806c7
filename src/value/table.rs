//! Raw tables
//!
//! A table keeps a dense array part for keys `1..=n` and a hash part for
//! everything else. The array part never ends in `nil` and the hash part
//! never holds key `n + 1`, so `array.len()` is always a valid border.

use super::number::float_to_int;
use super::Value;
use crate::error::{LError, LResult};
use rustc_hash::FxHashMap;
use std::cell::{Ref, RefCell};
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Hash key. Floats with an integral value are stored as integers so that
/// `t[1]` and `t[1.0]` name the same slot.
#[derive(Clone)]
struct Key(Value);

impl Key {
    fn normalize(value: Value) -> Key {
        match value {
            Value::Float(f) => match float_to_int(f) {
                Some(i) => Key(Value::Int(i)),
                None => Key(Value::Float(f)),
            },
            other => Key(other),
        }
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(&self.0).hash(state);
        match &self.0 {
            Value::Nil => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Str(s) => s.hash(state),
            Value::Table(t) => t.addr().hash(state),
            Value::Function(f) => f.addr().hash(state),
            Value::Thread(co) => co.id().hash(state),
        }
    }
}

#[derive(Default)]
pub struct Table {
    array: Vec<Value>,
    hash: FxHashMap<Key, Value>,
}

impl Table {
    pub fn get(&self, key: &Value) -> Value {
        if let Some(i) = array_index(key) {
            if let Some(v) = self.array_slot(i) {
                return v.clone();
            }
        }
        if key.is_nil() {
            return Value::Nil;
        }
        self.hash
            .get(&Key::normalize(key.clone()))
            .cloned()
            .unwrap_or_default()
    }

    pub fn get_int(&self, i: i64) -> Value {
        match self.array_slot(i) {
            Some(v) => v.clone(),
            None => self.get(&Value::Int(i)),
        }
    }

    pub fn get_str(&self, name: &str) -> Value {
        self.get(&Value::string(name))
    }

    pub fn set(&mut self, key: Value, value: Value) -> LResult<()> {
        match &key {
            Value::Nil => return Err(LError::runtime("table index is nil")),
            Value::Float(f) if f.is_nan() => return Err(LError::runtime("table index is NaN")),
            _ => {}
        }
        let key = Key::normalize(key);
        if let Value::Int(i) = key.0 {
            let len = self.array.len() as i64;
            if i >= 1 && i <= len {
                self.array[(i - 1) as usize] = value;
                if i == len {
                    self.trim_array();
                }
                return Ok(());
            }
            if i == len + 1 && !value.is_nil() {
                self.hash.remove(&key);
                self.array.push(value);
                self.migrate_from_hash();
                return Ok(());
            }
        }
        if value.is_nil() {
            self.hash.remove(&key);
        } else {
            self.hash.insert(key, value);
        }
        Ok(())
    }

    /// The border `#t`.
    pub fn len(&self) -> i64 {
        self.array.len() as i64
    }

    pub fn is_empty(&self) -> bool {
        self.array.is_empty() && self.hash.is_empty()
    }

    /// Snapshot of all non-nil entries, array part first.
    pub fn entries(&self) -> Vec<(Value, Value)> {
        let mut out = Vec::with_capacity(self.array.len() + self.hash.len());
        for (i, v) in self.array.iter().enumerate() {
            if !v.is_nil() {
                out.push((Value::Int(i as i64 + 1), v.clone()));
            }
        }
        for (k, v) in &self.hash {
            out.push((k.0.clone(), v.clone()));
        }
        out
    }

    fn array_slot(&self, i: i64) -> Option<&Value> {
        if i >= 1 {
            self.array.get((i - 1) as usize)
        } else {
            None
        }
    }

    fn trim_array(&mut self) {
        while matches!(self.array.last(), Some(Value::Nil)) {
            self.array.pop();
        }
    }

    fn migrate_from_hash(&mut self) {
        if self.hash.is_empty() {
            return;
        }
        loop {
            let next = Key(Value::Int(self.array.len() as i64 + 1));
            match self.hash.remove(&next) {
                Some(v) => self.array.push(v),
                None => break,
            }
        }
    }
}

fn array_index(key: &Value) -> Option<i64> {
    match key {
        Value::Int(i) => Some(*i),
        Value::Float(f) => float_to_int(*f),
        _ => None,
    }
}

/// Shared handle to a table, compared by identity.
#[derive(Clone, Default)]
pub struct TableRef(Rc<RefCell<Table>>);

impl TableRef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Self {
        let table = TableRef::new();
        {
            let mut t = table.0.borrow_mut();
            for (i, v) in values.into_iter().enumerate() {
                // nil holes go through the hash path and simply vanish
                let _ = t.set(Value::Int(i as i64 + 1), v);
            }
        }
        table
    }

    pub fn get(&self, key: &Value) -> Value {
        self.0.borrow().get(key)
    }

    pub fn get_int(&self, i: i64) -> Value {
        self.0.borrow().get_int(i)
    }

    pub fn get_str(&self, name: &str) -> Value {
        self.0.borrow().get_str(name)
    }

    pub fn set(&self, key: Value, value: Value) -> LResult<()> {
        self.0.borrow_mut().set(key, value)
    }

    pub fn set_str(&self, name: &str, value: Value) {
        // a string key is never nil or NaN
        let _ = self.set(Value::string(name), value);
    }

    pub fn len(&self) -> i64 {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn entries(&self) -> Vec<(Value, Value)> {
        self.0.borrow().entries()
    }

    pub fn borrow(&self) -> Ref<'_, Table> {
        self.0.borrow()
    }

    /// Drop every entry. Used to break reference cycles at teardown.
    pub fn clear(&self) {
        let old = std::mem::take(&mut *self.0.borrow_mut());
        drop(old);
    }

    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

impl PartialEq for TableRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
