//! Runtime values flowing through compiled mapping functions.
//!
//! # Identity
//!
//! Objects, lists, dictionaries, and grids are [`Shared`]: an `Arc` around a
//! lock, so clones alias the same instance. Identity matters twice:
//! - reference preservation keys its call-scoped map by [`Value::identity`]
//! - `MapToTarget` writes into the caller's instance rather than a copy
//!
//! Scalars are plain inline values. `Str` shares its buffer through `Arc<str>`.
//!
//! # Equality
//!
//! `PartialEq` is structural (deep) and short-circuits on shared identity.
//! Comparing two distinct cyclic object graphs does not terminate.

mod shared;

use std::sync::Arc;

use rustc_hash::FxHashMap;

pub use shared::Shared;

use crate::{EvalError, Name, TypeId};

/// Runtime value.
#[derive(Clone, Debug)]
pub enum Value {
    /// Absent reference or empty nullable.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Char(char),
    Str(Arc<str>),
    /// Milliseconds since the Unix epoch.
    Timestamp(i64),
    Enum(EnumValue),
    Object(Shared<ObjectData>),
    /// Collections and single-dimensional arrays.
    List(Shared<ListData>),
    Dict(Shared<DictData>),
    /// Multi-dimensional arrays, stored row-major.
    Grid(Shared<GridData>),
}

/// An enum variant tagged with its declaring type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct EnumValue {
    pub ty: TypeId,
    pub variant: Name,
    pub discriminant: i64,
}

/// Object instance: a runtime type plus named member slots.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectData {
    pub ty: TypeId,
    pub fields: FxHashMap<Name, Value>,
}

/// Collection or array contents.
#[derive(Clone, Debug, PartialEq)]
pub struct ListData {
    pub ty: TypeId,
    pub items: Vec<Value>,
}

/// Dictionary contents in insertion order.
#[derive(Clone, Debug, PartialEq)]
pub struct DictData {
    pub ty: TypeId,
    pub entries: Vec<(Value, Value)>,
}

/// Multi-dimensional array contents.
#[derive(Clone, Debug, PartialEq)]
pub struct GridData {
    pub ty: TypeId,
    pub dims: Vec<usize>,
    pub items: Vec<Value>,
}

impl DictData {
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Look up a string key by exact text.
    pub fn get_str(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_str() == Some(key))
            .map(|(_, v)| v)
    }

    /// Insert or overwrite, keeping the original position of existing keys.
    pub fn insert(&mut self, key: Value, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }
}

// Factory methods

impl Value {
    #[inline]
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Value::Str(s.into())
    }

    pub fn object(ty: TypeId, fields: impl IntoIterator<Item = (Name, Value)>) -> Self {
        Value::Object(Shared::new(ObjectData {
            ty,
            fields: fields.into_iter().collect(),
        }))
    }

    pub fn list(ty: TypeId, items: Vec<Value>) -> Self {
        Value::List(Shared::new(ListData { ty, items }))
    }

    pub fn dict(ty: TypeId, entries: Vec<(Value, Value)>) -> Self {
        Value::Dict(Shared::new(DictData { ty, entries }))
    }

    pub fn grid(ty: TypeId, dims: Vec<usize>, items: Vec<Value>) -> Self {
        Value::Grid(Shared::new(GridData { ty, dims, items }))
    }

    pub fn enum_variant(ty: TypeId, variant: Name, discriminant: i64) -> Self {
        Value::Enum(EnumValue {
            ty,
            variant,
            discriminant,
        })
    }
}

// Inspection

impl Value {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the value's shape, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Char(_) => "char",
            Value::Str(_) => "str",
            Value::Timestamp(_) => "timestamp",
            Value::Enum(_) => "enum",
            Value::Object(_) => "object",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
            Value::Grid(_) => "grid",
        }
    }

    /// The type a value carries at run time. `Null` reports `OBJECT`.
    pub fn runtime_type(&self) -> TypeId {
        match self {
            Value::Null => TypeId::OBJECT,
            Value::Bool(_) => TypeId::BOOL,
            Value::Int(_) => TypeId::INT,
            Value::Float(_) => TypeId::FLOAT,
            Value::Char(_) => TypeId::CHAR,
            Value::Str(_) => TypeId::STR,
            Value::Timestamp(_) => TypeId::TIMESTAMP,
            Value::Enum(e) => e.ty,
            Value::Object(o) => o.read().ty,
            Value::List(l) => l.read().ty,
            Value::Dict(d) => d.read().ty,
            Value::Grid(g) => g.read().ty,
        }
    }

    /// Address of the shared instance, for values that have identity.
    pub fn identity(&self) -> Option<usize> {
        match self {
            Value::Object(o) => Some(o.addr()),
            Value::List(l) => Some(l.addr()),
            Value::Dict(d) => Some(d.addr()),
            Value::Grid(g) => Some(g.addr()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Read an object member. Reading through `Null` yields `Null`, so member
    /// chains built by flattening propagate absence instead of failing.
    pub fn member(&self, name: Name) -> Result<Value, EvalError> {
        match self {
            Value::Null => Ok(Value::Null),
            Value::Object(o) => Ok(o.read().fields.get(&name).cloned().unwrap_or(Value::Null)),
            other => Err(EvalError::mismatch("object", other)),
        }
    }

    /// Write an object member in place.
    pub fn set_member(&self, name: Name, value: Value) -> Result<(), EvalError> {
        match self {
            Value::Object(o) => {
                o.write().fields.insert(name, value);
                Ok(())
            }
            other => Err(EvalError::mismatch("object", other)),
        }
    }

    /// Snapshot of the items of a list or grid.
    pub fn items(&self) -> Result<Vec<Value>, EvalError> {
        match self {
            Value::List(l) => Ok(l.read().items.clone()),
            Value::Grid(g) => Ok(g.read().items.clone()),
            other => Err(EvalError::mismatch("sequence", other)),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) | (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Enum(a), Value::Enum(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Dict(a), Value::Dict(b)) => a == b,
            (Value::Grid(a), Value::Grid(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

#[cfg(test)]
mod tests;
