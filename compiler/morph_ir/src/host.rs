//! Host functions embedded in mapping graphs.
//!
//! Getter methods, custom resolver callbacks, converter overrides, and
//! after-mapping hooks are all host closures. The graph stores them by value
//! so a compiled function never reaches back into configuration.

use std::fmt;
use std::sync::Arc;

use crate::{EvalResult, TypeId, Value};

/// Signature of a host function.
pub type HostFnPtr = dyn Fn(&[Value]) -> EvalResult + Send + Sync;

/// A named host closure with a declared return type.
#[derive(Clone)]
pub struct HostFn {
    name: Arc<str>,
    returns: TypeId,
    func: Arc<HostFnPtr>,
}

impl HostFn {
    pub fn new(
        name: impl Into<Arc<str>>,
        returns: TypeId,
        func: impl Fn(&[Value]) -> EvalResult + Send + Sync + 'static,
    ) -> Self {
        HostFn {
            name: name.into(),
            returns,
            func: Arc::new(func),
        }
    }

    #[inline]
    pub fn call(&self, args: &[Value]) -> EvalResult {
        (self.func)(args)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared return type; `TypeId::OBJECT` when dynamic.
    pub fn returns(&self) -> TypeId {
        self.returns
    }
}

impl PartialEq for HostFn {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.returns == other.returns && Arc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for HostFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostFn({}: {:?})", self.name, self.returns)
    }
}
