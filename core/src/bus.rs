//! Bus - Type-Safe Request Scratch Space
//!
//! The Bus carries per-request values between transitions (request id, caller
//! identity). It is created fresh for every execution and never shared.
//!
//! The Bus does NOT use string keys.

use std::any::{Any, TypeId};
use std::collections::HashMap;

/// Type-keyed value container (TypeMap pattern).
#[derive(Default)]
pub struct Bus {
    values: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Bus {
    /// Create a new empty Bus
    pub fn new() -> Self {
        Bus {
            values: HashMap::new(),
        }
    }

    /// Insert a value into the Bus.
    ///
    /// If a value of this type already exists, it is replaced.
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) {
        self.values.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Get a reference to a value.
    ///
    /// Returns `None` if the type is not present.
    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref())
    }

    /// Get a mutable reference to a value.
    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.values
            .get_mut(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_mut())
    }

    /// Check if a value of this type is present.
    pub fn contains<T: 'static>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<T>())
    }

    /// Remove a value from the Bus, returning it if present.
    pub fn remove<T: 'static>(&mut self) -> Option<T> {
        self.values
            .remove(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast().ok())
            .map(|boxed| *boxed)
    }
}

impl std::fmt::Debug for Bus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bus")
            .field("value_count", &self.values.len())
            .finish()
    }
}
