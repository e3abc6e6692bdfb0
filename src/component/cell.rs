//! Aliasable single-value storage.
//!
//! A [`SharedCell`] is a handle to one storage slot. [`SharedCell::point_to`]
//! rebinds a handle onto another handle's slot, so a downstream stage's
//! `inputs` can read an upstream stage's `outputs` without copying anything
//! at wiring time. Cloning a cell produces another handle to the same slot.
//!
//! A cell aliases exactly one slot; calling `point_to` again replaces the
//! previous target.

use crate::error::{Result, StageGraphError};
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub struct SharedCell<T> {
    slot: Arc<RwLock<Option<T>>>,
}

impl<T> SharedCell<T> {
    /// A cell with its own, still empty, slot.
    pub fn new() -> Self {
        Self {
            slot: Arc::new(RwLock::new(None)),
        }
    }

    /// A cell with its own slot holding `value`.
    pub fn with_value(value: T) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Some(value))),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<T>> {
        self.slot.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<T>> {
        self.slot.write().unwrap_or_else(|p| p.into_inner())
    }

    /// Store `value` in the slot; every alias observes it.
    pub fn set(&self, value: T) {
        *self.write() = Some(value);
    }

    /// Borrow the current value for the duration of `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> Result<R> {
        let guard = self.read();
        guard.as_ref().map(f).ok_or(StageGraphError::UnboundReference)
    }

    /// Move the value out, leaving the slot empty.
    pub fn take(&self) -> Option<T> {
        self.write().take()
    }

    /// Empty the slot.
    pub fn clear(&self) {
        *self.write() = None;
    }

    pub fn is_set(&self) -> bool {
        self.read().is_some()
    }

    /// Rebind this handle onto `other`'s slot. The previous slot is left to
    /// whatever other handles still hold it.
    pub fn point_to(&mut self, other: &SharedCell<T>) {
        self.slot = Arc::clone(&other.slot);
    }

    /// Give this handle a fresh, empty slot, breaking any alias.
    pub fn detach(&mut self) {
        self.slot = Arc::new(RwLock::new(None));
    }

    /// Whether both handles share one slot.
    pub fn aliases(&self, other: &SharedCell<T>) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }

    /// Number of handles currently sharing this slot.
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.slot)
    }
}

impl<T: Clone> SharedCell<T> {
    /// Copy of the current value, or `UnboundReference` if nothing was set.
    pub fn get(&self) -> Result<T> {
        self.read().clone().ok_or(StageGraphError::UnboundReference)
    }
}

impl<T> Clone for SharedCell<T> {
    /// Another handle to the same slot.
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> Default for SharedCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for SharedCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedCell")
            .field("value", &*self.read())
            .field("handles", &self.handle_count())
            .finish()
    }
}
