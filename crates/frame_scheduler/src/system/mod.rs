//! Systems: per-frame behaviour units
//!
//! A system is a closure stored in the [`SystemManager`] table under a
//! [`SystemId`]. Registered systems run once per frame in registration order
//! until they produce a result; after that the result is memoized and exposed
//! to other systems through [`SystemContext::use_context`].

mod context;
mod manager;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

pub use context::SystemContext;
pub use manager::{SystemManager, SystemState};

slotmap::new_key_type! {
    /// Opaque token naming one system in a [`SystemManager`]
    pub struct SystemId;
}

/// Typed system token
///
/// Carries the type of the system's one-time result so that reading it back
/// needs no annotations.
pub struct SystemHandle<R> {
    id: SystemId,
    _result: PhantomData<fn() -> R>,
}

impl<R> SystemHandle<R> {
    pub(crate) fn new(id: SystemId) -> Self {
        Self {
            id,
            _result: PhantomData,
        }
    }

    /// Untyped id
    pub fn id(&self) -> SystemId {
        self.id
    }
}

impl<R> Clone for SystemHandle<R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R> Copy for SystemHandle<R> {}

impl<R> PartialEq for SystemHandle<R> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<R> Eq for SystemHandle<R> {}

impl<R> Hash for SystemHandle<R> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<R> fmt::Debug for SystemHandle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SystemHandle").field(&self.id).finish()
    }
}

impl<R> From<SystemHandle<R>> for SystemId {
    fn from(handle: SystemHandle<R>) -> Self {
        handle.id
    }
}

/// Return value of a system body
///
/// `()` means the system has nothing to expose and runs again next frame.
/// `Some(value)` memoizes `value` as the system's one-time result.
pub trait SystemOutput {
    /// Type of the memoized result
    type Value: 'static;

    /// Convert into the memoized result, if any
    fn into_result(self) -> Option<Self::Value>;
}

impl SystemOutput for () {
    type Value = ();

    fn into_result(self) -> Option<()> {
        None
    }
}

impl<T: 'static> SystemOutput for Option<T> {
    type Value = T;

    fn into_result(self) -> Option<T> {
        self
    }
}

/// What a call to [`SystemManager::run`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// The system already had a result, its body was not invoked
    Skipped,
    /// The body ran and produced no result
    Ran,
    /// The body ran and produced its one-time result
    Resolved,
}
