//! Effect setup and cleanup closures

use std::fmt;
use std::future::Future;

use crate::error::BoxError;
use crate::task::LocalFuture;

type SetupFn = Box<dyn FnOnce() -> LocalFuture<Result<Option<Cleanup>, BoxError>>>;
type CleanupFn = Box<dyn FnOnce() -> LocalFuture<Result<(), BoxError>>>;

/// Deferred setup captured by a system and run during the effect-apply pass
///
/// The setup may hand back a [`Cleanup`] that runs before the next setup in
/// the same slot, or when the context is reverted.
pub struct Effect {
    setup: SetupFn,
}

impl Effect {
    /// Setup with no cleanup
    pub fn new<F>(setup: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self::try_new(move || {
            setup();
            Ok(None)
        })
    }

    /// Setup returning a cleanup closure
    pub fn with_cleanup<F, C>(setup: F) -> Self
    where
        F: FnOnce() -> C + 'static,
        C: FnOnce() + 'static,
    {
        Self::try_new(move || Ok(Some(Cleanup::new(setup()))))
    }

    /// Fallible synchronous setup
    pub fn try_new<F>(setup: F) -> Self
    where
        F: FnOnce() -> Result<Option<Cleanup>, BoxError> + 'static,
    {
        Self {
            setup: Box::new(move || -> LocalFuture<Result<Option<Cleanup>, BoxError>> {
                Box::pin(std::future::ready(setup()))
            }),
        }
    }

    /// Asynchronous setup
    pub fn from_future<F, Fut>(setup: F) -> Self
    where
        F: FnOnce() -> Fut + 'static,
        Fut: Future<Output = Result<Option<Cleanup>, BoxError>> + 'static,
    {
        Self {
            setup: Box::new(move || -> LocalFuture<Result<Option<Cleanup>, BoxError>> {
                Box::pin(setup())
            }),
        }
    }

    pub(crate) fn run(self) -> LocalFuture<Result<Option<Cleanup>, BoxError>> {
        (self.setup)()
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Effect")
    }
}

/// Teardown for an applied effect
pub struct Cleanup {
    teardown: CleanupFn,
}

impl Cleanup {
    /// Infallible synchronous cleanup
    pub fn new<F>(teardown: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self::try_new(move || {
            teardown();
            Ok(())
        })
    }

    /// Fallible synchronous cleanup
    pub fn try_new<F>(teardown: F) -> Self
    where
        F: FnOnce() -> Result<(), BoxError> + 'static,
    {
        Self {
            teardown: Box::new(move || -> LocalFuture<Result<(), BoxError>> {
                Box::pin(std::future::ready(teardown()))
            }),
        }
    }

    /// Asynchronous cleanup
    pub fn from_future<F, Fut>(teardown: F) -> Self
    where
        F: FnOnce() -> Fut + 'static,
        Fut: Future<Output = Result<(), BoxError>> + 'static,
    {
        Self {
            teardown: Box::new(move || -> LocalFuture<Result<(), BoxError>> {
                Box::pin(teardown())
            }),
        }
    }

    pub(crate) fn run(self) -> LocalFuture<Result<(), BoxError>> {
        (self.teardown)()
    }
}

impl fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Cleanup")
    }
}
