//! Error types shared by the scheduling core

use thiserror::Error;

use crate::system::SystemId;

/// Boxed error produced by user-authored effect setup or cleanup closures
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by effect contexts
///
/// The state variants are programmer errors surfaced synchronously by the
/// offending call. `Setup` and `Cleanup` come out of an apply or revert future.
#[derive(Error, Debug)]
pub enum EffectError {
    /// `open()` on a context that is already open
    #[error("Cannot open already opened effect context")]
    AlreadyOpen,

    /// `close()` on a context that is not open
    #[error("Cannot close already closed effect context")]
    NotOpen,

    /// `capture()` while the context is closed
    #[error("Cannot capture outside of closed effect context - must be opened first")]
    CaptureWhileClosed,

    /// `apply()` while the context is still open
    #[error("Cannot apply inside of opened effect context - must be closed first")]
    ApplyWhileOpen,

    /// `revert()` while the context is still open
    #[error("Cannot revert inside of opened effect context - must be closed first")]
    RevertWhileOpen,

    /// An effect setup closure failed
    #[error("Effect setup failed: {0}")]
    Setup(#[source] BoxError),

    /// An effect cleanup closure failed
    #[error("Effect cleanup failed: {0}")]
    Cleanup(#[source] BoxError),
}

impl EffectError {
    /// Whether this error is a misuse of the open/close protocol rather than
    /// a failure inside user code
    pub fn is_invalid_state(&self) -> bool {
        !matches!(self, Self::Setup(_) | Self::Cleanup(_))
    }
}

/// Errors raised by the provider registry
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The provider type was never provided in any scope
    #[error("Cannot get provider for unregistered handle '{0}'")]
    Unregistered(&'static str),

    /// The provider exists, but neither the requested scope nor the global
    /// scope holds a value any more
    #[error("Provider '{0}' has no value for this scope or the global scope")]
    MissingScope(&'static str),
}

/// Errors raised while registering or running systems
#[derive(Error, Debug)]
pub enum SystemError {
    /// The id does not name a system in the table
    #[error("Unknown system {0:?}")]
    UnknownSystem(SystemId),

    /// Another system's result was read before that system produced one
    #[error("Missing provider: system '{0}' has not produced a result yet")]
    MissingContext(String),

    /// Effect protocol error
    #[error(transparent)]
    Effect(#[from] EffectError),

    /// Provider lookup error
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Error reported by a system body
    #[error("System error: {0}")]
    Custom(String),
}
