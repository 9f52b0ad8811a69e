//! Shared context passed to every system

use crate::effect::EffectManager;
use crate::provider::{Provider, ProviderManager, Scope};
use crate::time::FrameDetail;

/// Host state plus the scheduling services systems reach through hooks
pub struct World<S> {
    /// Application state owned by the host
    pub state: S,
    /// Effect contexts, one per system
    pub effects: EffectManager,
    /// Scoped provider values
    pub providers: ProviderManager,
    /// Timing of the frame currently being updated
    pub frame: FrameDetail,
}

impl<S> World<S> {
    /// Wrap host state with empty effect and provider registries
    pub fn new(state: S) -> Self {
        Self {
            state,
            effects: EffectManager::new(),
            providers: ProviderManager::new(),
            frame: FrameDetail::default(),
        }
    }

    /// Store a global provider value
    pub fn provide<T: 'static>(&mut self, value: T) -> &mut Self {
        self.providers.provide(value);
        self
    }

    /// Build a global provider value from the host state
    pub fn provide_class<T: Provider<S>>(&mut self) -> &mut Self {
        self.providers.provide_class::<S, T>(&self.state, Scope::Global);
        self
    }
}
