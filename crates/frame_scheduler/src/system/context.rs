//! Hook surface handed to a running system

use super::manager::SystemRegistry;
use super::{SystemHandle, SystemId};
use crate::effect::{Deps, Effect};
use crate::error::SystemError;
use crate::provider::{Provider, Scope};
use crate::time::FrameDetail;
use crate::world::World;

/// Borrowed view of the world for the duration of one system call
///
/// Hooks that capture effects expect the system's effect context to be
/// open, which the scheduler guarantees during its update pass.
pub struct SystemContext<'w, S> {
    world: &'w mut World<S>,
    current: SystemId,
    registry: &'w SystemRegistry,
}

impl<'w, S: 'static> SystemContext<'w, S> {
    pub(crate) fn new(
        world: &'w mut World<S>,
        current: SystemId,
        registry: &'w SystemRegistry,
    ) -> Self {
        Self {
            world,
            current,
            registry,
        }
    }

    /// The system currently running
    pub fn current_system(&self) -> SystemId {
        self.current
    }

    /// Timing of the frame being updated
    pub fn frame(&self) -> &FrameDetail {
        &self.world.frame
    }

    /// Shared application state
    pub fn state(&self) -> &S {
        &self.world.state
    }

    /// Mutable shared application state
    pub fn state_mut(&mut self) -> &mut S {
        &mut self.world.state
    }

    /// The whole world
    pub fn world(&self) -> &World<S> {
        &*self.world
    }

    /// The whole world, mutably
    pub fn world_mut(&mut self) -> &mut World<S> {
        &mut *self.world
    }

    /// Declare an effect that re-runs every frame
    pub fn use_effect(&mut self, effect: Effect) -> Result<(), SystemError> {
        self.capture(effect, None)
    }

    /// Declare an effect that re-runs only when `deps` change
    ///
    /// An empty dependency list runs the effect once.
    pub fn use_effect_with(&mut self, deps: Deps, effect: Effect) -> Result<(), SystemError> {
        self.capture(effect, Some(deps))
    }

    fn capture(&mut self, effect: Effect, deps: Option<Deps>) -> Result<(), SystemError> {
        self.world
            .effects
            .get(self.current)
            .capture(effect, deps)?;
        Ok(())
    }

    /// Provider value of `T` for this system
    ///
    /// Builds and registers a global value through [`Provider::provide`] if
    /// none is visible yet, so a first use acts as lazy registration.
    pub fn use_provider<T: Provider<S>>(&mut self) -> Result<&mut T, SystemError> {
        let scope = Scope::System(self.current);
        let world = &mut *self.world;
        if !world.providers.has::<T>(&scope) {
            world.providers.provide_class::<S, T>(&world.state, Scope::Global);
        }
        Ok(world.providers.get_mut::<T>(&scope)?)
    }

    /// Provider value of `T` for this system, built by `factory` if missing
    pub fn use_provider_with<T, F>(&mut self, factory: F) -> Result<&mut T, SystemError>
    where
        T: 'static,
        F: FnOnce(&S) -> T,
    {
        let scope = Scope::System(self.current);
        let world = &mut *self.world;
        if !world.providers.has::<T>(&scope) {
            world
                .providers
                .provide_factory(&world.state, Scope::Global, factory);
        }
        Ok(world.providers.get_mut::<T>(&scope)?)
    }

    /// Store a global provider value
    pub fn provide<T: 'static>(&mut self, value: T) {
        self.world.providers.provide(value);
    }

    /// Store a provider value for `scope`
    ///
    /// Passing [`current_system`](Self::current_system) makes the value
    /// private to this system.
    pub fn provide_for<T: 'static>(&mut self, scope: Scope, value: T) {
        self.world.providers.provide_for(scope, value);
    }

    /// One-time result of another system
    ///
    /// The reference outlives this borrow of the context, so it can be held
    /// across later hook calls.
    pub fn use_context<R: 'static>(&self, handle: SystemHandle<R>) -> Result<&'w R, SystemError> {
        let registry: &'w SystemRegistry = self.registry;
        registry
            .result::<R>(handle.id())
            .ok_or_else(|| SystemError::MissingContext(registry.name(handle.id()).to_string()))
    }
}
