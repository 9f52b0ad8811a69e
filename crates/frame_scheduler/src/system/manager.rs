//! Ordered system registry with lazily derived per-system state

use std::any::{type_name, Any};

use log::debug;
use slotmap::{SecondaryMap, SlotMap};

use super::{RunStatus, SystemContext, SystemHandle, SystemId, SystemOutput};
use crate::error::SystemError;
use crate::world::World;

type BoxedSystem<S> =
    Box<dyn FnMut(&mut SystemContext<'_, S>) -> Result<Option<Box<dyn Any>>, SystemError>>;

/// Cached state of one registered system
///
/// Derived on the first run and kept for as long as the system stays
/// registered.
pub struct SystemState {
    current: SystemId,
    result: Option<Box<dyn Any>>,
}

impl SystemState {
    fn new(current: SystemId) -> Self {
        Self {
            current,
            result: None,
        }
    }

    /// The system this state belongs to
    pub fn current(&self) -> SystemId {
        self.current
    }

    /// Memoized one-time result, if produced
    pub fn result(&self) -> Option<&dyn Any> {
        self.result.as_deref()
    }
}

/// Read side of the manager, shared with running systems
#[derive(Default)]
pub(crate) struct SystemRegistry {
    names: SecondaryMap<SystemId, String>,
    order: Vec<SystemId>,
    /// Present while registered; `None` until the first run
    contexts: SecondaryMap<SystemId, Option<SystemState>>,
}

impl SystemRegistry {
    pub(crate) fn name(&self, id: SystemId) -> &str {
        self.names.get(id).map_or("<unknown>", String::as_str)
    }

    pub(crate) fn result_any(&self, id: SystemId) -> Option<&dyn Any> {
        self.contexts.get(id)?.as_ref()?.result()
    }

    pub(crate) fn result<R: 'static>(&self, id: SystemId) -> Option<&R> {
        self.result_any(id)?.downcast_ref::<R>()
    }
}

/// Table of system closures plus the ordered list of registered ones
pub struct SystemManager<S> {
    systems: SlotMap<SystemId, BoxedSystem<S>>,
    registry: SystemRegistry,
}

impl<S: 'static> SystemManager<S> {
    /// Create an empty manager
    pub fn new() -> Self {
        Self {
            systems: SlotMap::with_key(),
            registry: SystemRegistry::default(),
        }
    }

    /// Store a system closure without scheduling it
    ///
    /// The debug name is taken from the closure's type.
    pub fn add<O, F>(&mut self, system: F) -> SystemHandle<O::Value>
    where
        O: SystemOutput,
        F: FnMut(&mut SystemContext<'_, S>) -> Result<O, SystemError> + 'static,
    {
        self.add_named(type_name::<F>(), system)
    }

    /// Store a system closure under an explicit debug name
    pub fn add_named<O, F>(
        &mut self,
        name: impl Into<String>,
        mut system: F,
    ) -> SystemHandle<O::Value>
    where
        O: SystemOutput,
        F: FnMut(&mut SystemContext<'_, S>) -> Result<O, SystemError> + 'static,
    {
        let boxed: BoxedSystem<S> = Box::new(move |context: &mut SystemContext<'_, S>| {
            let output = system(context)?;
            Ok(output
                .into_result()
                .map(|value| Box::new(value) as Box<dyn Any>))
        });
        let id = self.systems.insert(boxed);
        let name = name.into();
        debug!("Added system '{}' as {:?}", name, id);
        self.registry.names.insert(id, name);
        SystemHandle::new(id)
    }

    /// Drop a system closure, unregistering it first. Returns whether it existed.
    pub fn remove(&mut self, id: SystemId) -> bool {
        self.unregister(id);
        self.registry.names.remove(id);
        self.systems.remove(id).is_some()
    }

    /// Append a stored system to the run order. No-op if already registered.
    pub fn register(&mut self, id: SystemId) -> Result<(), SystemError> {
        if !self.systems.contains_key(id) {
            return Err(SystemError::UnknownSystem(id));
        }
        if !self.has(id) {
            debug!("Registered system '{}'", self.registry.name(id));
            self.registry.order.push(id);
            self.registry.contexts.insert(id, None);
        }
        Ok(())
    }

    /// Remove a system and its state from the run order. No-op if absent.
    pub fn unregister(&mut self, id: SystemId) {
        if self.registry.contexts.remove(id).is_some() {
            debug!("Unregistered system '{}'", self.registry.name(id));
            self.registry.order.retain(|&registered| registered != id);
        }
    }

    /// Run a system once, registering it first if needed
    ///
    /// Skips the body entirely if the system already produced its result.
    pub fn run(&mut self, world: &mut World<S>, id: SystemId) -> Result<RunStatus, SystemError> {
        self.register(id)?;

        let registry = &mut self.registry;
        let state = registry
            .contexts
            .get_mut(id)
            .ok_or(SystemError::UnknownSystem(id))?;
        if state.is_none() {
            let name = registry.names.get(id).map_or("<unknown>", String::as_str);
            debug!("Derived context for system '{}'", name);
        }
        if state.get_or_insert_with(|| SystemState::new(id)).result.is_some() {
            return Ok(RunStatus::Skipped);
        }

        let system = self
            .systems
            .get_mut(id)
            .ok_or(SystemError::UnknownSystem(id))?;
        let output = {
            let mut context = SystemContext::new(world, id, &self.registry);
            system(&mut context)?
        };

        let resolved = output.is_some();
        if let Some(Some(state)) = self.registry.contexts.get_mut(id) {
            state.result = output;
        }

        if resolved {
            debug!("System '{}' resolved", self.registry.name(id));
            Ok(RunStatus::Resolved)
        } else {
            Ok(RunStatus::Ran)
        }
    }

    /// Forget a system's memoized result so its body runs again
    pub fn invalidate(&mut self, id: SystemId) {
        if let Some(Some(state)) = self.registry.contexts.get_mut(id) {
            state.result = None;
        }
    }

    /// Whether the system is registered
    pub fn has(&self, id: SystemId) -> bool {
        self.registry.contexts.contains_key(id)
    }

    /// Typed one-time result of a system, if it has produced one
    pub fn context<R: 'static>(&self, handle: SystemHandle<R>) -> Option<&R> {
        self.registry.result(handle.id())
    }

    /// Untyped one-time result of a system, if it has produced one
    pub fn context_any(&self, id: SystemId) -> Option<&dyn Any> {
        self.registry.result_any(id)
    }

    /// Cached state of a registered system, if it has run
    pub fn state(&self, id: SystemId) -> Option<&SystemState> {
        self.registry.contexts.get(id)?.as_ref()
    }

    /// Registered systems in run order
    pub fn values(&self) -> &[SystemId] {
        &self.registry.order
    }

    /// Debug name of a stored system
    pub fn name(&self, id: SystemId) -> &str {
        self.registry.name(id)
    }

    /// Number of registered systems
    pub fn len(&self) -> usize {
        self.registry.order.len()
    }

    /// Whether no system is registered
    pub fn is_empty(&self) -> bool {
        self.registry.order.is_empty()
    }
}

impl<S: 'static> Default for SystemManager<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn world() -> World<()> {
        World::new(())
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut systems = SystemManager::new();
        let handle = systems.add(|_: &mut SystemContext<'_, ()>| Ok(()));

        systems.register(handle.id()).unwrap();
        systems.register(handle.id()).unwrap();

        assert_eq!(systems.values(), &[handle.id()]);
        assert!(systems.has(handle.id()));
    }

    #[test]
    fn test_unregister_removes_state() {
        let mut systems = SystemManager::new();
        let handle = systems.add(|_: &mut SystemContext<'_, ()>| Ok(Some(1)));
        let mut world = world();

        systems.run(&mut world, handle.id()).unwrap();
        assert_eq!(systems.context(handle), Some(&1));

        systems.unregister(handle.id());
        systems.unregister(handle.id());
        assert!(!systems.has(handle.id()));
        assert!(systems.context(handle).is_none());
        assert!(systems.is_empty());
    }

    #[test]
    fn test_run_auto_registers() {
        let mut systems = SystemManager::new();
        let handle = systems.add(|_: &mut SystemContext<'_, ()>| Ok(()));
        assert!(!systems.has(handle.id()));

        let status = systems.run(&mut world(), handle.id()).unwrap();
        assert_eq!(status, RunStatus::Ran);
        assert!(systems.has(handle.id()));
        assert_eq!(systems.state(handle.id()).unwrap().current(), handle.id());
    }

    #[test]
    fn test_resolved_system_runs_once() {
        let calls = Rc::new(Cell::new(0));
        let mut systems = SystemManager::new();
        let handle = {
            let calls = calls.clone();
            systems.add(move |_: &mut SystemContext<'_, ()>| {
                calls.set(calls.get() + 1);
                Ok(Some("ready"))
            })
        };
        let mut world = world();

        assert_eq!(systems.run(&mut world, handle.id()).unwrap(), RunStatus::Resolved);
        assert_eq!(systems.run(&mut world, handle.id()).unwrap(), RunStatus::Skipped);
        assert_eq!(calls.get(), 1);
        assert_eq!(systems.context(handle), Some(&"ready"));
    }

    #[test]
    fn test_invalidate_reruns_body() {
        let calls = Rc::new(Cell::new(0));
        let mut systems = SystemManager::new();
        let handle = {
            let calls = calls.clone();
            systems.add(move |_: &mut SystemContext<'_, ()>| {
                calls.set(calls.get() + 1);
                Ok(Some(calls.get()))
            })
        };
        let mut world = world();

        systems.run(&mut world, handle.id()).unwrap();
        systems.invalidate(handle.id());
        systems.run(&mut world, handle.id()).unwrap();

        assert_eq!(calls.get(), 2);
        assert_eq!(systems.context(handle), Some(&2));
    }

    #[test]
    fn test_unknown_system_fails() {
        let mut systems: SystemManager<()> = SystemManager::new();
        let handle = systems.add(|_: &mut SystemContext<'_, ()>| Ok(()));
        assert!(systems.remove(handle.id()));
        assert!(!systems.remove(handle.id()));

        let result = systems.run(&mut world(), handle.id());
        assert!(matches!(result, Err(SystemError::UnknownSystem(_))));
    }

    #[test]
    fn test_failing_body_keeps_result_empty() {
        let mut systems = SystemManager::new();
        let handle = systems.add_named("broken", |_: &mut SystemContext<'_, ()>| {
            Err::<Option<u8>, _>(SystemError::Custom("nope".to_string()))
        });

        assert!(systems.run(&mut world(), handle.id()).is_err());
        assert!(systems.context(handle).is_none());
        assert_eq!(systems.name(handle.id()), "broken");
    }
}
