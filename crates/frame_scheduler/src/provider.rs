//! Scoped provider registry
//!
//! A provider is a shared value identified by its type. Each provider can
//! hold one value per [`Scope`]; lookups for a scope without its own value
//! fall back to the global one.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;

use log::debug;

use crate::error::ProviderError;
use crate::system::SystemId;

/// Partition key for provider values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Default scope every lookup falls back to
    #[default]
    Global,
    /// Private to one system
    System(SystemId),
    /// Arbitrary named partition
    Named(&'static str),
}

impl From<SystemId> for Scope {
    fn from(id: SystemId) -> Self {
        Self::System(id)
    }
}

/// A provider value that can build itself from the shared context
///
/// This is the constructor-style entry point; closures go through
/// [`ProviderManager::provide_factory`] instead.
pub trait Provider<S>: Sized + 'static {
    /// Build the initial value
    fn provide(context: &S) -> Self;
}

struct ProviderEntry {
    type_name: &'static str,
    scoped: HashMap<Scope, Box<dyn Any>>,
}

/// Two-level map of provider type to scope to value
#[derive(Default)]
pub struct ProviderManager {
    values: HashMap<TypeId, ProviderEntry>,
}

impl ProviderManager {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` in the global scope
    pub fn provide<T: 'static>(&mut self, value: T) -> &mut Self {
        self.provide_for(Scope::Global, value)
    }

    /// Store `value` for `scope`, replacing any previous value there
    pub fn provide_for<T: 'static>(&mut self, scope: Scope, value: T) -> &mut Self {
        debug!("Providing '{}' for {:?}", type_name::<T>(), scope);
        self.values
            .entry(TypeId::of::<T>())
            .or_insert_with(|| ProviderEntry {
                type_name: type_name::<T>(),
                scoped: HashMap::new(),
            })
            .scoped
            .insert(scope, Box::new(value));
        self
    }

    /// Build the value with `factory` and store it for `scope`
    pub fn provide_factory<S, T, F>(&mut self, context: &S, scope: Scope, factory: F) -> &mut Self
    where
        T: 'static,
        F: FnOnce(&S) -> T,
    {
        let value = factory(context);
        self.provide_for(scope, value)
    }

    /// Build the value through its [`Provider`] impl and store it for `scope`
    pub fn provide_class<S, T>(&mut self, context: &S, scope: Scope) -> &mut Self
    where
        T: Provider<S>,
    {
        self.provide_for(scope, T::provide(context))
    }

    /// Remove the global value of `T`. No-op if absent.
    pub fn unregister<T: 'static>(&mut self) -> &mut Self {
        self.unregister_for_scope::<T>(&Scope::Global)
    }

    /// Remove the value of `T` for `scope`. No-op if absent.
    pub fn unregister_for_scope<T: 'static>(&mut self, scope: &Scope) -> &mut Self {
        if let Some(entry) = self.values.get_mut(&TypeId::of::<T>()) {
            entry.scoped.remove(scope);
        }
        self
    }

    /// Value of `T` for `scope`, falling back to the global value
    pub fn get<T: 'static>(&self, scope: &Scope) -> Result<&T, ProviderError> {
        let entry = self
            .values
            .get(&TypeId::of::<T>())
            .ok_or(ProviderError::Unregistered(type_name::<T>()))?;
        entry
            .scoped
            .get(scope)
            .or_else(|| entry.scoped.get(&Scope::Global))
            .and_then(|value| value.downcast_ref::<T>())
            .ok_or(ProviderError::MissingScope(entry.type_name))
    }

    /// Mutable value of `T` for `scope`, falling back to the global value
    pub fn get_mut<T: 'static>(&mut self, scope: &Scope) -> Result<&mut T, ProviderError> {
        let entry = self
            .values
            .get_mut(&TypeId::of::<T>())
            .ok_or(ProviderError::Unregistered(type_name::<T>()))?;
        let key = if entry.scoped.contains_key(scope) {
            scope
        } else {
            &Scope::Global
        };
        let type_name = entry.type_name;
        entry
            .scoped
            .get_mut(key)
            .and_then(|value| value.downcast_mut::<T>())
            .ok_or(ProviderError::MissingScope(type_name))
    }

    /// Whether `T` has a value for `scope` or globally
    pub fn has<T: 'static>(&self, scope: &Scope) -> bool {
        self.values.get(&TypeId::of::<T>()).is_some_and(|entry| {
            entry.scoped.contains_key(scope) || entry.scoped.contains_key(&Scope::Global)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[derive(Debug, PartialEq)]
    struct Bounds {
        width: f32,
        height: f32,
    }

    struct Display {
        width: f32,
        height: f32,
    }

    impl Provider<Display> for Bounds {
        fn provide(display: &Display) -> Self {
            Self {
                width: display.width,
                height: display.height,
            }
        }
    }

    fn system_ids(count: usize) -> Vec<SystemId> {
        let mut ids: SlotMap<SystemId, ()> = SlotMap::with_key();
        (0..count).map(|_| ids.insert(())).collect()
    }

    #[test]
    fn test_global_value_is_visible_from_every_scope() {
        let ids = system_ids(1);
        let mut providers = ProviderManager::new();
        providers.provide(7_u32);

        assert_eq!(*providers.get::<u32>(&Scope::Global).unwrap(), 7);
        assert_eq!(*providers.get::<u32>(&Scope::System(ids[0])).unwrap(), 7);
        assert_eq!(*providers.get::<u32>(&Scope::Named("unused")).unwrap(), 7);
        assert!(providers.has::<u32>(&Scope::Named("unused")));
    }

    #[test]
    fn test_scoped_value_shadows_global() {
        let ids = system_ids(2);
        let mut providers = ProviderManager::new();
        providers
            .provide_for(Scope::System(ids[0]), "scoped")
            .provide("global");

        assert_eq!(*providers.get::<&str>(&ids[0].into()).unwrap(), "scoped");
        assert_eq!(*providers.get::<&str>(&ids[1].into()).unwrap(), "global");
        assert_eq!(*providers.get::<&str>(&Scope::Global).unwrap(), "global");
    }

    #[test]
    fn test_unregistered_type_fails() {
        let providers = ProviderManager::new();
        assert!(matches!(
            providers.get::<u32>(&Scope::Global),
            Err(ProviderError::Unregistered(_))
        ));
        assert!(!providers.has::<u32>(&Scope::Global));
    }

    #[test]
    fn test_unregister_is_scoped_and_idempotent() {
        let mut providers = ProviderManager::new();
        providers.provide_for(Scope::Named("a"), 1_u8).provide(2_u8);

        providers.unregister::<u8>().unregister::<u8>();
        assert_eq!(*providers.get::<u8>(&Scope::Named("a")).unwrap(), 1);
        assert!(matches!(
            providers.get::<u8>(&Scope::Named("b")),
            Err(ProviderError::MissingScope(_))
        ));
        assert!(!providers.has::<u8>(&Scope::Named("b")));

        providers.unregister_for_scope::<u8>(&Scope::Named("a"));
        assert!(!providers.has::<u8>(&Scope::Named("a")));
        providers.unregister_for_scope::<u16>(&Scope::Global);
    }

    #[test]
    fn test_factory_and_class_construction() {
        let display = Display {
            width: 600.0,
            height: 400.0,
        };
        let mut providers = ProviderManager::new();
        providers.provide_class::<_, Bounds>(&display, Scope::Global);
        providers.provide_factory(&display, Scope::Named("half"), |d: &Display| Bounds {
            width: d.width / 2.0,
            height: d.height / 2.0,
        });

        assert_eq!(
            providers.get::<Bounds>(&Scope::Global).unwrap(),
            &Bounds { width: 600.0, height: 400.0 }
        );
        assert_eq!(
            providers.get::<Bounds>(&Scope::Named("half")).unwrap(),
            &Bounds { width: 300.0, height: 200.0 }
        );
    }

    #[test]
    fn test_get_mut_writes_through_fallback() {
        let mut providers = ProviderManager::new();
        providers.provide(vec![1, 2]);

        providers
            .get_mut::<Vec<i32>>(&Scope::Named("reader"))
            .unwrap()
            .push(3);

        assert_eq!(providers.get::<Vec<i32>>(&Scope::Global).unwrap(), &vec![1, 2, 3]);
    }
}
