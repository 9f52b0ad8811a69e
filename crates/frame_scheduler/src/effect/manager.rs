//! Directory of effect contexts keyed by system handle

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use log::{debug, warn};

use super::context::EffectContext;
use crate::error::EffectError;
use crate::system::SystemId;
use crate::task::{join_all, LocalFuture};

/// Owns one [`EffectContext`] per system handle
pub struct EffectManager<K = SystemId> {
    contexts: HashMap<K, EffectContext>,
}

impl<K> EffectManager<K>
where
    K: Hash + Eq + Debug,
{
    /// Create an empty manager
    pub fn new() -> Self {
        Self {
            contexts: HashMap::new(),
        }
    }

    /// Context for `handle`, created closed and empty on first access
    pub fn get(&mut self, handle: K) -> EffectContext {
        self.contexts
            .entry(handle)
            .or_insert_with_key(|handle| {
                debug!("Created effect context for {:?}", handle);
                EffectContext::new()
            })
            .clone()
    }

    /// Whether `handle` has a context, without creating one
    pub fn has(&self, handle: &K) -> bool {
        self.contexts.contains_key(handle)
    }

    /// Detach the context for `handle` without reverting it
    pub fn remove(&mut self, handle: &K) -> Option<EffectContext> {
        self.contexts.remove(handle)
    }

    /// Number of contexts
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    /// Whether there are no contexts
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Drop every context and revert them all concurrently
    ///
    /// The directory is emptied immediately; the returned future resolves
    /// once every snapshotted context has run its cleanups. A context that
    /// cannot be reverted (still open) is reported without stopping the rest.
    pub fn clear(&mut self) -> LocalFuture<Result<(), EffectError>> {
        let snapshot: Vec<(K, EffectContext)> = self.contexts.drain().collect();
        debug!("Clearing {} effect contexts", snapshot.len());

        let mut first_error = None;
        let mut reverts = Vec::with_capacity(snapshot.len());
        for (handle, context) in snapshot {
            match context.revert() {
                Ok(revert) => reverts.push(revert),
                Err(error) => {
                    warn!("Cannot revert effects of {:?}: {}", handle, error);
                    first_error.get_or_insert(error);
                }
            }
        }

        Box::pin(async move {
            for result in join_all(reverts).await {
                if let Err(error) = result {
                    first_error.get_or_insert(error);
                }
            }
            first_error.map_or(Ok(()), Err)
        })
    }
}

impl<K> Default for EffectManager<K>
where
    K: Hash + Eq + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::Effect;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_get_creates_closed_context_once() {
        let mut manager: EffectManager<&str> = EffectManager::new();
        assert!(!manager.has(&"a"));

        let context = manager.get("a");
        assert!(!context.is_open());
        assert!(manager.has(&"a"));

        context.open().unwrap();
        assert!(manager.get("a").is_open());
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_clear_reverts_applied_effects() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut manager: EffectManager<u32> = EffectManager::new();

        let context = manager.get(1);
        let effect = {
            let log = log.clone();
            Effect::with_cleanup(move || move || log.borrow_mut().push("cleanup"))
        };
        context.open().unwrap();
        context.capture(effect, None).unwrap();
        context.close().unwrap();
        pollster::block_on(context.apply().unwrap()).unwrap();
        manager.get(2);

        pollster::block_on(manager.clear()).unwrap();

        assert_eq!(*log.borrow(), vec!["cleanup"]);
        assert!(!manager.has(&1));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_clear_reports_open_context() {
        let mut manager: EffectManager<u32> = EffectManager::new();
        manager.get(1).open().unwrap();
        manager.get(2);

        let result = pollster::block_on(manager.clear());
        assert!(matches!(result, Err(EffectError::RevertWhileOpen)));
        assert!(manager.is_empty());
    }
}
