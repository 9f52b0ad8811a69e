//! Per-system effect capture and application
//!
//! A context records the effects one system declares while it runs, addressed
//! by call order. Capture happens synchronously inside the system body;
//! application happens afterwards as a future that may still be in flight
//! when the next frame captures again. Each slot carries a generation that a
//! replacing capture bumps, so an apply resuming from an await can tell that
//! a fresher effect took over its slot.

use std::cell::RefCell;
use std::rc::Rc;

use log::{trace, warn};

use super::deps::{is_memoized, Deps};
use super::handler::{Cleanup, Effect};
use crate::error::EffectError;
use crate::task::LocalFuture;

struct EffectSlot {
    /// Set while waiting to be applied
    before: Option<Effect>,
    /// Set once applied, if the setup returned a cleanup
    after: Option<Cleanup>,
    /// Set if captured with a dependency list
    memo: Option<Deps>,
    generation: u64,
}

#[derive(Default)]
struct EffectState {
    slots: Vec<EffectSlot>,
    /// Next slot to capture into; `None` while closed
    cursor: Option<usize>,
}

/// Effect slots for a single system
///
/// Cloning yields another handle to the same slots. The context is not
/// `Send`: overlapping applies are only sound on one cooperative thread.
#[derive(Clone, Default)]
pub struct EffectContext {
    state: Rc<RefCell<EffectState>>,
}

impl EffectContext {
    /// Create a closed, empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a capture sequence at slot 0
    pub fn open(&self) -> Result<(), EffectError> {
        let mut state = self.state.borrow_mut();
        if state.cursor.is_some() {
            return Err(EffectError::AlreadyOpen);
        }
        state.cursor = Some(0);
        Ok(())
    }

    /// End the capture sequence
    pub fn close(&self) -> Result<(), EffectError> {
        let mut state = self.state.borrow_mut();
        if state.cursor.take().is_none() {
            return Err(EffectError::NotOpen);
        }
        Ok(())
    }

    /// Whether a capture sequence is in progress
    pub fn is_open(&self) -> bool {
        self.state.borrow().cursor.is_some()
    }

    /// Number of slots ever captured
    pub fn len(&self) -> usize {
        self.state.borrow().slots.len()
    }

    /// Whether nothing was ever captured
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether any slot holds a setup waiting to be applied
    pub fn has_pending(&self) -> bool {
        self.state.borrow().slots.iter().any(|slot| slot.before.is_some())
    }

    /// Record an effect at the next slot
    ///
    /// If the slot already exists and `deps` matches its recorded list, the
    /// slot is left untouched. `None` deps never match, so such effects run
    /// again on every apply.
    pub fn capture(&self, effect: Effect, deps: Option<Deps>) -> Result<(), EffectError> {
        let mut state = self.state.borrow_mut();
        let index = state.cursor.ok_or(EffectError::CaptureWhileClosed)?;

        if let Some(slot) = state.slots.get_mut(index) {
            if !is_memoized(slot.memo.as_ref(), deps.as_ref()) {
                trace!("Effect slot {} replaced (deps {:?})", index, deps);
                slot.before = Some(effect);
                slot.memo = deps;
                slot.generation += 1;
            }
        } else {
            trace!("Effect slot {} created", index);
            state.slots.push(EffectSlot {
                before: Some(effect),
                after: None,
                memo: deps,
                generation: 0,
            });
        }

        state.cursor = Some(index + 1);
        Ok(())
    }

    /// Apply every pending setup, cleaning up the previous one in its slot first
    ///
    /// Returns the apply future, or an error straight away if the context is
    /// still open. A slot whose generation changes while the future awaits a
    /// cleanup is skipped; one that changes while awaiting a setup has the
    /// fresh cleanup run immediately instead of stored.
    pub fn apply(&self) -> Result<LocalFuture<Result<(), EffectError>>, EffectError> {
        if self.is_open() {
            return Err(EffectError::ApplyWhileOpen);
        }

        let state = Rc::clone(&self.state);
        Ok(Box::pin(async move {
            let len = state.borrow().slots.len();
            for index in 0..len {
                let (before, after, generation) = {
                    let mut inner = state.borrow_mut();
                    let slot = &mut inner.slots[index];
                    let Some(before) = slot.before.take() else {
                        continue;
                    };
                    (before, slot.after.take(), slot.generation)
                };

                if let Some(after) = after {
                    after.run().await.map_err(EffectError::Cleanup)?;
                    if superseded(&state, index, generation) {
                        trace!("Effect slot {} superseded during cleanup", index);
                        continue;
                    }
                }

                let next = before.run().await.map_err(EffectError::Setup)?;
                if superseded(&state, index, generation) {
                    trace!("Effect slot {} superseded during setup", index);
                    if let Some(next) = next {
                        next.run().await.map_err(EffectError::Cleanup)?;
                    }
                    continue;
                }

                state.borrow_mut().slots[index].after = next;
            }
            Ok::<(), EffectError>(())
        }))
    }

    /// Run and clear every stored cleanup without starting any setup
    ///
    /// Every slot's generation is bumped and its pending setup dropped up
    /// front, so applies still in flight discard whatever they produce and
    /// start nothing new. All cleanups run even if one fails; the first
    /// failure is reported.
    pub fn revert(&self) -> Result<LocalFuture<Result<(), EffectError>>, EffectError> {
        if self.is_open() {
            return Err(EffectError::RevertWhileOpen);
        }

        for slot in &mut self.state.borrow_mut().slots {
            slot.generation += 1;
            slot.before = None;
        }

        let state = Rc::clone(&self.state);
        Ok(Box::pin(async move {
            let len = state.borrow().slots.len();
            let mut first_error = None;
            for index in 0..len {
                let after = state.borrow_mut().slots[index].after.take();
                if let Some(after) = after {
                    if let Err(error) = after.run().await {
                        warn!("Effect slot {} cleanup failed during revert: {}", index, error);
                        first_error.get_or_insert(EffectError::Cleanup(error));
                    }
                }
            }
            first_error.map_or(Ok(()), Err)
        }))
    }
}

fn superseded(state: &RefCell<EffectState>, index: usize, generation: u64) -> bool {
    state
        .borrow()
        .slots
        .get(index)
        .map_or(true, |slot| slot.generation != generation)
}

impl std::fmt::Debug for EffectContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("EffectContext")
            .field("slots", &state.slots.len())
            .field("cursor", &state.cursor)
            .finish()
    }
}
