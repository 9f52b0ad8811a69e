//! Per-frame driver
//!
//! Each frame runs two passes over the registered systems. The update pass
//! opens a system's effect context, runs the system and closes the context
//! again. The apply pass then spawns one apply future per system into a task
//! set that is polled cooperatively, so an effect that awaits keeps going in
//! the background while later frames capture new effects.

use std::future::Future;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::config::SchedulerConfig;
use crate::error::{EffectError, SystemError};
use crate::system::{
    RunStatus, SystemContext, SystemHandle, SystemId, SystemManager, SystemOutput,
};
use crate::task::TaskSet;
use crate::time::{FrameClock, FrameDetail};
use crate::world::World;

type EffectTask = (SystemId, Result<(), EffectError>);

/// Effect failure attributed to the system that captured the effect
#[derive(Debug)]
pub struct EffectFailure {
    /// The system whose effects failed
    pub system: SystemId,
    /// What went wrong
    pub error: EffectError,
}

/// Outcome of one update pass
#[derive(Debug, Default)]
pub struct UpdateSummary {
    /// Number of system bodies that were invoked
    pub ran: usize,
    /// Systems that produced their one-time result during this pass
    pub resolved: Vec<SystemId>,
}

/// Outcome of one full frame
#[derive(Debug)]
pub struct FrameReport {
    /// Frame number, starting at 1
    pub frame: u64,
    /// Number of system bodies that were invoked
    pub ran: usize,
    /// Systems that produced their one-time result this frame
    pub resolved: Vec<SystemId>,
    /// Effect failures that surfaced while this frame polled in-flight applies
    pub failures: Vec<EffectFailure>,
}

/// Drives registered systems frame by frame
pub struct Scheduler<S> {
    world: World<S>,
    systems: SystemManager<S>,
    pending: TaskSet<EffectTask>,
    clock: FrameClock,
    config: SchedulerConfig,
    frame_count: u64,
}

impl<S: 'static> Scheduler<S> {
    /// Create a scheduler with the default configuration
    pub fn new(state: S) -> Self {
        Self::with_config(state, SchedulerConfig::default())
    }

    /// Create a scheduler with an explicit configuration
    pub fn with_config(state: S, config: SchedulerConfig) -> Self {
        debug!("Creating scheduler with {:?}", config);
        Self {
            world: World::new(state),
            systems: SystemManager::new(),
            pending: TaskSet::new(),
            clock: FrameClock::new(),
            config,
            frame_count: 0,
        }
    }

    /// Store and register a system at the end of the run order
    pub fn add_system<O, F>(&mut self, system: F) -> Result<SystemHandle<O::Value>, SystemError>
    where
        O: SystemOutput,
        F: FnMut(&mut SystemContext<'_, S>) -> Result<O, SystemError> + 'static,
    {
        let handle = self.systems.add(system);
        self.systems.register(handle.id())?;
        Ok(handle)
    }

    /// Store and register a system under an explicit debug name
    pub fn add_named_system<O, F>(
        &mut self,
        name: impl Into<String>,
        system: F,
    ) -> Result<SystemHandle<O::Value>, SystemError>
    where
        O: SystemOutput,
        F: FnMut(&mut SystemContext<'_, S>) -> Result<O, SystemError> + 'static,
    {
        let handle = self.systems.add_named(name, system);
        self.systems.register(handle.id())?;
        Ok(handle)
    }

    /// Drop a system and revert its effects in the background
    ///
    /// Returns whether the system existed.
    pub fn remove_system(&mut self, id: SystemId) -> Result<bool, SystemError> {
        if let Some(effects) = self.world.effects.remove(&id) {
            let revert = effects.revert()?;
            self.pending.push(Box::pin(async move { (id, revert.await) }));
        }
        Ok(self.systems.remove(id))
    }

    /// Run every registered system once, in registration order
    ///
    /// The system's effect context is closed again even if its body fails;
    /// the first failure then ends the pass.
    pub fn update(&mut self) -> Result<UpdateSummary, SystemError> {
        let mut summary = UpdateSummary::default();
        let order = self.systems.values().to_vec();
        for id in order {
            let effects = self.world.effects.get(id);
            effects.open()?;
            let status = self.systems.run(&mut self.world, id);
            effects.close()?;

            match status? {
                RunStatus::Skipped => {}
                RunStatus::Ran => summary.ran += 1,
                RunStatus::Resolved => {
                    summary.ran += 1;
                    summary.resolved.push(id);
                }
            }
        }
        Ok(summary)
    }

    /// Spawn the apply future of every system with pending effects
    ///
    /// With `poll_on_apply` the new applies are polled once right away and
    /// any failures that already surfaced are returned.
    pub fn apply_effects(&mut self) -> Result<Vec<EffectFailure>, SystemError> {
        for &id in self.systems.values() {
            let effects = self.world.effects.get(id);
            if !effects.has_pending() {
                continue;
            }
            let apply = effects.apply()?;
            self.pending.push(Box::pin(async move { (id, apply.await) }));
        }

        if self.pending.len() > self.config.max_pending_applies {
            warn!(
                "{} effect applies in flight (limit {})",
                self.pending.len(),
                self.config.max_pending_applies
            );
        }

        if self.config.poll_on_apply {
            Ok(self.poll_effects())
        } else {
            Ok(Vec::new())
        }
    }

    /// Advance in-flight applies without blocking
    pub fn poll_effects(&mut self) -> Vec<EffectFailure> {
        let finished = self.pending.poll_ready();
        self.collect_failures(finished)
    }

    fn collect_failures(&self, finished: Vec<EffectTask>) -> Vec<EffectFailure> {
        finished
            .into_iter()
            .filter_map(|(system, result)| {
                let error = result.err()?;
                warn!("Effects of system '{}' failed: {}", self.systems.name(system), error);
                Some(EffectFailure { system, error })
            })
            .collect()
    }

    /// Run one frame with explicit timing
    pub fn frame(&mut self, detail: FrameDetail) -> Result<FrameReport, SystemError> {
        self.frame_count += 1;
        self.world.frame = detail;

        let mut failures = self.poll_effects();
        let UpdateSummary { ran, resolved } = self.update()?;
        failures.extend(self.apply_effects()?);

        Ok(FrameReport {
            frame: self.frame_count,
            ran,
            resolved,
            failures,
        })
    }

    /// Run one frame timed by the internal clock
    pub fn tick(&mut self) -> Result<FrameReport, SystemError> {
        let detail = self.clock.tick();
        self.frame(detail)
    }

    /// Resolves once every in-flight apply has finished
    pub fn settle(&mut self) -> impl Future<Output = Vec<EffectFailure>> + '_ {
        async move {
            let finished = self.pending.settle().await;
            self.collect_failures(finished)
        }
    }

    /// Settle in-flight applies, then revert every system's effects
    pub fn stop(&mut self) -> impl Future<Output = Result<Vec<EffectFailure>, EffectError>> + '_ {
        async move {
            info!("Stopping scheduler after {} frames", self.frame_count);
            let failures = self.settle().await;
            self.world.effects.clear().await?;
            Ok::<_, EffectError>(failures)
        }
    }

    /// [`stop`](Self::stop) on the current thread
    pub fn stop_blocking(&mut self) -> Result<Vec<EffectFailure>, EffectError> {
        pollster::block_on(self.stop())
    }

    /// Run frames until `keep_running` returns false, then stop
    ///
    /// Frames are paced to `target_fps`. A frame error returns early and
    /// leaves teardown to the caller.
    pub fn run<F>(&mut self, mut keep_running: F) -> Result<Vec<EffectFailure>, SystemError>
    where
        F: FnMut(&mut World<S>, &FrameReport) -> bool,
    {
        let frame_budget = (self.config.target_fps > 0)
            .then(|| Duration::from_secs_f64(1.0 / f64::from(self.config.target_fps)));
        info!(
            "Starting frame loop with {} systems at {} fps",
            self.systems.len(),
            self.config.target_fps
        );

        loop {
            let started = Instant::now();
            let report = self.tick()?;
            if !keep_running(&mut self.world, &report) {
                break;
            }
            let remaining =
                frame_budget.and_then(|budget| budget.checked_sub(started.elapsed()));
            if let Some(remaining) = remaining {
                thread::sleep(remaining);
            }
        }

        Ok(self.stop_blocking()?)
    }

    /// Shared world
    pub fn world(&self) -> &World<S> {
        &self.world
    }

    /// Shared world, mutably
    pub fn world_mut(&mut self) -> &mut World<S> {
        &mut self.world
    }

    /// System registry
    pub fn systems(&self) -> &SystemManager<S> {
        &self.systems
    }

    /// System registry, mutably
    pub fn systems_mut(&mut self) -> &mut SystemManager<S> {
        &mut self.systems
    }

    /// Typed one-time result of a system
    pub fn context<R: 'static>(&self, handle: SystemHandle<R>) -> Option<&R> {
        self.systems.context(handle)
    }

    /// Active configuration
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Frames run so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Number of applies and reverts still in flight
    pub fn pending_effects(&self) -> usize {
        self.pending.len()
    }
}
