//! # Frame Scheduler
//!
//! Per-frame system scheduling with hook-style effects and scoped providers.
//!
//! ## Features
//!
//! - **Systems**: closures run once per frame in registration order until they
//!   produce a one-time result, which other systems can then read
//! - **Effects**: setups declared during a frame and applied afterwards, with
//!   dependency memoization and cleanups
//! - **Providers**: shared values keyed by type, optionally scoped per system
//! - **Cooperative apply**: asynchronous effects keep running in the
//!   background across frames without threads
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use frame_scheduler::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut scheduler = Scheduler::new(0_u32);
//!     scheduler.add_system(|ctx: &mut SystemContext<'_, u32>| {
//!         *ctx.state_mut() += 1;
//!         ctx.use_effect_with(deps![], Effect::with_cleanup(|| {
//!             log::info!("mounted");
//!             || log::info!("unmounted")
//!         }))?;
//!         Ok(())
//!     })?;
//!
//!     scheduler.run(|world, _| world.state < 10)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc
)]

pub mod config;
pub mod effect;
pub mod error;
pub mod logging;
pub mod provider;
pub mod scheduler;
pub mod system;
pub mod task;
pub mod time;
pub mod world;

#[cfg(test)]
mod tests;

pub use error::{BoxError, EffectError, ProviderError, SystemError};
pub use scheduler::{EffectFailure, FrameReport, Scheduler, UpdateSummary};
pub use world::World;

/// Common imports for scheduler users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, SchedulerConfig},
        deps,
        effect::{Cleanup, Deps, Effect, EffectContext, EffectManager},
        error::{BoxError, EffectError, ProviderError, SystemError},
        provider::{Provider, ProviderManager, Scope},
        scheduler::{EffectFailure, FrameReport, Scheduler},
        system::{RunStatus, SystemContext, SystemHandle, SystemId, SystemManager},
        time::{FrameClock, FrameDetail},
        world::World,
    };
}
