//! Effect hooks
//!
//! Systems declare side effects while they run; the scheduler applies them
//! after the update pass and cleans them up when their dependencies change
//! or the scene is torn down.

mod context;
mod deps;
mod handler;
mod manager;

pub use context::EffectContext;
pub use deps::{Dependency, Deps};
pub use handler::{Cleanup, Effect};
pub use manager::EffectManager;
