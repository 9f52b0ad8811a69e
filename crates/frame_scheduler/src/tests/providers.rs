//! Providers and cross-system results shared through the scheduler

use crate::config::SchedulerConfig;
use crate::error::{ProviderError, SystemError};
use crate::provider::{Provider, Scope};
use crate::scheduler::Scheduler;
use crate::system::SystemContext;
use crate::time::FrameDetail;

struct Stage {
    width: f64,
    height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Bounds {
    width: f64,
    height: f64,
}

impl Provider<Stage> for Bounds {
    fn provide(stage: &Stage) -> Self {
        Self {
            width: stage.width,
            height: stage.height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Speed(f64);

fn scheduler() -> Scheduler<Stage> {
    Scheduler::with_config(
        Stage {
            width: 600.0,
            height: 400.0,
        },
        SchedulerConfig {
            target_fps: 0,
            ..SchedulerConfig::default()
        },
    )
}

#[test]
fn test_first_use_registers_global_provider() {
    let mut scheduler = scheduler();
    let reader = scheduler
        .add_system(|ctx: &mut SystemContext<'_, Stage>| Ok(Some(*ctx.use_provider::<Bounds>()?)))
        .unwrap();

    scheduler.tick().unwrap();

    let expected = Bounds {
        width: 600.0,
        height: 400.0,
    };
    assert_eq!(scheduler.context(reader), Some(&expected));
    assert_eq!(
        scheduler.world().providers.get::<Bounds>(&Scope::Named("hud")).unwrap(),
        &expected
    );
}

#[test]
fn test_scoped_copy_is_private() {
    let mut scheduler = scheduler();
    scheduler.world_mut().provide(Speed(1.0));
    let fast = scheduler
        .add_system(|ctx: &mut SystemContext<'_, Stage>| {
            let own = Scope::from(ctx.current_system());
            ctx.provide_for(own, Speed(5.0));
            Ok(Some(*ctx.use_provider_with(|_: &Stage| Speed(0.0))?))
        })
        .unwrap();
    let normal = scheduler
        .add_system(|ctx: &mut SystemContext<'_, Stage>| {
            Ok(Some(*ctx.use_provider_with(|_: &Stage| Speed(0.0))?))
        })
        .unwrap();

    scheduler.tick().unwrap();

    assert_eq!(scheduler.context(fast), Some(&Speed(5.0)));
    assert_eq!(scheduler.context(normal), Some(&Speed(1.0)));
}

#[test]
fn test_results_flow_in_registration_order() {
    let mut scheduler = scheduler();
    let bounds = scheduler
        .add_named_system("bounds", |ctx: &mut SystemContext<'_, Stage>| {
            Ok(Some(Bounds::provide(ctx.state())))
        })
        .unwrap();
    let area = scheduler
        .add_named_system("area", move |ctx: &mut SystemContext<'_, Stage>| {
            let bounds = ctx.use_context(bounds)?;
            ctx.state_mut().width += 1.0;
            Ok(Some(bounds.width * bounds.height))
        })
        .unwrap();

    let report = scheduler.frame(FrameDetail::default().next(0.0)).unwrap();

    assert_eq!(report.resolved, vec![bounds.id(), area.id()]);
    assert_eq!(scheduler.context(area), Some(&240_000.0));
    assert!((scheduler.world().state.width - 601.0).abs() < f64::EPSILON);
}

#[test]
fn test_reading_unresolved_result_fails() {
    let mut scheduler = scheduler();
    let late = scheduler.systems_mut().add_named("late", |_: &mut SystemContext<'_, Stage>| {
        Ok(Some(1_u8))
    });
    scheduler
        .add_named_system("eager", move |ctx: &mut SystemContext<'_, Stage>| {
            ctx.use_context(late)?;
            Ok(())
        })
        .unwrap();
    scheduler.systems_mut().register(late.id()).unwrap();

    let error = scheduler.tick().unwrap_err();
    assert_eq!(
        error.to_string(),
        "Missing provider: system 'late' has not produced a result yet"
    );
}

#[test]
fn test_unknown_provider_error_propagates() {
    let mut scheduler = scheduler();
    scheduler
        .add_system(|ctx: &mut SystemContext<'_, Stage>| {
            ctx.world().providers.get::<Speed>(&Scope::Global)?;
            Ok(())
        })
        .unwrap();

    let error = scheduler.tick().unwrap_err();
    assert!(matches!(
        error,
        SystemError::Provider(ProviderError::Unregistered(_))
    ));
}
