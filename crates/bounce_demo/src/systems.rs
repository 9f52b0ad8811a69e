//! Demo systems: movement, edge bouncing and the bouncing box itself

use std::cell::Cell;
use std::rc::Rc;

use frame_scheduler::prelude::*;
use log::{debug, info};

use crate::arena::{Arena, Body, BodyId};

/// Milliseconds per frame at the reference rate velocities are expressed in
const REFERENCE_FRAME_MS: f64 = 1000.0 / 60.0;

/// Edges bodies bounce off
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenBounceConfig {
    /// Left edge
    pub min_x: f64,
    /// Top edge
    pub min_y: f64,
    /// Right edge
    pub max_x: f64,
    /// Bottom edge
    pub max_y: f64,
}

impl Provider<Arena> for ScreenBounceConfig {
    fn provide(arena: &Arena) -> Self {
        Self {
            min_x: 0.0,
            min_y: 0.0,
            max_x: arena.display.width,
            max_y: arena.display.height,
        }
    }
}

/// Where new boxes appear
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnPoint {
    /// Horizontal position
    pub x: f64,
    /// Vertical position
    pub y: f64,
}

/// Resolves once with the centre of the display
pub fn spawn_point(ctx: &mut SystemContext<'_, Arena>) -> Result<Option<SpawnPoint>, SystemError> {
    let display = ctx.state().display;
    Ok(Some(SpawnPoint {
        x: display.width / 2.0,
        y: display.height / 2.0,
    }))
}

/// Move every body by its velocity, scaled to the frame delta
pub fn velocity(ctx: &mut SystemContext<'_, Arena>) -> Result<(), SystemError> {
    let step = ctx.frame().delta_time / REFERENCE_FRAME_MS;
    let bodies = Rc::clone(&ctx.state().bodies);
    for (_, body) in bodies.borrow_mut().iter_mut() {
        body.x += body.dx * step;
        body.y += body.dy * step;
    }
    Ok(())
}

/// Clamp bodies to the bounce edges and reflect their velocity
pub fn screen_bounce(ctx: &mut SystemContext<'_, Arena>) -> Result<(), SystemError> {
    let edges = *ctx.use_provider::<ScreenBounceConfig>()?;
    let bodies = Rc::clone(&ctx.state().bodies);
    let mut bodies = bodies.borrow_mut();

    let mut bounced = Vec::new();
    for (id, body) in bodies.iter_mut() {
        let mut hit = false;
        if body.x < edges.min_x || body.x > edges.max_x {
            body.x = body.x.clamp(edges.min_x, edges.max_x);
            body.dx = -body.dx;
            hit = true;
        }
        if body.y < edges.min_y || body.y > edges.max_y {
            body.y = body.y.clamp(edges.min_y, edges.max_y);
            body.dy = -body.dy;
            hit = true;
        }
        if hit {
            bounced.push(id);
        }
    }

    for id in bounced {
        bodies.record_bounce(id);
    }
    Ok(())
}

/// The spinning box: spawned once, spun every frame, destroyed on teardown
pub struct BouncingBox {
    body: Rc<Cell<Option<BodyId>>>,
    angle: f64,
    spin: f64,
    speed: f64,
}

impl BouncingBox {
    /// Box moving diagonally at `speed`
    pub fn new(speed: f64) -> Self {
        Self {
            body: Rc::default(),
            angle: 0.0,
            spin: 1.0,
            speed,
        }
    }

    /// Turn the box into a system that spawns at `spawn`'s result
    pub fn into_system(
        mut self,
        spawn: SystemHandle<SpawnPoint>,
    ) -> impl FnMut(&mut SystemContext<'_, Arena>) -> Result<(), SystemError> {
        move |ctx: &mut SystemContext<'_, Arena>| {
            let origin = *ctx.use_context(spawn)?;
            ctx.use_effect_with(deps![], self.mount(ctx.state(), origin))?;
            self.update(ctx.state());

            let display = ctx.state().display;
            let edges = ctx.use_provider::<ScreenBounceConfig>()?;
            edges.max_x = display.width;
            edges.max_y = display.height;
            Ok(())
        }
    }

    fn mount(&self, arena: &Arena, origin: SpawnPoint) -> Effect {
        let bodies = Rc::clone(&arena.bodies);
        let slot = Rc::clone(&self.body);
        let body = Body {
            x: origin.x,
            y: origin.y,
            dx: self.speed,
            dy: self.speed,
        };
        Effect::with_cleanup(move || {
            let id = bodies.borrow_mut().spawn(body);
            slot.set(Some(id));
            info!("Box created as {:?}", id);
            move || {
                if let Some(id) = slot.take() {
                    bodies.borrow_mut().destroy(id);
                    info!("Box {:?} destroyed", id);
                }
            }
        })
    }

    fn update(&mut self, arena: &Arena) {
        self.angle = (self.angle + self.spin).rem_euclid(360.0);

        let bounces = arena.bodies.borrow_mut().take_bounces();
        if let Some(id) = self.body.get() {
            if bounces.contains(&id) {
                self.spin = if rand::random() { 1.0 } else { -1.0 };
                if let Some(body) = arena.bodies.borrow().get(id) {
                    debug!("Box bounced at ({:.1}, {:.1}), spin {}", body.x, body.y, self.spin);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Display;
    use approx::assert_relative_eq;

    fn scheduler() -> (Scheduler<Arena>, SystemHandle<SpawnPoint>) {
        let arena = Arena::new(Display {
            width: 100.0,
            height: 50.0,
        });
        let config = SchedulerConfig {
            target_fps: 0,
            ..SchedulerConfig::default()
        };
        let mut scheduler = Scheduler::with_config(arena, config);
        let spawn = scheduler.add_named_system("spawn_point", spawn_point).unwrap();
        scheduler.add_named_system("velocity", velocity).unwrap();
        scheduler
            .add_named_system("screen_bounce", screen_bounce)
            .unwrap();
        (scheduler, spawn)
    }

    fn frame_at(scheduler: &mut Scheduler<Arena>, now: f64) {
        let detail = scheduler.world().frame.next(now);
        let report = scheduler.frame(detail).unwrap();
        assert!(report.failures.is_empty());
    }

    #[test]
    fn test_box_lifecycle() {
        let (mut scheduler, spawn) = scheduler();
        let bouncing = BouncingBox::new(3.0);
        let body = Rc::clone(&bouncing.body);
        scheduler
            .add_named_system("box", bouncing.into_system(spawn))
            .unwrap();

        frame_at(&mut scheduler, 0.0);
        let id = body.get().unwrap();
        let bodies = Rc::clone(&scheduler.world().state.bodies);
        assert_eq!(bodies.borrow().len(), 1);

        frame_at(&mut scheduler, REFERENCE_FRAME_MS);
        let moved = *bodies.borrow().get(id).unwrap();
        assert_relative_eq!(moved.x, 53.0);
        assert_relative_eq!(moved.y, 28.0);

        scheduler.stop_blocking().unwrap();
        assert_eq!(bodies.borrow().len(), 0);
        assert!(body.get().is_none());
    }

    #[test]
    fn test_bodies_bounce_off_edges() {
        let (mut scheduler, _) = scheduler();
        let bodies = Rc::clone(&scheduler.world().state.bodies);
        let id = bodies.borrow_mut().spawn(Body {
            x: 98.0,
            y: 10.0,
            dx: 5.0,
            dy: -1.0,
        });

        frame_at(&mut scheduler, 0.0);
        frame_at(&mut scheduler, REFERENCE_FRAME_MS);

        let body = *bodies.borrow().get(id).unwrap();
        assert_relative_eq!(body.x, 100.0);
        assert_relative_eq!(body.dx, -5.0);
        assert_relative_eq!(body.y, 9.0);
        assert_eq!(bodies.borrow_mut().take_bounces(), vec![id]);
    }

    #[test]
    fn test_bounce_edges_default_to_display() {
        let (mut scheduler, _) = scheduler();
        frame_at(&mut scheduler, 0.0);

        let edges = scheduler
            .world()
            .providers
            .get::<ScreenBounceConfig>(&Scope::Global)
            .unwrap();
        assert_relative_eq!(edges.max_x, 100.0);
        assert_relative_eq!(edges.max_y, 50.0);
    }
}
