//! Headless play field shared by the demo systems

use std::cell::RefCell;
use std::rc::Rc;

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Handle to a body in the arena
    pub struct BodyId;
}

/// Moving point with a velocity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    /// Horizontal position
    pub x: f64,
    /// Vertical position
    pub y: f64,
    /// Horizontal velocity
    pub dx: f64,
    /// Vertical velocity
    pub dy: f64,
}

/// Every live body plus the bounces recorded this frame
#[derive(Default)]
pub struct Bodies {
    bodies: SlotMap<BodyId, Body>,
    bounced: Vec<BodyId>,
}

impl Bodies {
    /// Add a body
    pub fn spawn(&mut self, body: Body) -> BodyId {
        self.bodies.insert(body)
    }

    /// Remove a body
    pub fn destroy(&mut self, id: BodyId) -> Option<Body> {
        self.bodies.remove(id)
    }

    /// Look up a body
    pub fn get(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id)
    }

    /// Iterate bodies
    pub fn iter(&self) -> impl Iterator<Item = (BodyId, &Body)> {
        self.bodies.iter()
    }

    /// Iterate bodies mutably
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (BodyId, &mut Body)> {
        self.bodies.iter_mut()
    }

    /// Number of live bodies
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Note that `id` bounced off an edge
    pub fn record_bounce(&mut self, id: BodyId) {
        self.bounced.push(id);
    }

    /// Drain the bounces recorded so far
    pub fn take_bounces(&mut self) -> Vec<BodyId> {
        std::mem::take(&mut self.bounced)
    }
}

/// Play field size
#[derive(Debug, Clone, Copy)]
pub struct Display {
    /// Width in pixels
    pub width: f64,
    /// Height in pixels
    pub height: f64,
}

/// Host state of the demo
///
/// Bodies sit behind a shared cell so that effect setups, which run after
/// the system that declared them, can still spawn and destroy them.
pub struct Arena {
    /// Play field size
    pub display: Display,
    /// Live bodies
    pub bodies: Rc<RefCell<Bodies>>,
}

impl Arena {
    /// Empty arena of the given size
    pub fn new(display: Display) -> Self {
        Self {
            display,
            bodies: Rc::default(),
        }
    }
}
