//! Dependency lists used to memoize effects

use std::any::Any;
use std::fmt;

/// A value that can take part in a dependency list
///
/// Implemented for every `PartialEq + Debug + 'static` type. Two entries are
/// equal only when they have the same concrete type and compare equal.
pub trait Dependency: Any + fmt::Debug {
    /// Compare against another dependency of any type
    fn dyn_eq(&self, other: &dyn Dependency) -> bool;

    /// Upcast for downcasting in `dyn_eq`
    fn as_any(&self) -> &dyn Any;
}

impl<T: PartialEq + fmt::Debug + 'static> Dependency for T {
    fn dyn_eq(&self, other: &dyn Dependency) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Ordered list of effect dependencies
///
/// Build with [`deps!`](crate::deps) or [`Deps::with`].
#[derive(Default)]
pub struct Deps {
    values: Vec<Box<dyn Dependency>>,
}

impl Deps {
    /// Create an empty list. An empty list memoizes forever once captured.
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Append a value (builder pattern)
    #[must_use]
    pub fn with<T: Dependency>(mut self, value: T) -> Self {
        self.push(value);
        self
    }

    /// Append a value
    pub fn push<T: Dependency>(&mut self, value: T) {
        self.values.push(Box::new(value));
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the list has no entries
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Same length and every entry equal, in order
    pub fn shallow_eq(&self, other: &Self) -> bool {
        self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(&other.values)
                .all(|(a, b)| a.as_ref().dyn_eq(b.as_ref()))
    }
}

impl fmt::Debug for Deps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.values.iter()).finish()
    }
}

/// Whether a capture with `next` may skip re-running the effect recorded
/// with `prev`. A missing list on either side never matches.
pub(crate) fn is_memoized(prev: Option<&Deps>, next: Option<&Deps>) -> bool {
    match (prev, next) {
        (Some(prev), Some(next)) => prev.shallow_eq(next),
        _ => false,
    }
}

/// Build a [`Deps`] list from a comma separated set of values
///
/// ```
/// use frame_scheduler::deps;
///
/// let deps = deps![1, "player", 2.5_f32];
/// assert_eq!(deps.len(), 3);
/// ```
#[macro_export]
macro_rules! deps {
    () => {
        $crate::effect::Deps::new()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::effect::Deps::new()$(.with($value))+
    };
}
