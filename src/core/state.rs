//! The `State` trait and the identity used to key states.
//!
//! A state is a unit of behavior with three lifecycle hooks. Every hook
//! receives a [`Flow`] handle, which is the state's only way to reach the
//! machine that owns it.

use crate::machine::Flow;
use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Stable identifier of a state variant.
///
/// Identity is derived from the concrete Rust type, so two `StateId`s are
/// equal exactly when they name the same type. The name is carried along
/// for logs and history and plays no part in equality.
///
/// # Example
///
/// ```rust
/// use flowstate::core::StateId;
///
/// #[derive(Default)]
/// struct Idle;
/// #[derive(Default)]
/// struct Chase;
///
/// assert_eq!(StateId::of::<Idle>(), StateId::of::<Idle>());
/// assert_ne!(StateId::of::<Idle>(), StateId::of::<Chase>());
/// assert_eq!(StateId::of::<Idle>().name(), "Idle");
/// ```
#[derive(Clone, Copy)]
pub struct StateId {
    type_id: TypeId,
    path: &'static str,
}

impl StateId {
    /// Identity of the type `T`.
    pub fn of<T: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            path: std::any::type_name::<T>(),
        }
    }

    /// Short type name, e.g. `EnemyIdle`.
    pub fn name(&self) -> &'static str {
        short_name(self.path)
    }

    /// Full type path, e.g. `my_game::ai::EnemyIdle`.
    pub fn path(&self) -> &'static str {
        self.path
    }
}

fn short_name(path: &'static str) -> &'static str {
    // Generic arguments may contain `::` too; only strip the leading module path.
    let head = path.split('<').next().unwrap_or(path);
    match head.rfind("::") {
        Some(idx) => &path[idx + 2..],
        None => path,
    }
}

impl PartialEq for StateId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for StateId {}

impl Hash for StateId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StateId({})", self.name())
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Downcasting support for boxed states.
///
/// Implemented for every `'static` type; states never implement it by hand.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A behavior that can be the machine's current state.
///
/// All hooks default to no-ops, so a state only overrides what it uses.
/// `Ctx` is the host data the machine owns on behalf of its entity.
///
/// Lifecycle of one instance:
///
/// 1. `on_enter` - the instance just became current
/// 2. `on_update` - once per tick while current
/// 3. `on_exit` - the machine is leaving this instance
///
/// Instances are cached, so the cycle repeats on the same value each time
/// the machine comes back to this state. Fields survive between visits;
/// reset them in `on_enter` if that is not wanted.
///
/// # Example
///
/// ```rust
/// use flowstate::core::State;
/// use flowstate::machine::Flow;
///
/// #[derive(Default)]
/// struct Patrol {
///     laps: u32,
/// }
///
/// #[derive(Default)]
/// struct Rest;
///
/// impl State<u32> for Rest {}
///
/// impl State<u32> for Patrol {
///     fn on_update(&mut self, flow: &mut Flow<'_, u32>) {
///         self.laps += 1;
///         *flow.context_mut() += 1;
///         if self.laps == 3 {
///             flow.transition_to::<Rest>();
///         }
///     }
/// }
/// ```
pub trait State<Ctx = ()>: AsAny {
    /// Called once each time this state becomes current.
    fn on_enter(&mut self, _flow: &mut Flow<'_, Ctx>) {}

    /// Called once per tick while this state is current.
    fn on_update(&mut self, _flow: &mut Flow<'_, Ctx>) {}

    /// Called once when the machine leaves this state.
    fn on_exit(&mut self, _flow: &mut Flow<'_, Ctx>) {}
}
