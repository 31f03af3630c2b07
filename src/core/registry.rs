//! Static mapping from state identity to factory, and from name to identity.

use super::state::{State, StateId};
use crate::machine::FlowError;
use std::collections::HashMap;
use std::fmt;

/// Constructor for a boxed state instance.
pub type StateFactory<Ctx> = Box<dyn Fn() -> Box<dyn State<Ctx>>>;

/// Registry of the state variants a machine can construct.
///
/// Every registration is reachable by its [`StateId`] and by name. Names are
/// the short type name (`EnemyIdle`) and the full type path
/// (`game::ai::EnemyIdle`), so a start state can come from a config file.
///
/// # Example
///
/// ```rust
/// use flowstate::core::{State, StateId, StateRegistry};
///
/// #[derive(Default)]
/// struct Idle;
/// impl State for Idle {}
///
/// let mut registry: StateRegistry = StateRegistry::new();
/// registry.register::<Idle>();
///
/// assert_eq!(registry.resolve("Idle").unwrap(), StateId::of::<Idle>());
/// assert!(registry.resolve_or_warn("Missing").is_none());
/// ```
pub struct StateRegistry<Ctx = ()> {
    factories: HashMap<StateId, StateFactory<Ctx>>,
    names: HashMap<&'static str, StateId>,
}

impl<Ctx: 'static> StateRegistry<Ctx> {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            names: HashMap::new(),
        }
    }

    /// Register `T`, built with `T::default()` on first visit.
    ///
    /// Registering the same type again is a no-op.
    pub fn register<T>(&mut self) -> StateId
    where
        T: State<Ctx> + Default,
    {
        let id = StateId::of::<T>();
        if !self.factories.contains_key(&id) {
            self.insert(id, Box::new(|| Box::new(T::default()) as Box<dyn State<Ctx>>));
        }
        id
    }

    /// Register `T` with a custom constructor, replacing any previous one.
    pub fn register_with<T, F>(&mut self, factory: F) -> StateId
    where
        T: State<Ctx>,
        F: Fn() -> T + 'static,
    {
        let id = StateId::of::<T>();
        self.insert(
            id,
            Box::new(move || Box::new(factory()) as Box<dyn State<Ctx>>),
        );
        id
    }

    fn insert(&mut self, id: StateId, factory: StateFactory<Ctx>) {
        for name in [id.name(), id.path()] {
            if let Some(existing) = self.names.insert(name, id) {
                if existing != id {
                    tracing::warn!(%name, previous = existing.path(), now = id.path(),
                        "state name registered twice, keeping the latest");
                }
            }
        }
        self.factories.insert(id, factory);
    }

    pub fn contains(&self, id: StateId) -> bool {
        self.factories.contains_key(&id)
    }

    /// Build a fresh instance of `id`, or `None` if it was never registered.
    pub fn create(&self, id: StateId) -> Option<Box<dyn State<Ctx>>> {
        self.factories.get(&id).map(|factory| factory())
    }

    /// Look a state up by short name or full type path.
    pub fn resolve(&self, name: &str) -> Result<StateId, FlowError> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| FlowError::UnknownState {
                name: name.to_string(),
            })
    }

    /// Like [`resolve`](Self::resolve), but logs a warning and returns `None`
    /// for unknown names.
    pub fn resolve_or_warn(&self, name: &str) -> Option<StateId> {
        match self.resolve(name) {
            Ok(id) => Some(id),
            Err(err) => {
                tracing::warn!(%name, "{err}");
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Registered identities, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = StateId> + '_ {
        self.factories.keys().copied()
    }
}

impl<Ctx: 'static> Default for StateRegistry<Ctx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Ctx> fmt::Debug for StateRegistry<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.factories.keys().map(|id| id.name()))
            .finish()
    }
}
