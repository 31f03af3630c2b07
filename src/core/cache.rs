//! Lazily created state instances, one per identity.

use super::registry::StateRegistry;
use super::state::{State, StateId};
use crate::machine::FlowError;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;

/// Instances a machine has visited, keyed by identity.
///
/// The first request for an identity builds the instance through the
/// registry; every later request hands back that same instance. Entries
/// are never evicted, so a state picks up where it left off when the
/// machine returns to it.
pub struct StateCache<Ctx = ()> {
    states: HashMap<StateId, Box<dyn State<Ctx>>>,
}

impl<Ctx: 'static> StateCache<Ctx> {
    pub fn new() -> Self {
        Self {
            states: HashMap::new(),
        }
    }

    /// Get the cached instance for `id`, creating it on first request.
    ///
    /// Fails with [`FlowError::UnresolvableIdentity`] if `id` is neither
    /// cached nor registered.
    pub fn get_or_create(
        &mut self,
        id: StateId,
        registry: &StateRegistry<Ctx>,
    ) -> Result<&mut (dyn State<Ctx> + 'static), FlowError> {
        let state = match self.states.entry(id) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let created = registry
                    .create(id)
                    .ok_or(FlowError::UnresolvableIdentity { state: id.name() })?;
                tracing::debug!(state = %id, "created state instance");
                entry.insert(created)
            }
        };
        Ok(&mut **state)
    }

    pub fn get(&self, id: StateId) -> Option<&dyn State<Ctx>> {
        self.states.get(&id).map(|state| &**state)
    }

    pub fn get_mut(&mut self, id: StateId) -> Option<&mut (dyn State<Ctx> + 'static)> {
        self.states.get_mut(&id).map(|state| &mut **state)
    }

    /// Cached instance of `T`, if the machine has visited it.
    pub fn get_as<T: State<Ctx>>(&self) -> Option<&T> {
        self.get(StateId::of::<T>())
            .and_then(|state| state.as_any().downcast_ref::<T>())
    }

    pub fn get_as_mut<T: State<Ctx>>(&mut self) -> Option<&mut T> {
        self.get_mut(StateId::of::<T>())
            .and_then(|state| state.as_any_mut().downcast_mut::<T>())
    }

    pub fn contains(&self, id: StateId) -> bool {
        self.states.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl<Ctx: 'static> Default for StateCache<Ctx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Ctx> fmt::Debug for StateCache<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.states.keys().map(|id| id.name()))
            .finish()
    }
}
