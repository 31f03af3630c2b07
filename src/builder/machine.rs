//! Builder for constructing machines.

use crate::builder::error::BuildError;
use crate::config::MachineConfig;
use crate::core::{State, StateId, StateRegistry};
use crate::machine::FlowMachine;

/// Builder for constructing machines with a fluent API.
///
/// # Example
///
/// ```
/// use flowstate::builder::FlowMachineBuilder;
/// use flowstate::core::State;
///
/// #[derive(Default)]
/// struct Idle;
/// impl State<f32> for Idle {}
///
/// #[derive(Default)]
/// struct Chase;
/// impl State<f32> for Chase {}
///
/// let mut machine = FlowMachineBuilder::new(3.0_f32)
///     .state::<Chase>()
///     .start_state::<Idle>()
///     .history_limit(16)
///     .build()
///     .unwrap();
///
/// machine.start().unwrap();
/// assert!(machine.is_in::<Idle>());
/// ```
pub struct FlowMachineBuilder<Ctx: 'static> {
    context: Ctx,
    registry: StateRegistry<Ctx>,
    start: Option<StateId>,
    config: MachineConfig,
}

impl<Ctx: 'static> FlowMachineBuilder<Ctx> {
    /// Create a new builder around the host context.
    pub fn new(context: Ctx) -> Self {
        Self {
            context,
            registry: StateRegistry::new(),
            start: None,
            config: MachineConfig::default(),
        }
    }

    /// Register a state built with `T::default()`.
    pub fn state<T>(mut self) -> Self
    where
        T: State<Ctx> + Default,
    {
        self.registry.register::<T>();
        self
    }

    /// Register a state with a custom constructor.
    pub fn state_with<T, F>(mut self, factory: F) -> Self
    where
        T: State<Ctx>,
        F: Fn() -> T + 'static,
    {
        self.registry.register_with(factory);
        self
    }

    /// Register `T` and enter it on `start()`.
    pub fn start_state<T>(mut self) -> Self
    where
        T: State<Ctx> + Default,
    {
        self.start = Some(self.registry.register::<T>());
        self
    }

    /// Enter an already registered identity on `start()`.
    pub fn start_state_id(mut self, id: StateId) -> Self {
        self.start = Some(id);
        self
    }

    /// Enter the state with this name on `start()`.
    ///
    /// The name is resolved when the machine starts; an unknown name is
    /// logged as a warning and the machine stays without a current state.
    pub fn start_state_named(mut self, name: impl Into<String>) -> Self {
        self.config.start_state = Some(name.into());
        self
    }

    /// Replace the whole configuration, keeping any typed start state.
    pub fn config(mut self, config: MachineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn max_chained_transitions(mut self, limit: usize) -> Self {
        self.config.max_chained_transitions = limit;
        self
    }

    pub fn history_limit(mut self, limit: usize) -> Self {
        self.config.history_limit = limit;
        self
    }

    /// Build the machine. No hook runs until `start()` or a transition.
    pub fn build(self) -> Result<FlowMachine<Ctx>, BuildError> {
        if let Some(id) = self.start {
            if let Some(name) = &self.config.start_state {
                return Err(BuildError::ConflictingStartState {
                    by_type: id.name(),
                    by_name: name.clone(),
                });
            }
            if !self.registry.contains(id) {
                return Err(BuildError::UnregisteredStartState { state: id.name() });
            }
        }

        Ok(FlowMachine::with_registry(
            self.context,
            self.config,
            self.registry,
            self.start,
        ))
    }
}
