//! The per-entity behavior machine.

use super::error::FlowError;
use super::flow::{Flow, TimerAction, WaitCallback};
use crate::config::MachineConfig;
use crate::core::{
    State, StateCache, StateId, StateRegistry, TransitionCause, TransitionHistory,
    TransitionRecord,
};
use crate::schedule::{Scheduler, TimerId};
use chrono::Utc;
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Drives one entity's behavior: exactly one current state at a time,
/// cached state instances, and timers evaluated at tick boundaries.
///
/// The host owns the machine, calls [`on_tick`](Self::on_tick) once per
/// update and drops the machine with its entity. Dropping it drops every
/// pending timer with it.
///
/// # Example
///
/// ```rust
/// use flowstate::core::State;
/// use flowstate::machine::{Flow, FlowMachine};
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Idle;
/// impl State<u32> for Idle {}
///
/// #[derive(Default)]
/// struct Alert;
/// impl State<u32> for Alert {
///     fn on_enter(&mut self, flow: &mut Flow<'_, u32>) {
///         *flow.context_mut() += 1;
///         flow.transition_after::<Idle>(Duration::from_secs(2));
///     }
/// }
///
/// let mut machine = FlowMachine::new(0u32);
/// machine.transition_to::<Alert>().unwrap();
/// assert!(machine.is_in::<Alert>());
///
/// machine.on_tick(Duration::from_secs(2)).unwrap();
/// assert!(machine.is_in::<Idle>());
/// assert_eq!(*machine.context(), 1);
/// ```
pub struct FlowMachine<Ctx: 'static = ()> {
    id: Uuid,
    context: Ctx,
    registry: StateRegistry<Ctx>,
    cache: StateCache<Ctx>,
    timers: Scheduler<TimerAction<Ctx>>,
    pending: VecDeque<StateId>,
    current: Option<StateId>,
    start_state: Option<StateId>,
    start_name: Option<String>,
    history: TransitionHistory,
    max_chained: usize,
    delta: Duration,
}

impl<Ctx: 'static> FlowMachine<Ctx> {
    /// Create a machine with default configuration and no current state.
    pub fn new(context: Ctx) -> Self {
        Self::with_config(context, MachineConfig::default())
    }

    /// Create a machine with the given configuration and no current state.
    pub fn with_config(context: Ctx, config: MachineConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            context,
            registry: StateRegistry::new(),
            cache: StateCache::new(),
            timers: Scheduler::new(),
            pending: VecDeque::new(),
            current: None,
            start_state: None,
            start_name: config.start_state,
            history: TransitionHistory::with_limit(config.history_limit),
            max_chained: config.max_chained_transitions,
            delta: Duration::ZERO,
        }
    }

    pub(crate) fn with_registry(
        context: Ctx,
        config: MachineConfig,
        registry: StateRegistry<Ctx>,
        start_state: Option<StateId>,
    ) -> Self {
        let mut machine = Self::with_config(context, config);
        machine.registry = registry;
        machine.start_state = start_state;
        machine
    }

    /// Unique id of this machine, attached to its log events.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Register `T`, built with `T::default()` on first visit.
    pub fn register<T>(&mut self) -> StateId
    where
        T: State<Ctx> + Default,
    {
        self.registry.register::<T>()
    }

    /// Register `T` with a custom constructor.
    pub fn register_with<T, F>(&mut self, factory: F) -> StateId
    where
        T: State<Ctx>,
        F: Fn() -> T + 'static,
    {
        self.registry.register_with(factory)
    }

    pub fn registry(&self) -> &StateRegistry<Ctx> {
        &self.registry
    }

    /// State entered by [`start`](Self::start). Takes precedence over a
    /// start state named in the config.
    pub fn set_start_state(&mut self, id: StateId) {
        self.start_state = Some(id);
    }

    /// Enter the start state, if one is set and nothing is current yet.
    ///
    /// A start state given by name that does not resolve is logged as a
    /// warning and leaves the machine without a current state.
    pub fn start(&mut self) -> Result<(), FlowError> {
        if self.current.is_some() {
            return Ok(());
        }
        let target = match (self.start_state, self.start_name.as_deref()) {
            (Some(id), _) => Some(id),
            (None, Some(name)) => self.registry.resolve_or_warn(name),
            (None, None) => None,
        };
        match target {
            Some(id) => self.run(id, TransitionCause::Start),
            None => Ok(()),
        }
    }

    /// Exit the current state (if any) and enter `T`, registering `T` on
    /// first use.
    pub fn transition_to<T>(&mut self) -> Result<(), FlowError>
    where
        T: State<Ctx> + Default,
    {
        let id = self.registry.register::<T>();
        self.run(id, TransitionCause::Direct)
    }

    /// Exit the current state (if any) and enter `id`.
    ///
    /// Moving to the state that is already current still runs its
    /// `on_exit` and `on_enter`. An unregistered `id` is refused before any
    /// hook runs, leaving the current state in place.
    pub fn transition_to_id(&mut self, id: StateId) -> Result<(), FlowError> {
        self.run(id, TransitionCause::Direct)
    }

    /// Transition to `id` once `delay` of machine time has passed.
    pub fn schedule_transition(
        &mut self,
        id: StateId,
        delay: Duration,
    ) -> Result<TimerId, FlowError> {
        if !self.registry.contains(id) {
            return Err(FlowError::UnresolvableIdentity { state: id.name() });
        }
        Ok(self.timers.schedule(delay, TimerAction::Transition(id)))
    }

    /// Transition to `T` once `delay` of machine time has passed,
    /// registering `T` on first use.
    pub fn transition_after<T>(&mut self, delay: Duration) -> TimerId
    where
        T: State<Ctx> + Default,
    {
        let id = self.registry.register::<T>();
        self.timers.schedule(delay, TimerAction::Transition(id))
    }

    /// Run `callback` at the first tick boundary after `delay` has passed.
    pub fn wait<F>(&mut self, delay: Duration, callback: F) -> TimerId
    where
        F: FnOnce(&mut Flow<'_, Ctx>) + 'static,
    {
        self.timers
            .schedule(delay, TimerAction::Callback(Box::new(callback)))
    }

    /// Cancel a pending timer. Returns `false` if it already fired.
    pub fn cancel_timer(&mut self, timer: TimerId) -> bool {
        self.timers.cancel(timer)
    }

    /// Drop every pending timer and wait callback.
    pub fn cancel_all_timers(&mut self) {
        self.timers.clear();
    }

    /// Number of timers that have not fired yet.
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Advance one host update.
    ///
    /// At most one transition runs per tick. In order of priority:
    ///
    /// 1. the oldest request deferred from an earlier tick
    /// 2. the earliest due timer (deadline order, ties in registration order)
    /// 3. a request made by a wait callback or by `on_update` in this tick
    ///
    /// Once a transition has run, due transition timers and any further
    /// requests stay queued for the next tick. Wait callbacks due before
    /// the first blocked timer still run. `on_update` is called on the
    /// current state exactly once, after the timers.
    pub fn on_tick(&mut self, dt: Duration) -> Result<(), FlowError> {
        self.delta = dt;
        let result = self.tick(dt);
        self.delta = Duration::ZERO;
        result
    }

    fn tick(&mut self, dt: Duration) -> Result<(), FlowError> {
        let boundary = self.timers.advance(dt);
        let mut transitioned = self.step_pending()?;

        loop {
            let blocked = match self.timers.peek_due(boundary) {
                None => break,
                Some((_, TimerAction::Transition(_))) => transitioned,
                Some((_, TimerAction::Callback(_))) => false,
            };
            if blocked {
                tracing::trace!(machine = %self.id, "tick already transitioned, deferring due timers");
                break;
            }
            let Some((timer, action)) = self.timers.pop_due(boundary) else {
                break;
            };
            match action {
                TimerAction::Transition(target) => {
                    tracing::debug!(machine = %self.id, %timer, state = %target, "scheduled transition due");
                    self.step(target, TransitionCause::Scheduled)?;
                    transitioned = true;
                }
                TimerAction::Callback(callback) => {
                    tracing::trace!(machine = %self.id, %timer, "wait callback due");
                    self.with_flow(callback);
                    if !transitioned {
                        transitioned = self.step_pending()?;
                    }
                }
            }
        }

        self.with_current(|state, flow| state.on_update(flow));
        if !transitioned {
            self.step_pending()?;
        }
        Ok(())
    }

    /// Transitions requested during a tick that were left for a later one.
    pub fn deferred_requests(&self) -> usize {
        self.pending.len()
    }

    pub fn current_identity(&self) -> Option<StateId> {
        self.current
    }

    pub fn is_in<T: 'static>(&self) -> bool {
        self.current == Some(StateId::of::<T>())
    }

    /// Cached instance of `T`, if the machine has visited it.
    pub fn state<T: State<Ctx>>(&self) -> Option<&T> {
        self.cache.get_as::<T>()
    }

    pub fn state_mut<T: State<Ctx>>(&mut self) -> Option<&mut T> {
        self.cache.get_as_mut::<T>()
    }

    /// Number of distinct states instantiated so far.
    pub fn cached_states(&self) -> usize {
        self.cache.len()
    }

    pub fn context(&self) -> &Ctx {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut Ctx {
        &mut self.context
    }

    /// Machine clock: the sum of every `dt` passed to `on_tick`.
    pub fn elapsed(&self) -> Duration {
        self.timers.now()
    }

    pub fn history(&self) -> &TransitionHistory {
        &self.history
    }

    fn run(&mut self, target: StateId, cause: TransitionCause) -> Result<(), FlowError> {
        self.pending.push_back(target);
        self.drain(cause)
    }

    /// Perform exactly one transition, leaving requests made by its hooks
    /// queued for a later tick.
    fn step(&mut self, target: StateId, cause: TransitionCause) -> Result<(), FlowError> {
        let result = self.apply(target, cause);
        if result.is_err() {
            self.pending.clear();
        }
        result
    }

    fn step_pending(&mut self) -> Result<bool, FlowError> {
        match self.pending.pop_front() {
            Some(target) => self.step(target, TransitionCause::Requested).map(|()| true),
            None => Ok(false),
        }
    }

    /// Perform queued transitions one at a time, including the ones queued
    /// by hooks while this loop runs.
    fn drain(&mut self, mut cause: TransitionCause) -> Result<(), FlowError> {
        let mut performed = 0;
        while let Some(target) = self.pending.pop_front() {
            if performed > self.max_chained {
                self.pending.clear();
                tracing::warn!(machine = %self.id, state = %target, limit = self.max_chained,
                    "aborting runaway transition chain");
                return Err(FlowError::TransitionLoop {
                    limit: self.max_chained,
                    state: target.name(),
                });
            }
            if let Err(err) = self.apply(target, cause) {
                self.pending.clear();
                return Err(err);
            }
            performed += 1;
            cause = TransitionCause::Requested;
        }
        Ok(())
    }

    /// Exit the current state, then resolve, install and enter `target`.
    fn apply(&mut self, target: StateId, cause: TransitionCause) -> Result<(), FlowError> {
        if !self.registry.contains(target) {
            tracing::warn!(machine = %self.id, state = %target, "refusing transition to unregistered state");
            return Err(FlowError::UnresolvableIdentity {
                state: target.name(),
            });
        }

        let previous = self.current;
        if let Some(prev) = previous {
            tracing::debug!(machine = %self.id, state = %prev, "exiting state");
            self.with_current(|state, flow| state.on_exit(flow));
        }

        self.cache.get_or_create(target, &self.registry)?;
        self.current = Some(target);
        tracing::debug!(machine = %self.id, state = %target, ?cause, "entering state");
        self.with_current(|state, flow| state.on_enter(flow));

        self.history.record(TransitionRecord {
            from: previous.map(|id| id.name().to_string()),
            to: target.name().to_string(),
            cause,
            elapsed: self.timers.now(),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    fn with_current<F>(&mut self, hook: F)
    where
        F: FnOnce(&mut dyn State<Ctx>, &mut Flow<'_, Ctx>),
    {
        let Some(id) = self.current else {
            return;
        };
        let Self {
            context,
            registry,
            cache,
            timers,
            pending,
            delta,
            ..
        } = self;
        if let Some(state) = cache.get_mut(id) {
            let mut flow = Flow::new(context, registry, timers, pending, Some(id), *delta);
            hook(state, &mut flow);
        }
    }

    fn with_flow(&mut self, callback: WaitCallback<Ctx>) {
        let Self {
            context,
            registry,
            timers,
            pending,
            current,
            delta,
            ..
        } = self;
        let mut flow = Flow::new(context, registry, timers, pending, *current, *delta);
        callback(&mut flow);
    }
}

impl<Ctx: 'static> fmt::Debug for FlowMachine<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowMachine")
            .field("id", &self.id)
            .field("current", &self.current)
            .field("cached", &self.cache)
            .field("timers", &self.timers)
            .finish()
    }
}
