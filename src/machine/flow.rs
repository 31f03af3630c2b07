//! The handle a state uses to talk to its machine.

use super::error::FlowError;
use crate::core::{State, StateId, StateRegistry};
use crate::schedule::{Scheduler, TimerId};
use std::collections::VecDeque;
use std::time::Duration;

/// Callback registered with [`Flow::wait`].
pub type WaitCallback<Ctx> = Box<dyn FnOnce(&mut Flow<'_, Ctx>)>;

/// What a machine timer does when it comes due.
pub(crate) enum TimerAction<Ctx> {
    Transition(StateId),
    Callback(WaitCallback<Ctx>),
}

/// Borrowed view of a machine, handed to every state hook and timer
/// callback.
///
/// Transition requests made through a `Flow` are queued. The machine runs
/// them in order once the hook that made them has returned, so a request
/// made from `on_enter` or `on_exit` never interrupts the transition that
/// is already in progress. During a tick only one transition runs; later
/// requests wait for the next tick.
pub struct Flow<'a, Ctx> {
    context: &'a mut Ctx,
    registry: &'a mut StateRegistry<Ctx>,
    timers: &'a mut Scheduler<TimerAction<Ctx>>,
    pending: &'a mut VecDeque<StateId>,
    current: Option<StateId>,
    delta: Duration,
}

impl<'a, Ctx: 'static> Flow<'a, Ctx> {
    pub(crate) fn new(
        context: &'a mut Ctx,
        registry: &'a mut StateRegistry<Ctx>,
        timers: &'a mut Scheduler<TimerAction<Ctx>>,
        pending: &'a mut VecDeque<StateId>,
        current: Option<StateId>,
        delta: Duration,
    ) -> Self {
        Self {
            context,
            registry,
            timers,
            pending,
            current,
            delta,
        }
    }

    /// Host data owned by the machine.
    pub fn context(&self) -> &Ctx {
        self.context
    }

    pub fn context_mut(&mut self) -> &mut Ctx {
        self.context
    }

    /// Identity of the state the machine considers current.
    ///
    /// Inside `on_exit` this is still the state being left.
    pub fn current_identity(&self) -> Option<StateId> {
        self.current
    }

    /// Machine clock: the sum of every `dt` passed to `on_tick`.
    pub fn elapsed(&self) -> Duration {
        self.timers.now()
    }

    /// `dt` of the tick being processed, zero outside of ticks.
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Ask the machine to move to `T` once the current hook returns.
    pub fn transition_to<T>(&mut self)
    where
        T: State<Ctx> + Default,
    {
        let id = self.registry.register::<T>();
        self.pending.push_back(id);
    }

    /// Ask the machine to move to `id` once the current hook returns.
    pub fn transition_to_id(&mut self, id: StateId) -> Result<(), FlowError> {
        self.ensure_registered(id)?;
        self.pending.push_back(id);
        Ok(())
    }

    /// Move to `T` once `delay` of machine time has passed.
    pub fn transition_after<T>(&mut self, delay: Duration) -> TimerId
    where
        T: State<Ctx> + Default,
    {
        let id = self.registry.register::<T>();
        self.timers.schedule(delay, TimerAction::Transition(id))
    }

    /// Move to `id` once `delay` of machine time has passed.
    pub fn transition_after_id(
        &mut self,
        id: StateId,
        delay: Duration,
    ) -> Result<TimerId, FlowError> {
        self.ensure_registered(id)?;
        Ok(self.timers.schedule(delay, TimerAction::Transition(id)))
    }

    /// Run `callback` at the first tick boundary after `delay` has passed.
    ///
    /// The callback gets a fresh `Flow`, so it can edit the context and
    /// request transitions like a hook would.
    pub fn wait<F>(&mut self, delay: Duration, callback: F) -> TimerId
    where
        F: FnOnce(&mut Flow<'_, Ctx>) + 'static,
    {
        self.timers
            .schedule(delay, TimerAction::Callback(Box::new(callback)))
    }

    /// Cancel a timer created by this machine.
    pub fn cancel(&mut self, timer: TimerId) -> bool {
        self.timers.cancel(timer)
    }

    fn ensure_registered(&self, id: StateId) -> Result<(), FlowError> {
        if self.registry.contains(id) {
            Ok(())
        } else {
            Err(FlowError::UnresolvableIdentity { state: id.name() })
        }
    }
}
