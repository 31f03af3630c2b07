//! Property-based tests for the transition protocol and the scheduler.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated inputs.

use flowstate::schedule::Scheduler;
use flowstate::{Flow, FlowMachine, State, StateId, TransitionCause};
use proptest::prelude::*;
use std::collections::HashSet;
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Hook {
    Enter,
    Update,
    Exit,
}

type Events = Vec<(Hook, &'static str)>;

macro_rules! recording_state {
    ($name:ident) => {
        #[derive(Default)]
        struct $name {
            visits: usize,
        }

        impl State<Events> for $name {
            fn on_enter(&mut self, flow: &mut Flow<'_, Events>) {
                self.visits += 1;
                flow.context_mut().push((Hook::Enter, stringify!($name)));
            }

            fn on_update(&mut self, flow: &mut Flow<'_, Events>) {
                flow.context_mut().push((Hook::Update, stringify!($name)));
            }

            fn on_exit(&mut self, flow: &mut Flow<'_, Events>) {
                flow.context_mut().push((Hook::Exit, stringify!($name)));
            }
        }
    };
}

recording_state!(Idle);
recording_state!(Chase);
recording_state!(Flee);

fn machine() -> FlowMachine<Events> {
    let mut machine = FlowMachine::new(Vec::new());
    machine.register::<Idle>();
    machine.register::<Chase>();
    machine.register::<Flee>();
    machine
}

fn ids() -> [StateId; 3] {
    [
        StateId::of::<Idle>(),
        StateId::of::<Chase>(),
        StateId::of::<Flee>(),
    ]
}

fn visits(machine: &FlowMachine<Events>, id: StateId) -> usize {
    if id == StateId::of::<Idle>() {
        machine.state::<Idle>().map_or(0, |s| s.visits)
    } else if id == StateId::of::<Chase>() {
        machine.state::<Chase>().map_or(0, |s| s.visits)
    } else {
        machine.state::<Flee>().map_or(0, |s| s.visits)
    }
}

prop_compose! {
    fn arbitrary_target()(variant in 0..3usize) -> StateId {
        ids()[variant]
    }
}

proptest! {
    #[test]
    fn exit_always_precedes_next_enter(
        targets in prop::collection::vec(arbitrary_target(), 1..20)
    ) {
        let mut machine = machine();
        for target in &targets {
            machine.transition_to_id(*target).unwrap();
        }

        let events = machine.context();
        prop_assert_eq!(events.len(), targets.len() * 2 - 1);
        prop_assert_eq!(events[0], (Hook::Enter, targets[0].name()));

        for (i, pair) in events[1..].chunks(2).enumerate() {
            prop_assert_eq!(pair[0], (Hook::Exit, targets[i].name()));
            prop_assert_eq!(pair[1], (Hook::Enter, targets[i + 1].name()));
        }
    }

    #[test]
    fn current_identity_is_last_target(
        targets in prop::collection::vec(arbitrary_target(), 1..20)
    ) {
        let mut machine = machine();
        for target in &targets {
            machine.transition_to_id(*target).unwrap();
            prop_assert_eq!(machine.current_identity(), Some(*target));
        }
    }

    #[test]
    fn revisits_reuse_cached_instances(
        targets in prop::collection::vec(arbitrary_target(), 1..30)
    ) {
        let mut machine = machine();
        for target in &targets {
            machine.transition_to_id(*target).unwrap();
        }

        let distinct: HashSet<_> = targets.iter().copied().collect();
        prop_assert_eq!(machine.cached_states(), distinct.len());

        for id in ids() {
            let expected = targets.iter().filter(|t| **t == id).count();
            prop_assert_eq!(visits(&machine, id), expected);
        }
    }

    #[test]
    fn history_path_follows_transitions(
        targets in prop::collection::vec(arbitrary_target(), 1..20)
    ) {
        let mut machine = machine();
        for target in &targets {
            machine.transition_to_id(*target).unwrap();
        }

        let expected: Vec<&str> = targets.iter().map(|t| t.name()).collect();
        prop_assert_eq!(machine.history().get_path(), expected);
        prop_assert!(machine
            .history()
            .records()
            .all(|r| r.cause == TransitionCause::Direct));
    }

    #[test]
    fn scheduled_transition_fires_once_after_delay(ticks in 1..50u64) {
        let mut machine = machine();
        machine
            .schedule_transition(StateId::of::<Chase>(), Duration::from_millis(10 * ticks))
            .unwrap();

        for _ in 1..ticks {
            machine.on_tick(Duration::from_millis(10)).unwrap();
        }
        prop_assert!(machine.current_identity().is_none());

        machine.on_tick(Duration::from_millis(10)).unwrap();
        prop_assert!(machine.is_in::<Chase>());

        for _ in 0..5 {
            machine.on_tick(Duration::from_millis(10)).unwrap();
        }
        prop_assert_eq!(machine.history().total_recorded(), 1);
    }

    #[test]
    fn dropping_machine_before_deadline_fires_nothing(ticks in 2..50u64) {
        let mut machine = machine();
        machine
            .schedule_transition(StateId::of::<Idle>(), Duration::from_millis(10 * ticks))
            .unwrap();

        for _ in 1..ticks {
            machine.on_tick(Duration::from_millis(10)).unwrap();
        }
        prop_assert_eq!(machine.history().total_recorded(), 0);
        prop_assert_eq!(machine.pending_timers(), 1);
        drop(machine);
    }

    #[test]
    fn scheduler_orders_by_deadline_then_registration(
        delays in prop::collection::vec(0..20u64, 1..40)
    ) {
        let mut timers = Scheduler::new();
        for (index, delay) in delays.iter().enumerate() {
            timers.schedule(Duration::from_millis(*delay), index);
        }

        let boundary = timers.advance(Duration::from_millis(20));
        let fired: Vec<usize> =
            std::iter::from_fn(|| timers.pop_due(boundary).map(|(_, i)| i)).collect();

        let mut expected: Vec<usize> = (0..delays.len()).collect();
        expected.sort_by_key(|&i| (delays[i], i));
        prop_assert_eq!(fired, expected);
    }

    #[test]
    fn ticks_update_only_the_current_state(
        targets in prop::collection::vec(arbitrary_target(), 1..10)
    ) {
        let mut machine = machine();
        for target in &targets {
            machine.transition_to_id(*target).unwrap();
            machine.context_mut().clear();
            machine.on_tick(Duration::from_millis(16)).unwrap();

            prop_assert_eq!(machine.context().as_slice(), &[(Hook::Update, target.name())]);
        }
    }
}
