//! Flowstate: a per-entity behavior state machine
//!
//! A host entity owns one [`FlowMachine`], which holds exactly one active
//! behavior state at a time and moves between states on demand or after a
//! delay measured in host ticks.
//!
//! # Core Concepts
//!
//! - **State**: a behavior with `on_enter`, `on_update` and `on_exit` hooks
//! - **StateId**: the identity of a state type, used as cache and registry key
//! - **Cache**: one lazily created instance per state, reused on every visit
//! - **Flow**: the handle a state gets in each hook to reach its machine
//! - **Timers**: scheduled transitions and callbacks fired at tick boundaries
//!
//! # Example
//!
//! ```rust
//! use flowstate::{Flow, FlowMachine, State};
//! use std::time::Duration;
//!
//! #[derive(Default)]
//! struct Enemy {
//!     player_distance: f32,
//! }
//!
//! #[derive(Default)]
//! struct Idle;
//!
//! #[derive(Default)]
//! struct Chase {
//!     ticks: u32,
//! }
//!
//! impl State<Enemy> for Idle {
//!     fn on_update(&mut self, flow: &mut Flow<'_, Enemy>) {
//!         if flow.context().player_distance < 5.0 {
//!             flow.transition_to::<Chase>();
//!         }
//!     }
//! }
//!
//! impl State<Enemy> for Chase {
//!     fn on_update(&mut self, flow: &mut Flow<'_, Enemy>) {
//!         self.ticks += 1;
//!         if flow.context().player_distance > 7.0 {
//!             flow.transition_to::<Idle>();
//!         }
//!     }
//! }
//!
//! let mut machine = FlowMachine::new(Enemy { player_distance: 10.0 });
//! machine.transition_to::<Idle>().unwrap();
//!
//! machine.context_mut().player_distance = 3.0;
//! machine.on_tick(Duration::from_millis(16)).unwrap();
//! assert!(machine.is_in::<Chase>());
//!
//! machine.context_mut().player_distance = 8.0;
//! machine.on_tick(Duration::from_millis(16)).unwrap();
//! machine.on_tick(Duration::from_millis(16)).unwrap();
//! assert!(machine.is_in::<Idle>());
//! assert_eq!(machine.state::<Chase>().unwrap().ticks, 1);
//! ```

pub mod builder;
pub mod config;
pub mod core;
pub mod machine;
pub mod schedule;

// Re-export commonly used types
pub use builder::{BuildError, FlowMachineBuilder};
pub use config::{ConfigError, MachineConfig};
pub use crate::core::{State, StateId, TransitionCause, TransitionHistory, TransitionRecord};
pub use machine::{Flow, FlowError, FlowMachine};
pub use schedule::TimerId;
