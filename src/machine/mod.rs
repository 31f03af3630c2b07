//! The machine that owns states and runs the transition protocol.
//!
//! # Transition protocol
//!
//! 1. `on_exit` of the current state, if any, runs to completion
//! 2. the target instance is fetched from the cache, or created on first visit
//! 3. the target becomes current
//! 4. `on_enter` of the target runs
//!
//! Requests made from inside a hook are queued and run after it, never
//! nested inside it. A direct call on the machine runs the whole queue
//! before returning. A tick runs at most one transition and leaves the
//! rest of the queue for the ticks that follow.

mod error;
mod flow;
mod flow_machine;

pub use error::FlowError;
pub use flow::{Flow, WaitCallback};
pub use flow_machine::FlowMachine;
