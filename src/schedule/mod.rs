//! Tick-driven delay scheduling.
//!
//! Delays are plain queue entries evaluated at tick boundaries. The machine
//! stores two kinds of payload here: scheduled transitions and the callbacks
//! registered through [`Flow::wait`](crate::machine::Flow::wait).

mod scheduler;

pub use scheduler::{Boundary, Scheduler, TimerId};
