//! Builder API for ergonomic machine construction.
//!
//! The builder collects state registrations, the start state and the
//! configuration, and validates them before the machine exists.

pub mod error;
pub mod machine;

pub use error::BuildError;
pub use machine::FlowMachineBuilder;
