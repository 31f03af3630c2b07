//! Errors raised by the transition protocol.

use thiserror::Error;

/// Errors that can occur while resolving or performing transitions
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FlowError {
    #[error("State '{state}' is not registered with this machine")]
    UnresolvableIdentity { state: &'static str },

    #[error("State '{name}' not found")]
    UnknownState { name: String },

    #[error("Transition chain exceeded {limit} follow-up transitions (last requested: '{state}')")]
    TransitionLoop { limit: usize, state: &'static str },
}
