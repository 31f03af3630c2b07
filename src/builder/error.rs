//! Build errors for the machine builder.

use thiserror::Error;

/// Errors that can occur when building a machine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("Start state '{state}' is not registered. Call .state::<T>() or use .start_state::<T>()")]
    UnregisteredStartState { state: &'static str },

    #[error("Start state given both by type ('{by_type}') and by name ('{by_name}')")]
    ConflictingStartState {
        by_type: &'static str,
        by_name: String,
    },
}
