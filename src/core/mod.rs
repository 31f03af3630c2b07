//! Core building blocks of a behavior machine.
//!
//! - `State` and `StateId`: behaviors and their identity
//! - `StateRegistry`: identity → factory and name → identity
//! - `StateCache`: one lazily created instance per identity
//! - `TransitionHistory`: bounded log of performed transitions

mod cache;
mod history;
mod registry;
mod state;

pub use cache::StateCache;
pub use history::{TransitionCause, TransitionHistory, TransitionRecord};
pub use registry::{StateFactory, StateRegistry};
pub use state::{AsAny, State, StateId};
