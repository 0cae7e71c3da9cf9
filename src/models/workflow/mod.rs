pub mod transitions;
pub mod types;

pub use transitions::{TRANSITIONS, find_available_transitions, find_transition};
pub use types::*;
