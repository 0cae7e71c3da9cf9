pub mod deadline;
pub mod request;
pub mod types;

pub use deadline::{DurationDays, compute_deadline};
pub use request::{DecisionPayload, DecisionRequest, DecisionSubmission};
pub use types::*;
