pub mod comments;
pub mod decision;
pub mod evaluator;
pub mod proposal;
pub mod workflow;
