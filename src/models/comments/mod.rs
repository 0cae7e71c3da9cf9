pub mod composer;
pub mod types;

pub use composer::{CommentComposer, REJECTION_PLACEHOLDER};
pub use types::*;
