//! Terminal presentation helpers

pub mod notify;
pub mod prompt;
pub mod pull;
