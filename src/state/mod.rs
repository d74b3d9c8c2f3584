//! State module for tracking corpus build progress
//!
//! # Components
//!
//! - `BuildState`: lifecycle of one run of the checkpointed corpus builder

mod build_state;

pub use build_state::BuildState;
