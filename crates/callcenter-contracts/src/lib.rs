//! # callcenter-contracts
//!
//! Shared types and contracts for the call-turn runtime.
//!
//! Every crate in the workspace imports from here. No business logic lives in
//! this crate: only data definitions, closed label sets, the script-extraction
//! contract, and error types.

pub mod error;
pub mod intent;
pub mod nlu;
pub mod script;
pub mod state;
