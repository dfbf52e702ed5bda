//! # callcenter-core
//!
//! The call-turn orchestration runtime.
//!
//! This crate provides:
//! - The capability traits (`TextGenerator`, `IntentClassifier`,
//!   `ResponseHandler`, `CallLogWriter`)
//! - The preprocessor and the intent router
//! - The `CallGraph` that wires them together in a fixed order
//! - The `CallSession` that drives a graph across the turns of one call
//!
//! ## Usage
//!
//! ```rust,ignore
//! use callcenter_core::{CallGraph, CallSession};
//!
//! let graph = CallGraph::builder()
//!     .classifier(classifier)
//!     .handler(HandlerName::BillingIssue, billing)
//!     // ... the other five handlers
//!     .build()?;
//! let final_state = graph.invoke(initial_state);
//! ```

pub mod graph;
pub mod preprocess;
pub mod router;
pub mod session;
pub mod traits;

pub use graph::{CallGraph, CallGraphBuilder, Stage, TurnResult};
pub use session::CallSession;
