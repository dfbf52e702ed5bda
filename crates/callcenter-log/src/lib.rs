//! # callcenter-log
//!
//! Per-call persistence of final turn states.
//!
//! Every turn's final `CallState` is converted with `json_safe` and wrapped
//! in a `TurnRecord` that links to the previous turn of the same call via
//! its SHA-256 hash. Editing a recorded turn breaks the chain, which
//! `verify_chain` detects.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use callcenter_log::FileCallLogWriter;
//!
//! let log = FileCallLogWriter::new("call_logs");
//! session.take_turn(Some(&graph), "my bill is wrong", &log)?;
//! let stored = log.load(session.call_id())?;
//! ```

pub mod chain;
pub mod event;
pub mod file;
pub mod memory;
pub mod safe;

pub use chain::{hash_turn, verify_chain, verify_log};
pub use event::{CallLog, TurnRecord};
pub use file::FileCallLogWriter;
pub use memory::InMemoryCallLogWriter;
pub use safe::json_safe;

// ── Tests ─────────────────────────────────────────────────────────────────────
