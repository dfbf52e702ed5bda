//! # callcenter-llm
//!
//! Generative text backends implementing `callcenter_core::traits::TextGenerator`.
//!
//! - `GroqClient`: a hosted model behind an OpenAI-compatible
//!   `/chat/completions` endpoint, called synchronously with a bounded
//!   timeout and a small retry budget
//! - `OfflineGenerator`: no network; the classifier capability is disabled
//!   and handlers receive a fixed acknowledgement

pub mod client;
pub mod config;
pub mod offline;
pub mod wire;

pub use client::GroqClient;
pub use config::LlmConfig;
pub use offline::OfflineGenerator;
