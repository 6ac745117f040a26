//! Murmur: analysis backend for a voice-journaling client.
//!
//! A browser client records speech, obtains a transcript, and submits it
//! here. Every analytical step is a forwarded call to a hosted model:
//!
//! Transcript → emotion + sentiment classification → insight lookup →
//! template expansion → feedback generation → client
//!
//! # Architecture
//!
//! - **Classifiers** (`emotion`, `sentiment`): normalize raw model output
//!   (rounding, sorting, significance filtering, top-label selection).
//! - **Insight lookup** (`insight`): static emotion → topic/redirection
//!   dataset, loaded once at boot.
//! - **Template engine** (`template`): a two-level `{foreach}` + `$var`
//!   mini-language parsed once into an AST.
//! - **Feedback orchestrator** (`feedback`): merges analysis results into
//!   a prompt context, renders the template, and calls the generative
//!   model; failures propagate, never partial output.
//! - **Transport** (`server`): thin axum routes with up-front validation.

pub mod config;
pub mod emotion;
pub mod error;
pub mod feedback;
pub mod inference;
pub mod insight;
pub mod sentiment;
pub mod server;
pub mod template;

pub use config::AppConfig;
pub use error::{JournalError, Result};
pub use server::JournalServer;
