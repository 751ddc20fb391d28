//! HTTP client for the Lexora backend.
//!
//! The backend exposes two conversational services with the same shape:
//! consultation (`/qna/chat`) and research (`/research/chat`). This crate
//! wraps both behind one typed client.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────────┐
//! │   Controllers    │────▶│ ConversationBackend  │
//! │ (lexora-session) │     │ (trait)              │
//! └──────────────────┘     └──────────┬───────────┘
//!                                     │
//!                          ┌──────────▼───────────┐
//!                          │   SessionClient      │
//!                          │   (reqwest)          │
//!                          └──────────┬───────────┘
//!                                     │ HTTPS + JSON
//!                          ┌──────────▼───────────┐
//!                          │   Lexora backend     │
//!                          └──────────────────────┘
//! ```
//!
//! Every call either resolves with a parsed body or fails fast. There is no
//! retry, backoff, caching, or client-side timeout; callers decide what to do
//! with a failure.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod backend;
pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use backend::ConversationBackend;
pub use client::SessionClient;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use types::{ConversationResponse, HealthResponse};
