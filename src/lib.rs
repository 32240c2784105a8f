//! Trendlink chat backend.
//!
//! A thin HTTP relay: inbound chat messages are classified lexically
//! (trend query? instrument request? off-topic?), optionally enriched with
//! data from the Trendlink trend API, and forwarded to the OpenAI
//! chat-completion API. The model's answer goes back out as JSON.

pub mod app;
pub mod errors;
pub mod external;
pub mod logging;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
