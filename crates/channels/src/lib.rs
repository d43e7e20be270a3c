//! Conversation channel implementations.
//!
//! The only production transport is the web channel, which the gateway's
//! WebSocket handlers drive. The Channel contract itself lives in
//! `opsrelay-core`.

pub mod web;

pub use web::WebChannel;
