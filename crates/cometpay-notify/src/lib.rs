//! Notification receiver — verifies asynchronous payment notifications.
//!
//! The processor posts out-of-band transaction updates to a dedicated
//! webhook path. Each notification carries the same `md5Info` signature as a
//! synchronous response and is verified identically, against the credentials
//! active at the moment of receipt. Verification is fail-closed: a missing
//! secret, an absent signature, or a digest mismatch all reject the call.
//! Signature logic lives in the core [`cometpay`] crate; this crate provides
//! the HTTP server, state, and metrics.
//!
//! # Modules
//!
//! - [`routes`] — HTTP endpoints (notify, health, metrics)
//! - [`state`] — Shared [`AppState`](state::AppState)
//! - [`metrics`] — Prometheus metrics for notification verification

pub mod metrics;
pub mod routes;
pub mod state;
