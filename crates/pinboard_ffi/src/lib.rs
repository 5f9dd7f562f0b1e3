//! Flutter-facing bindings for the pinboard core.
//!
//! Every exported function lives in [`api`] and returns a plain envelope.

pub mod api;
