//! Board use-case orchestration.
//!
//! # Responsibility
//! - Own the explicit application state of one board session.
//! - Route user actions and remote pushes to persistence, layout and
//!   rendering.
//!
//! # Invariants
//! - Every mutation or pushed snapshot ends in a full re-render.
//! - Failures are reported to the surface and leave state unchanged.

pub mod board;
