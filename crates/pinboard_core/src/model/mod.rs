//! Pinboard domain model.
//!
//! # Responsibility
//! - Define the shared note record and the viewer-local placement types.
//! - Keep input normalization (trim/truncate) next to the record it guards.
//!
//! # Invariants
//! - A persisted note never has empty text after trimming.
//! - Geometry values are CSS pixels relative to the board interior.

pub mod geometry;
pub mod note;
