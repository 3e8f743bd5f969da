//! Camera preset domain model.
//!
//! # Responsibility
//! - Define the canonical preset shapes shared by store and client.
//! - Keep validation rules next to the data they guard.
//!
//! # Invariants
//! - A stored preset is identified by a store-assigned `StoreId`.
//! - Presets are never mutated after creation; there is no update path.

pub mod preset;
