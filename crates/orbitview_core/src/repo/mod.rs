//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the preset data access contract.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes must enforce `StoredPreset::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod preset_repo;
