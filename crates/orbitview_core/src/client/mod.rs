//! Viewer-side preset client.
//!
//! # Responsibility
//! - Mirror the store into an in-memory list and a durable local snapshot.
//! - Expose save/apply/delete/export/import/reconcile for the viewer UI.
//!
//! # Invariants
//! - `PresetSync` is the only writer of the list and the snapshot.
//! - Collaborators (store, snapshot, renderer, notifications) sit behind traits.

pub mod local_preset;
pub mod notify;
pub mod remote;
pub mod snapshot;
pub mod sync;
pub mod viewer;
