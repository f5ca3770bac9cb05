//! # Intervo Store
//!
//! In-memory implementation of every persistence port, backed by per-entity
//! `RwLock<HashMap>` tables. Serves tests and single-process deployments;
//! a database-backed adapter would implement the same traits.

pub mod memory;

pub use memory::MemoryStore;
