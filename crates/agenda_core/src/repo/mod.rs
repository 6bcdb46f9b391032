//! Repository layer over the durable local store.
//!
//! # Responsibility
//! - Define the key-value contract the persistence adapter writes through.
//! - Isolate SQLite query details from agenda orchestration.
//!
//! # Invariants
//! - One key maps to at most one value; writes overwrite.

pub mod storage_repo;
