//! Agenda domain model.
//!
//! # Responsibility
//! - Define the canonical agenda tree edited by every host.
//! - Keep mutation operations free of rendering and storage concerns.
//!
//! # Invariants
//! - Every topic and subtopic is identified by a stable `ItemId`.
//! - Deletion is positional and removes the entry outright.

pub mod agenda;
