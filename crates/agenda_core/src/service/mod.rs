//! Agenda use-case services.
//!
//! # Responsibility
//! - Mirror the document into storage and export files.
//! - Route user events through the structural/in-place controller paths.
//! - Keep hosts decoupled from storage and rendering details.

pub mod agenda_controller;
pub mod persistence;
