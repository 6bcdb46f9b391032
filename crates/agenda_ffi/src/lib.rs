//! Flutter bridge over `agenda_core`.

pub mod api;
