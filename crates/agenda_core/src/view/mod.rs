//! Agenda view projection.
//!
//! # Responsibility
//! - Project an `AgendaDocument` into a host-agnostic tree of controls.
//! - Capture, per control, the binding a host sends back with user events.
//!
//! # Invariants
//! - A view is always built from scratch; it is never diffed against the
//!   previous one.
//! - Bindings carry the `generation` of the view that produced them.
//! - Print mode carries no add/delete controls and no editable fields.

mod print;
mod render;

pub use print::render_plain_text;
pub use render::{
    render, AgendaView, Button, HeaderView, RenderMode, SubtopicBinding, SubtopicRow, TextField,
    Toggle, TopicBinding, TopicCard, UiEvent,
};
