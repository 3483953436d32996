//! Parsing, rendering, play sessions and persistence.

pub mod brackets;
pub mod bundle;
pub mod ids;
pub mod play;
pub mod render;
pub mod repository;
pub mod studio;
