//! Madlibs Engine — fill-in-the-blank story templates.
//!
//! Authors write sentences in bracket syntax (`The [animal:big cat] ate my
//! [noun].`), which parse into text and blank items with stable ids. Players
//! supply a word per blank, and saved stories bind those words to blank ids
//! so they can be rendered, edited, shared and exported later.

pub mod builtin_templates;
pub mod core;
pub mod schema;
