//! Row lifecycle and numbering engine for an embeddable grid.
//!
//! Keeps a grid's rows within structural bounds (a minimum row count and an
//! always-present trailing empty row) and maintains their 1-based display
//! numbers through adds, deletes, imports and filters.

pub mod config;
pub mod error;
pub mod integration;
pub mod ledger;
pub mod lifecycle;
pub mod model;
pub mod result;
pub mod sequencer;

mod engine;

pub use engine::*;
pub use result::Outcome;
