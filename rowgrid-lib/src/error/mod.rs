//! Error types

mod row;

pub use row::*;
