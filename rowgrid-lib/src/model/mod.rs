//! Row model types

mod content;
mod row;
mod value;

pub use content::*;
pub use row::*;
pub use value::*;
