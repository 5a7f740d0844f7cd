//! Template execution: evaluates parsed fragments against data

mod exec;
pub mod funcs;
pub mod value;

pub use exec::{execute, ExecContext, Helpers, Placeholders, YIELD_MARKER};
pub use value::{MissingKey, NO_VALUE};
