//! Command execution functions.

mod resolve;

pub use resolve::resolve;
