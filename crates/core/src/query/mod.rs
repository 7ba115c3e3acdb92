#![forbid(unsafe_code)]

mod compose;
mod predicate;
mod sort;

pub use compose::*;
pub use predicate::*;
pub use sort::*;
