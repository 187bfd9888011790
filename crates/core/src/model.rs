pub mod result;
pub mod span;
pub mod spec;
