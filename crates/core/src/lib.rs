pub mod analysis;
pub mod config;
pub mod error;
pub mod model;
pub mod query;
pub mod time;
pub mod validate;

pub use error::{Result, TracespecError};
pub use validate::validate;
