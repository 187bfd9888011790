pub mod db;
pub mod load;
pub mod query;
pub mod write;

pub use db::{KeyedStore, MemoryStore, Store};
