//! Daymark Memory Source
//!
//! An in-memory [`DataSource`] implementation: named tables of entities
//! carrying named timestamp, number, and text columns, with optional
//! parent links between tables. Intended for tests and for hosts whose
//! data already lives in memory.

mod store;

pub use store::{Entity, MemorySource};
