//! Persisted observation record schema
//!
//! This module defines the loosely-typed record shape the persistence layer
//! stores (a JSON array of records) and the boundary adapter that turns those
//! records into strongly-typed observation events.

mod adapter;
mod raw_record;

pub use adapter::*;
pub use raw_record::*;
