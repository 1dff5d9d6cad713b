//! Authored schematic objects and derived nets.

pub mod schema;

pub use schema::*;
