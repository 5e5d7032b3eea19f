//! Configuration for atlasdef
//!
//! Provides types and loading for the `atlasdef.toml` configuration file.

pub mod loader;
pub mod schema;

pub use loader::*;
pub use schema::*;
