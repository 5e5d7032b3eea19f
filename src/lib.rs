//! Atlasdef - sprite atlas pages and animation definition compiler
//!
//! This library provides functionality to:
//! - Group atlas frames into animations by their trailing frame number
//! - Compile definitions such as `0-3(2),7` into ordered frame sequences
//! - Cache loaded atlas pages with single-flight construction per image
//! - Query page frames by group name, index, or index range

pub mod cli;
pub mod config;
pub mod diagnostic;
pub mod grouping;
pub mod hash;
pub mod loader;
pub mod models;
pub mod page;
pub mod parser;
pub mod registry;
pub mod sequence;
pub mod tokenizer;

pub use diagnostic::{CollectingSink, Diagnostic, DiagnosticSink};
pub use loader::{AtlasLoader, LoadError};
pub use models::{Definitions, Frame, RangeSpec};
pub use page::{DefinitionError, FrameSelector, Page};
pub use registry::{AtlasCache, AtlasStore, PageHandle};
