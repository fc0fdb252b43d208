//! Strata Model - Block Graph
//!
//! Blocks, their inheritance/reference/composition relations, and the
//! block-specific selector vocabulary. The graph is owned by the calling
//! system, lives longer than any single compilation, and is read-only
//! while compilations are in flight, so it may be shared across workers.

mod error;
mod graph;
mod selector;
pub mod syntax;

pub use error::ModelError;
pub use graph::{Block, BlockGraph, BlockId, Composition, StyleDeclaration, StyleRule};
pub use selector::{Combinator, Compound, OutputMode, ParsedSelector, Scope, State};
