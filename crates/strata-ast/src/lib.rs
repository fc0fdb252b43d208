//! Strata AST - Stylesheet Tree
//!
//! The owned, mutable stylesheet tree the compiler transforms. Callers
//! construct it from already-parsed input; the compiler mutates it in
//! place and hands it back containing only plain CSS constructs.

mod emit;
mod node;
mod span;

pub use node::{AtRule, Comment, Declaration, Node, Rule, Stylesheet};
pub use span::Span;
