//! Strata Compiler
//!
//! Lowers a block's parsed stylesheet into plain, conflict-free CSS:
//! debug directives are processed, block-meta constructs stripped,
//! inheritance conflicts resolved against ancestor output, selectors
//! rewritten to their final flat form, and remaining conflicts resolved
//! by reordering. The result is deterministic regardless of the order
//! blocks were authored or imported.
//!
//! The tree passes through each stage by value; no stage retains a
//! reference after handing off. The block graph is only read, so
//! independent blocks may compile on parallel workers sharing one graph,
//! provided the build system concatenates ancestor CSS before descendant
//! CSS.

mod config;
mod conflict;
mod debug;
mod error;
mod inheritance;
mod meta;

pub use config::{CompilerOptions, DefaultImporter, Importer};
pub use conflict::{Conflict, ConflictReason};
pub use error::CompileError;

use strata_ast::Stylesheet;
use strata_model::{BlockGraph, BlockId};

/// Pipeline stages, in the only order they may run. Each stage's
/// postcondition is the next one's precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    DebugProcessed,
    MetaStripped,
    InheritanceResolved,
    SelectorsRewritten,
    ConflictResolved,
}

/// Compiles one block's stylesheet tree at a time. Cheap to construct;
/// holds only the options.
pub struct BlockCompiler {
    opts: CompilerOptions,
}

impl BlockCompiler {
    pub fn new(opts: CompilerOptions) -> Self {
        Self { opts }
    }

    /// Run the full pipeline for `block`, consuming and returning the
    /// tree. A failed stage aborts the whole compilation; there is no
    /// partial output.
    pub fn compile(
        &self,
        graph: &BlockGraph,
        block: BlockId,
        root: Stylesheet,
    ) -> Result<Stylesheet, CompileError> {
        // Resolution assumes a terminating ancestor walk; check before
        // any stage runs.
        graph.validate(block)?;
        let name = graph.block(block).name.clone();
        tracing::debug!(block = %name, "compiling block");

        let root = debug::process_debug_statements(graph, block, root, &self.opts)?;
        tracing::trace!(block = %name, stage = ?Stage::DebugProcessed, "stage complete");

        let root = meta::strip_meta(root);
        tracing::trace!(block = %name, stage = ?Stage::MetaStripped, "stage complete");

        let (root, inherited) = inheritance::resolve_inheritance(graph, block, root)?;
        tracing::trace!(
            block = %name,
            stage = ?Stage::InheritanceResolved,
            conflicts = inherited.len(),
            "stage complete"
        );

        let root = self.rewrite_selectors(graph, block, root)?;
        tracing::trace!(block = %name, stage = ?Stage::SelectorsRewritten, "stage complete");

        let (root, resolved) = conflict::resolve_conflicts(graph, block, root, self.opts.output_mode)?;
        tracing::trace!(
            block = %name,
            stage = ?Stage::ConflictResolved,
            conflicts = resolved.len(),
            "stage complete"
        );

        Ok(root)
    }

    /// Replace every internal selector with its final flat form. Must
    /// run after meta stripping (meta constructs are not part of the
    /// selector vocabulary) and before general conflict resolution
    /// (which compares final selectors).
    fn rewrite_selectors(
        &self,
        graph: &BlockGraph,
        block_id: BlockId,
        mut root: Stylesheet,
    ) -> Result<Stylesheet, CompileError> {
        let block = graph.block(block_id);
        for rule in root.rules_mut() {
            let parsed = block
                .parse_selectors(&rule.selector)
                .map_err(|err| error::from_model(err, rule.span))?;
            let mut rewritten = Vec::with_capacity(parsed.len());
            for selector in &parsed {
                rewritten.push(
                    graph
                        .rewrite_selector(block_id, selector, self.opts.output_mode)
                        .map_err(|err| error::from_model(err, rule.span))?,
                );
            }
            rule.selector = rewritten.join(",\n");
        }
        Ok(root)
    }
}
