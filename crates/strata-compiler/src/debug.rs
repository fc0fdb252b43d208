//! `@block-debug` directive processing.
//!
//! The core never writes to a terminal. Directives routed to `comment`
//! are replaced in place with a comment node holding the referenced
//! block's debug listing; stream-bound directives are simply removed
//! (emission happens outside the core, at parse time).

use std::collections::HashSet;

use strata_ast::{Comment, Node, Span, Stylesheet};
use strata_model::syntax::{self, DebugChannel};
use strata_model::{BlockGraph, BlockId, ModelError};

use crate::config::CompilerOptions;
use crate::error::{self, CompileError};

pub(crate) fn process_debug_statements(
    graph: &BlockGraph,
    block_id: BlockId,
    mut root: Stylesheet,
    opts: &CompilerOptions,
) -> Result<Stylesheet, CompileError> {
    let nodes = std::mem::take(&mut root.nodes);
    let mut out = Vec::with_capacity(nodes.len());

    for node in nodes {
        let Node::AtRule(at) = node else {
            out.push(node);
            continue;
        };
        if at.name != syntax::BLOCK_DEBUG {
            out.push(Node::AtRule(at));
            continue;
        }

        let directive = syntax::parse_block_debug(&at.params).ok_or_else(|| {
            CompileError::Structural(ModelError::MalformedDirective {
                block: graph.block(block_id).name.clone(),
                directive: syntax::BLOCK_DEBUG.to_string(),
                reason: format!("expected `<ref> to <channel>`, got `{}`", at.params),
            })
        })?;
        let target = graph
            .resolve_reference(block_id, &directive.reference)
            .map_err(|err| error::from_model(err, at.span))?;

        match directive.channel {
            DebugChannel::Comment => {
                let listing = debug_listing(graph, target, opts, at.span)?;
                out.push(Node::Comment(Comment::new(listing.join("\n   "), at.span)));
            }
            DebugChannel::Stdout | DebugChannel::Stderr => {
                tracing::debug!(
                    reference = %directive.reference,
                    "removed stream-bound block-debug directive"
                );
            }
        }
    }

    root.nodes = out;
    Ok(root)
}

/// Debug listing for a block: its source label, then one
/// `internal => final` line per distinct rule selector.
fn debug_listing(
    graph: &BlockGraph,
    block_id: BlockId,
    opts: &CompilerOptions,
    span: Span,
) -> Result<Vec<String>, CompileError> {
    let block = graph.block(block_id);
    let mut lines = vec![format!(
        "Source: {}",
        opts.importer.debug_identifier(&block.identifier)
    )];

    let mut seen = HashSet::new();
    for rule in &block.rules {
        let parsed = block
            .parse_selectors(&rule.selector)
            .map_err(|err| error::from_model(err, span))?;
        for selector in &parsed {
            if !seen.insert(selector.key()) {
                continue;
            }
            let rewritten = graph
                .rewrite_selector(block_id, selector, opts.output_mode)
                .map_err(|err| error::from_model(err, span))?;
            lines.push(format!("{selector} => {rewritten}"));
        }
    }

    Ok(lines)
}
