//! General conflict resolution on final selectors.
//!
//! Runs last in the pipeline: selectors are already flat, so two rules
//! compete when their selectors are equal or when a stated composition
//! puts both selectors on the same element. Winners are expressed as
//! ordering constraints and applied by a stable topological reorder, so
//! losing rules move earlier instead of disappearing.

use std::collections::{HashMap, HashSet};

use strata_ast::{Node, Span, Stylesheet};
use strata_model::syntax::{self, ResolutionKind};
use strata_model::{BlockGraph, BlockId, ModelError, OutputMode};

use crate::error::CompileError;

/// Why a conflict resolved the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    /// An author-declared `block-resolve` annotation decided the winner.
    ExplicitOverride,
    /// The nearer block in an inheritance chain wins.
    InheritancePrecedence,
    /// Later source position wins, mirroring the cascade.
    DeclarationOrder,
}

/// Two declarations or rules competed for the same effective selector
/// and property; `winner` is the one the compiled cascade must yield.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    /// Selector key (inheritance) or final selector(s) (general).
    pub target: String,
    pub property: String,
    /// Source position of the winning declaration or rule.
    pub winner: Span,
    pub reason: ConflictReason,
}

struct RuleInfo {
    selector: String,
    span: Span,
    /// Last declared value per property (later duplicates win in-rule).
    properties: HashMap<String, String>,
    annotations: HashMap<String, ResolutionKind>,
}

pub(crate) fn resolve_conflicts(
    graph: &BlockGraph,
    block_id: BlockId,
    mut root: Stylesheet,
    mode: OutputMode,
) -> Result<(Stylesheet, Vec<Conflict>), CompileError> {
    let infos = collect_rules(graph, block_id, &mut root)?;
    let groups = co_location_groups(graph, block_id, mode)?;

    let mut conflicts = Vec::new();
    let mut edges = Vec::new();
    let mut edge_set = HashSet::new();

    for i in 0..infos.len() {
        for j in (i + 1)..infos.len() {
            let (a, b) = (&infos[i], &infos[j]);
            let same_element = a.selector == b.selector
                || matches!(
                    (groups.get(&a.selector), groups.get(&b.selector)),
                    (Some(x), Some(y)) if x == y
                );
            if !same_element {
                continue;
            }
            for (property, value_a) in &a.properties {
                let Some(value_b) = b.properties.get(property) else {
                    continue;
                };
                if value_a == value_b {
                    // Identical outcome either way; nothing competes.
                    continue;
                }
                let (winner, loser, reason) = decide(i, j, a, b, property);
                conflicts.push(Conflict {
                    target: if a.selector == b.selector {
                        a.selector.clone()
                    } else {
                        format!("{} / {}", a.selector, b.selector)
                    },
                    property: property.clone(),
                    winner: infos[winner].span,
                    reason,
                });
                if edge_set.insert((loser, winner)) {
                    edges.push((loser, winner));
                }
            }
        }
    }

    if !conflicts.is_empty() {
        tracing::debug!(count = conflicts.len(), "resolved rule conflicts");
    }

    let order = stable_topological_order(infos.len(), &edges).map_err(|(a, b)| {
        CompileError::UnresolvableConflict {
            first_selector: infos[a].selector.clone(),
            first_span: infos[a].span,
            second_selector: infos[b].selector.clone(),
            second_span: infos[b].span,
        }
    })?;

    if order.iter().enumerate().any(|(place, &idx)| place != idx) {
        tracing::debug!("reordered rules to satisfy conflict constraints");
        apply_order(&mut root, &order);
    }

    Ok((root, conflicts))
}

/// Gather per-rule conflict inputs, stripping `block-resolve`
/// annotations from the tree as they are recorded.
fn collect_rules(
    graph: &BlockGraph,
    block_id: BlockId,
    root: &mut Stylesheet,
) -> Result<Vec<RuleInfo>, CompileError> {
    let mut infos = Vec::new();
    for rule in root.rules_mut() {
        let mut annotations = HashMap::new();
        let mut properties = HashMap::new();
        for decl in &rule.declarations {
            if decl.property == syntax::BLOCK_RESOLVE {
                let annotation = syntax::parse_block_resolve(&decl.value).ok_or_else(|| {
                    CompileError::Structural(ModelError::MalformedDirective {
                        block: graph.block(block_id).name.clone(),
                        directive: syntax::BLOCK_RESOLVE.to_string(),
                        reason: format!(
                            "expected `<property> override` or `<property> yield`, got `{}`",
                            decl.value
                        ),
                    })
                })?;
                annotations.insert(annotation.property, annotation.kind);
            } else {
                properties.insert(decl.property.clone(), decl.value.clone());
            }
        }
        rule.remove_declarations(syntax::BLOCK_RESOLVE);
        infos.push(RuleInfo {
            selector: rule.selector.clone(),
            span: rule.span,
            properties,
            annotations,
        });
    }
    Ok(infos)
}

/// Pick the winning rule for one property conflict between `a` (earlier
/// in source) and `b` (later). Explicit annotations outrank source
/// order; equal annotations fall back to it.
fn decide(
    i: usize,
    j: usize,
    a: &RuleInfo,
    b: &RuleInfo,
    property: &str,
) -> (usize, usize, ConflictReason) {
    use ResolutionKind::{Override, Yield};

    let ann_a = a.annotations.get(property).copied();
    let ann_b = b.annotations.get(property).copied();
    match (ann_a, ann_b) {
        (Some(Override), Some(Override)) | (Some(Yield), Some(Yield)) => {
            (j, i, ConflictReason::DeclarationOrder)
        }
        (Some(Override), _) => (i, j, ConflictReason::ExplicitOverride),
        (_, Some(Override)) => (j, i, ConflictReason::ExplicitOverride),
        (Some(Yield), None) => (j, i, ConflictReason::ExplicitOverride),
        (None, Some(Yield)) => (i, j, ConflictReason::ExplicitOverride),
        (None, None) => (j, i, ConflictReason::DeclarationOrder),
    }
}

/// Map each final selector that participates in a stated composition to
/// the element it lands on (keyed by that element's own final
/// selector). The closure covers the composed block's root and, through
/// a visited-set ancestry walk, its ancestors' roots, so a diamond
/// contributes each selector once.
fn co_location_groups(
    graph: &BlockGraph,
    block_id: BlockId,
    mode: OutputMode,
) -> Result<HashMap<String, String>, CompileError> {
    let block = graph.block(block_id);
    let mut groups: HashMap<String, String> = HashMap::new();

    for composition in &block.compositions {
        let parsed = block
            .parse_selectors(&composition.target)
            .map_err(CompileError::Structural)?;
        let Some(first) = parsed.first() else {
            continue;
        };
        let element = graph
            .rewrite_selector(block_id, first, mode)
            .map_err(CompileError::Structural)?;
        for selector in &parsed {
            let rewritten = graph
                .rewrite_selector(block_id, selector, mode)
                .map_err(CompileError::Structural)?;
            groups.entry(rewritten).or_insert_with(|| element.clone());
        }

        let composed = graph
            .resolve_reference(block_id, &composition.reference)
            .map_err(CompileError::Structural)?;
        let mut chain = vec![composed];
        chain.extend(graph.ancestry(composed).map_err(CompileError::Structural)?);
        let mut seen = HashSet::new();
        for id in chain {
            if !seen.insert(id) {
                continue;
            }
            let root_class = format!(".{}", graph.block(id).name);
            groups.entry(root_class).or_insert_with(|| element.clone());
        }
    }

    Ok(groups)
}

/// Order `0..n` so every `(loser, winner)` edge places the winner after
/// the loser, deviating from the original order as little as possible.
/// Returns the two rules of an unsatisfiable constraint on a cycle.
fn stable_topological_order(
    n: usize,
    edges: &[(usize, usize)],
) -> Result<Vec<usize>, (usize, usize)> {
    let mut successors = vec![Vec::new(); n];
    let mut pending_preds = vec![0usize; n];
    for &(loser, winner) in edges {
        successors[loser].push(winner);
        pending_preds[winner] += 1;
    }

    let mut order = Vec::with_capacity(n);
    let mut placed = vec![false; n];
    while order.len() < n {
        let next = (0..n).find(|&i| !placed[i] && pending_preds[i] == 0);
        let Some(next) = next else {
            for &(loser, winner) in edges {
                if !placed[loser] && !placed[winner] {
                    return Err((loser, winner));
                }
            }
            unreachable!("a stuck topological sort always has an unplaced constraint edge");
        };
        placed[next] = true;
        order.push(next);
        for &winner in &successors[next] {
            pending_preds[winner] -= 1;
        }
    }
    Ok(order)
}

/// Rearrange rule nodes into `order`, leaving every non-rule node in its
/// original slot.
fn apply_order(root: &mut Stylesheet, order: &[usize]) {
    let nodes = std::mem::take(&mut root.nodes);
    let mut skeleton = Vec::with_capacity(nodes.len());
    let mut rules = Vec::new();
    for node in nodes {
        if matches!(node, Node::Rule(_)) {
            rules.push(Some(node));
            skeleton.push(None);
        } else {
            skeleton.push(Some(node));
        }
    }

    let mut reordered = order.iter().filter_map(|&idx| rules[idx].take());
    let mut rebuilt = Vec::with_capacity(skeleton.len());
    for slot in skeleton {
        match slot {
            Some(node) => rebuilt.push(node),
            None => {
                if let Some(rule) = reordered.next() {
                    rebuilt.push(rule);
                }
            }
        }
    }
    root.nodes = rebuilt;
}
