//! Inheritance conflict resolution.
//!
//! A block's compiled CSS is emitted standalone; the build system
//! concatenates it after its ancestors' output (ancestor-before-
//! descendant is a documented precondition, not enforced here). This
//! resolver keeps those outputs from fighting: redeclarations that are
//! byte-identical to the nearest ancestor's are stripped as redundant,
//! differing ones stay put and win through concatenation order.

use std::collections::{HashMap, HashSet};

use strata_ast::Stylesheet;
use strata_model::{syntax, BlockGraph, BlockId};

use crate::conflict::{Conflict, ConflictReason};
use crate::error::{self, CompileError};

pub(crate) fn resolve_inheritance(
    graph: &BlockGraph,
    block_id: BlockId,
    mut root: Stylesheet,
) -> Result<(Stylesheet, Vec<Conflict>), CompileError> {
    let block = graph.block(block_id);
    if block.parent.is_none() {
        return Ok((root, Vec::new()));
    }

    // Nearest-first walk: the first value recorded per (selector key,
    // property) is the one the child actually shadows. The walk itself
    // is visited-set deduplicated, so a repeated ancestor contributes
    // nothing twice.
    let mut inherited: HashMap<(String, String), String> = HashMap::new();
    for ancestor_id in graph.ancestry(block_id)? {
        let ancestor = graph.block(ancestor_id);
        for rule in &ancestor.rules {
            let parsed = ancestor.parse_selectors(&rule.selector)?;
            for selector in &parsed {
                let key = selector.key();
                for decl in &rule.declarations {
                    inherited
                        .entry((key.clone(), decl.property.clone()))
                        .or_insert_with(|| decl.value.clone());
                }
            }
        }
    }
    if inherited.is_empty() {
        return Ok((root, Vec::new()));
    }

    let mut conflicts = Vec::new();
    let mut recorded = HashSet::new();
    let mut emptied = Vec::new();

    for (index, node) in root.nodes.iter_mut().enumerate() {
        let Some(rule) = node.as_rule_mut() else {
            continue;
        };
        let parsed = block
            .parse_selectors(&rule.selector)
            .map_err(|err| error::from_model(err, rule.span))?;
        let keys: Vec<String> = parsed.iter().map(|s| s.key()).collect();
        let target = keys.join(", ");

        // Properties the author explicitly annotated stay put; the
        // general resolver enforces the annotation later.
        let annotated: HashSet<String> = rule
            .declarations
            .iter()
            .filter(|decl| decl.property == syntax::BLOCK_RESOLVE)
            .filter_map(|decl| syntax::parse_block_resolve(&decl.value))
            .map(|annotation| annotation.property)
            .collect();

        let had_declarations = !rule.is_empty();
        rule.declarations.retain(|decl| {
            if decl.property == syntax::BLOCK_RESOLVE {
                return true;
            }
            let mut shared = false;
            let mut redundant_everywhere = !keys.is_empty();
            for key in &keys {
                match inherited.get(&(key.clone(), decl.property.clone())) {
                    Some(value) => {
                        shared = true;
                        if value != &decl.value {
                            redundant_everywhere = false;
                        }
                    }
                    None => redundant_everywhere = false,
                }
            }
            if !shared {
                return true;
            }
            if recorded.insert((target.clone(), decl.property.clone())) {
                conflicts.push(Conflict {
                    target: target.clone(),
                    property: decl.property.clone(),
                    winner: decl.span,
                    reason: ConflictReason::InheritancePrecedence,
                });
            }
            if annotated.contains(&decl.property) {
                return true;
            }
            !redundant_everywhere
        });
        if had_declarations && rule.is_empty() {
            emptied.push(index);
        }
    }

    for index in emptied.into_iter().rev() {
        root.nodes.remove(index);
    }
    if !conflicts.is_empty() {
        tracing::debug!(
            count = conflicts.len(),
            "resolved inheritance conflicts against ancestor output"
        );
    }

    Ok((root, conflicts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_ast::{Declaration, Node, Rule, Span};
    use strata_model::Block;

    fn child_of_parent(parent_rules: &[(&str, &[(&str, &str)])]) -> (BlockGraph, BlockId) {
        let mut graph = BlockGraph::new();
        let mut parent = Block::new("parent.css", "Parent");
        for (selector, decls) in parent_rules {
            parent.add_rule(selector, decls);
        }
        let parent = graph.insert(parent);
        let mut child = Block::new("child.css", "Child");
        child.parent = Some(parent);
        let child = graph.insert(child);
        (graph, child)
    }

    fn sheet(rules: &[(&str, &[(&str, &str)])]) -> Stylesheet {
        let mut sheet = Stylesheet::new();
        for (line, (selector, decls)) in rules.iter().enumerate() {
            let mut rule = Rule::new(*selector, Span::new(line as u32 + 1, 1));
            for (property, value) in decls.iter() {
                rule = rule.declare(*property, *value, Span::new(line as u32 + 1, 10));
            }
            sheet.push(Node::Rule(rule));
        }
        sheet
    }

    #[test]
    fn test_no_parent_is_identity() {
        let mut graph = BlockGraph::new();
        let lone = graph.insert(Block::new("lone.css", "Lone"));
        let input = sheet(&[(".root", &[("color", "red")])]);
        let (output, conflicts) = resolve_inheritance(&graph, lone, input.clone()).unwrap();
        assert_eq!(output, input);
        assert!(conflicts.is_empty());
    }

    #[test]
    fn test_identical_redeclaration_is_stripped() {
        let (graph, child) = child_of_parent(&[(".root", &[("color", "red")])]);
        let input = sheet(&[(".root", &[("color", "red"), ("width", "10px")])]);

        let (output, conflicts) = resolve_inheritance(&graph, child, input).unwrap();
        let rule = output.rules().next().unwrap();
        assert_eq!(rule.declarations.len(), 1);
        assert_eq!(rule.declarations[0].property, "width");
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].reason, ConflictReason::InheritancePrecedence);
    }

    #[test]
    fn test_differing_value_is_kept() {
        let (graph, child) = child_of_parent(&[(".root", &[("color", "red")])]);
        let input = sheet(&[(".root", &[("color", "blue")])]);

        let (output, conflicts) = resolve_inheritance(&graph, child, input).unwrap();
        let rule = output.rules().next().unwrap();
        assert_eq!(rule.declarations[0].value, "blue");
        assert_eq!(conflicts.len(), 1);
    }

    #[test]
    fn test_rule_emptied_by_strip_is_removed() {
        let (graph, child) = child_of_parent(&[("[state|open]", &[("display", "block")])]);
        let input = sheet(&[
            ("[state|open]", &[("display", "block")]),
            (".root", &[("color", "red")]),
        ]);

        let (output, _) = resolve_inheritance(&graph, child, input).unwrap();
        let selectors: Vec<_> = output.rules().map(|r| r.selector.as_str()).collect();
        assert_eq!(selectors, vec![".root"]);
    }

    #[test]
    fn test_nearest_ancestor_wins_and_records_once() {
        // Grandparent and parent both declare color; the child compares
        // against the parent's value only, and one conflict is recorded.
        let mut graph = BlockGraph::new();
        let mut grandparent = Block::new("grandparent.css", "Grandparent");
        grandparent.add_rule(".root", &[("color", "green")]);
        let grandparent = graph.insert(grandparent);
        let mut parent = Block::new("parent.css", "Parent");
        parent.add_rule(".root", &[("color", "red")]);
        parent.parent = Some(grandparent);
        let parent = graph.insert(parent);
        let mut child = Block::new("child.css", "Child");
        child.parent = Some(parent);
        let child = graph.insert(child);

        // Matches the grandparent's value, not the parent's: kept.
        let input = sheet(&[(".root", &[("color", "green")])]);
        let (output, conflicts) = resolve_inheritance(&graph, child, input).unwrap();
        assert_eq!(output.rules().next().unwrap().declarations.len(), 1);
        assert_eq!(conflicts.len(), 1);

        // Matches the parent's value: stripped.
        let input = sheet(&[(".root", &[("color", "red")])]);
        let (output, conflicts) = resolve_inheritance(&graph, child, input).unwrap();
        assert!(output.rules().next().is_none());
        assert_eq!(conflicts.len(), 1);
    }

    #[test]
    fn test_annotated_property_is_never_stripped() {
        let (graph, child) = child_of_parent(&[(".root", &[("color", "red")])]);
        let mut input = Stylesheet::new();
        let mut rule = Rule::new(".root", Span::new(1, 1))
            .declare("color", "red", Span::new(1, 10));
        rule.declarations.push(Declaration::new(
            "block-resolve",
            "color override",
            Span::new(2, 10),
        ));
        input.push(Node::Rule(rule));

        let (output, _) = resolve_inheritance(&graph, child, input).unwrap();
        let rule = output.rules().next().unwrap();
        assert!(rule.declarations.iter().any(|d| d.property == "color"));
    }

    #[test]
    fn test_unrelated_selector_untouched() {
        let (graph, child) = child_of_parent(&[(".root", &[("color", "red")])]);
        let input = sheet(&[(".icon", &[("color", "red")])]);

        let (output, conflicts) = resolve_inheritance(&graph, child, input).unwrap();
        assert_eq!(output.rules().next().unwrap().declarations.len(), 1);
        assert!(conflicts.is_empty());
    }
}
