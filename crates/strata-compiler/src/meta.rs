//! Meta-construct stripping.
//!
//! Block-reference at-rules and root-only meta properties are authoring
//! constructs, not valid CSS; they must be gone before selector
//! rewriting runs.

use strata_ast::Stylesheet;
use strata_model::syntax;

/// Strip block-meta constructs from the tree. A `.root` rule emptied by
/// the strip is removed entirely.
pub(crate) fn strip_meta(mut root: Stylesheet) -> Stylesheet {
    let removed = root.remove_at_rules(syntax::BLOCK_REFERENCE);
    if removed > 0 {
        tracing::trace!(count = removed, "stripped block-reference at-rules");
    }

    let mut emptied = Vec::new();
    for (index, node) in root.nodes.iter_mut().enumerate() {
        let Some(rule) = node.as_rule_mut() else {
            continue;
        };
        if rule.selector != syntax::ROOT_CLASS {
            continue;
        }
        let had_declarations = !rule.is_empty();
        rule.declarations
            .retain(|decl| !syntax::is_block_prop(&decl.property));
        if had_declarations && rule.is_empty() {
            emptied.push(index);
        }
    }
    for index in emptied.into_iter().rev() {
        root.nodes.remove(index);
    }

    root
}
