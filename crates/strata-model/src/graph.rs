//! Block graph storage.
//!
//! Blocks live in an indexed arena; parent and reference relations are
//! ids into it, so ancestor walks are explicit visited-set loops with
//! precise cycle diagnostics instead of chasing live pointers.

use std::collections::{HashMap, HashSet};

use crate::selector::{self, OutputMode, ParsedSelector};
use crate::{syntax, ModelError};

/// Block identifier (index into the graph arena).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub(crate) u32);

/// Arena of blocks and their relations. Read-only during compilation, so
/// it may be shared across concurrent compilations of independent blocks.
#[derive(Debug, Default)]
pub struct BlockGraph {
    blocks: Vec<Block>,
}

/// A named scope of style rules; the unit of inheritance and composition.
#[derive(Debug, Clone)]
pub struct Block {
    /// Stable identifier used for cross-file referencing and debug labels.
    pub identifier: String,
    /// Name the output naming scheme builds final class names from.
    pub name: String,
    /// Inheritance parent. The relation must stay acyclic.
    pub parent: Option<BlockId>,
    /// Referenced blocks, keyed by their local reference names.
    pub references: HashMap<String, BlockId>,
    /// Stated composition relationships.
    pub compositions: Vec<Composition>,
    /// The block's rules in semantic form, for resolver comparison.
    pub rules: Vec<StyleRule>,
}

/// A referenced block applied to one of this block's elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composition {
    /// Local reference name of the composed block.
    pub reference: String,
    /// Internal selector of the element it is applied to (e.g. `.root`).
    pub target: String,
}

/// A rule in semantic form: internal selector plus declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRule {
    pub selector: String,
    pub declarations: Vec<StyleDeclaration>,
}

/// A property/value pair as the model records it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleDeclaration {
    pub property: String,
    pub value: String,
}

impl BlockGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, block: Block) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(block);
        id
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id.0 as usize)
    }

    /// Ids are only minted by `insert`, so direct lookup is infallible.
    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.0 as usize]
    }

    pub fn block_mut(&mut self, id: BlockId) -> &mut Block {
        &mut self.blocks[id.0 as usize]
    }

    /// Walk the parent chain nearest-first, excluding `id` itself.
    /// Fails fast with a structural error when the chain cycles.
    pub fn ancestry(&self, id: BlockId) -> Result<Vec<BlockId>, ModelError> {
        let mut visited = HashSet::from([id]);
        let mut chain = Vec::new();
        let mut current = self.block(id).parent;
        while let Some(ancestor) = current {
            if !visited.insert(ancestor) {
                return Err(ModelError::CyclicInheritance {
                    block: self.block(ancestor).identifier.clone(),
                });
            }
            chain.push(ancestor);
            current = self.block(ancestor).parent;
        }
        Ok(chain)
    }

    /// Check the acyclicity invariant for `id` before resolution runs.
    pub fn validate(&self, id: BlockId) -> Result<(), ModelError> {
        self.ancestry(id).map(|_| ())
    }

    /// Resolve a reference name from `block`'s table. `self` names the
    /// block itself.
    pub fn resolve_reference(&self, block: BlockId, name: &str) -> Result<BlockId, ModelError> {
        if name == syntax::SELF_REFERENCE {
            return Ok(block);
        }
        let owner = self.block(block);
        owner
            .references
            .get(name)
            .copied()
            .ok_or_else(|| ModelError::UnknownReference {
                block: owner.name.clone(),
                reference: name.to_string(),
            })
    }

    /// Deterministically map a semantic selector to its final flat CSS
    /// form under the given naming scheme. Pure: the graph is only read,
    /// and repeated calls yield identical strings.
    pub fn rewrite_selector(
        &self,
        block: BlockId,
        selector: &ParsedSelector,
        mode: OutputMode,
    ) -> Result<String, ModelError> {
        selector::rewrite(self, block, selector, mode)
    }
}

impl Block {
    pub fn new(identifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            name: name.into(),
            parent: None,
            references: HashMap::new(),
            compositions: Vec::new(),
            rules: Vec::new(),
        }
    }

    pub fn add_reference(&mut self, local_name: impl Into<String>, id: BlockId) {
        self.references.insert(local_name.into(), id);
    }

    /// State that the referenced block is applied to the element the
    /// `target` selector describes.
    pub fn compose(&mut self, reference: impl Into<String>, target: impl Into<String>) {
        self.compositions.push(Composition {
            reference: reference.into(),
            target: target.into(),
        });
    }

    pub fn add_rule(&mut self, selector: &str, declarations: &[(&str, &str)]) {
        self.rules.push(StyleRule {
            selector: selector.to_string(),
            declarations: declarations
                .iter()
                .map(|(property, value)| StyleDeclaration {
                    property: property.to_string(),
                    value: value.to_string(),
                })
                .collect(),
        });
    }

    /// Decompose a rule selector into the semantic parts the compiler
    /// understands, one entry per comma-separated member.
    pub fn parse_selectors(&self, selector: &str) -> Result<Vec<ParsedSelector>, ModelError> {
        selector::parse_selector_list(&self.name, selector)
    }
}
