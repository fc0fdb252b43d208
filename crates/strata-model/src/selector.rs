//! Block selector vocabulary.
//!
//! Decomposes internal selectors into the semantic parts the compiler
//! understands (root marker, sub-element classes, `[state|...]` states,
//! references to other blocks) and rewrites them to final flat CSS form.
//! Anything outside that vocabulary - pseudo-classes, foreign attribute
//! selectors - is carried opaquely and re-emitted verbatim.

use std::fmt;

use serde::Deserialize;

use crate::graph::{BlockGraph, BlockId};
use crate::ModelError;

/// Naming scheme for rewritten selectors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputMode {
    /// `.Block`, `.Block__element`, `.Block--state`, `.Block--state-value`
    #[default]
    Bem,
}

/// Which block a compound selector targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// The block the rule belongs to.
    Local,
    /// A referenced block, by its local reference name.
    Reference(String),
}

/// A `[state|name]` or `[state|name=value]` selector part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    pub name: String,
    pub value: Option<String>,
}

/// Combinator between two compounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
    NextSibling,
    SubsequentSibling,
}

impl Combinator {
    fn as_str(self) -> &'static str {
        match self {
            Combinator::Descendant => " ",
            Combinator::Child => " > ",
            Combinator::NextSibling => " + ",
            Combinator::SubsequentSibling => " ~ ",
        }
    }
}

/// One compound selector: a scope, an optional sub-element class, any
/// number of states, and an opaque tail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compound {
    pub scope: Scope,
    /// `None` targets the scope block's root.
    pub class: Option<String>,
    pub states: Vec<State>,
    /// Trailing text outside the block vocabulary (`:hover`, `::before`).
    pub opaque: String,
}

/// A full parsed selector: compounds joined by combinators. The first
/// compound carries no combinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSelector {
    pub compounds: Vec<(Option<Combinator>, Compound)>,
}

impl ParsedSelector {
    /// Canonical semantic key. Two rules target the same element exactly
    /// when their keys are equal, independent of source formatting.
    pub fn key(&self) -> String {
        let mut out = String::new();
        for (combinator, compound) in &self.compounds {
            if let Some(c) = combinator {
                out.push_str(c.as_str());
            }
            if let Scope::Reference(name) = &compound.scope {
                out.push_str(name);
                out.push('/');
            }
            out.push_str(compound.class.as_deref().unwrap_or("root"));
            for state in &compound.states {
                out.push('[');
                out.push_str(&state.name);
                if let Some(value) = &state.value {
                    out.push('=');
                    out.push_str(value);
                }
                out.push(']');
            }
            out.push_str(&compound.opaque);
        }
        out
    }
}

impl fmt::Display for ParsedSelector {
    /// Canonical internal (pre-rewrite) form, as debug listings print it.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (combinator, compound) in &self.compounds {
            if let Some(c) = combinator {
                f.write_str(c.as_str())?;
            }
            match &compound.scope {
                Scope::Local => {
                    if let Some(class) = &compound.class {
                        write!(f, ".{class}")?;
                    } else if compound.states.is_empty() {
                        f.write_str(".root")?;
                    }
                }
                Scope::Reference(name) => {
                    f.write_str(name)?;
                    if let Some(class) = &compound.class {
                        write!(f, ".{class}")?;
                    }
                }
            }
            for state in &compound.states {
                match &state.value {
                    Some(value) => write!(f, "[state|{}={}]", state.name, value)?,
                    None => write!(f, "[state|{}]", state.name)?,
                }
            }
            f.write_str(&compound.opaque)?;
        }
        Ok(())
    }
}

/// Parse a comma-separated selector list. `block` names the owning block
/// in diagnostics.
pub(crate) fn parse_selector_list(
    block: &str,
    input: &str,
) -> Result<Vec<ParsedSelector>, ModelError> {
    split_list(input)
        .into_iter()
        .map(|selector| parse_selector(block, selector))
        .collect()
}

fn parse_selector(block: &str, input: &str) -> Result<ParsedSelector, ModelError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(malformed(block, input, "empty selector"));
    }

    let mut compounds = Vec::new();
    let (token, mut rest) = take_compound(input);
    compounds.push((None, parse_compound(block, input, token)?));

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }
        let combinator = match rest.chars().next() {
            Some('>') => {
                rest = rest[1..].trim_start();
                Combinator::Child
            }
            Some('+') => {
                rest = rest[1..].trim_start();
                Combinator::NextSibling
            }
            Some('~') => {
                rest = rest[1..].trim_start();
                Combinator::SubsequentSibling
            }
            _ => Combinator::Descendant,
        };
        let (token, tail) = take_compound(rest);
        if token.is_empty() {
            return Err(malformed(block, input, "dangling combinator"));
        }
        compounds.push((Some(combinator), parse_compound(block, input, token)?));
        rest = tail;
    }

    Ok(ParsedSelector { compounds })
}

fn parse_compound(block: &str, selector: &str, token: &str) -> Result<Compound, ModelError> {
    let mut scope = Scope::Local;
    let mut class = None;
    let mut rest = token;

    if let Some(after_dot) = rest.strip_prefix('.') {
        let (ident, tail) = take_ident(after_dot);
        if ident.is_empty() {
            return Err(malformed(block, selector, "expected a class name after `.`"));
        }
        if ident != "root" {
            class = Some(ident.to_string());
        }
        rest = tail;
    } else if !rest.starts_with('[') && !rest.starts_with(':') {
        let (ident, tail) = take_ident(rest);
        if ident.is_empty() {
            return Err(malformed(block, selector, "unrecognized selector syntax"));
        }
        scope = Scope::Reference(ident.to_string());
        rest = tail;
        if let Some(after_dot) = rest.strip_prefix('.') {
            let (ident, tail) = take_ident(after_dot);
            if ident.is_empty() {
                return Err(malformed(block, selector, "expected a class name after `.`"));
            }
            if ident != "root" {
                class = Some(ident.to_string());
            }
            rest = tail;
        }
    }

    let mut states = Vec::new();
    while let Some((state, tail)) = take_state(block, selector, rest)? {
        states.push(state);
        rest = tail;
    }

    Ok(Compound {
        scope,
        class,
        states,
        opaque: rest.to_string(),
    })
}

/// Parse one leading `[state|...]` part, or `None` if `input` does not
/// begin with one (foreign attribute selectors fall through to the
/// opaque tail).
fn take_state<'a>(
    block: &str,
    selector: &str,
    input: &'a str,
) -> Result<Option<(State, &'a str)>, ModelError> {
    let Some(rest) = input.strip_prefix("[state|") else {
        return Ok(None);
    };
    let (name, rest) = take_ident(rest);
    if name.is_empty() {
        return Err(malformed(block, selector, "missing state name"));
    }
    if let Some(rest) = rest.strip_prefix(']') {
        return Ok(Some((
            State {
                name: name.to_string(),
                value: None,
            },
            rest,
        )));
    }
    let Some(rest) = rest.strip_prefix('=') else {
        return Err(malformed(block, selector, "expected `]` or `=` in state selector"));
    };

    let (value, rest) = match rest.chars().next() {
        Some(quote @ ('"' | '\'')) => {
            let inner = &rest[1..];
            let Some(end) = inner.find(quote) else {
                return Err(malformed(block, selector, "unterminated quoted state value"));
            };
            (&inner[..end], &inner[end + 1..])
        }
        _ => {
            let Some(end) = rest.find(']') else {
                return Err(malformed(block, selector, "unterminated state selector"));
            };
            (&rest[..end], &rest[end..])
        }
    };
    if value.is_empty() {
        return Err(malformed(block, selector, "empty state value"));
    }
    let Some(rest) = rest.strip_prefix(']') else {
        return Err(malformed(block, selector, "unterminated state selector"));
    };
    Ok(Some((
        State {
            name: name.to_string(),
            value: Some(value.to_string()),
        },
        rest,
    )))
}

/// Rewrite a parsed selector to its final flat CSS form. Pure function
/// of its inputs; the graph is only read.
pub(crate) fn rewrite(
    graph: &BlockGraph,
    block_id: BlockId,
    selector: &ParsedSelector,
    mode: OutputMode,
) -> Result<String, ModelError> {
    let block = graph.block(block_id);
    let mut out = String::new();

    for (combinator, compound) in &selector.compounds {
        if let Some(c) = combinator {
            out.push_str(c.as_str());
        }
        let name = match &compound.scope {
            Scope::Local => block.name.as_str(),
            Scope::Reference(reference) => {
                let id = block.references.get(reference).copied().ok_or_else(|| {
                    ModelError::UnknownReference {
                        block: block.name.clone(),
                        reference: reference.clone(),
                    }
                })?;
                graph.block(id).name.as_str()
            }
        };
        match mode {
            OutputMode::Bem => {
                let stem = match &compound.class {
                    Some(class) => format!("{name}__{class}"),
                    None => name.to_string(),
                };
                if compound.states.is_empty() {
                    out.push('.');
                    out.push_str(&stem);
                } else {
                    // Each state becomes its own class on the element.
                    for state in &compound.states {
                        out.push('.');
                        out.push_str(&stem);
                        out.push_str("--");
                        out.push_str(&state.name);
                        if let Some(value) = &state.value {
                            out.push('-');
                            out.push_str(value);
                        }
                    }
                }
            }
        }
        out.push_str(&compound.opaque);
    }

    Ok(out)
}

/// Split a selector list on top-level commas, respecting brackets and
/// quoted values.
fn split_list(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, ch) in input.char_indices() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

/// Take one compound selector off the front of `input`, stopping at a
/// top-level combinator or whitespace.
fn take_compound(input: &str) -> (&str, &str) {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (i, ch) in input.char_indices() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            c if depth == 0 && (c.is_whitespace() || c == '>' || c == '+' || c == '~') => {
                return (&input[..i], &input[i..]);
            }
            _ => {}
        }
    }
    (input, "")
}

fn take_ident(input: &str) -> (&str, &str) {
    let end = input
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        .map(|(i, _)| i)
        .unwrap_or(input.len());
    input.split_at(end)
}

fn malformed(block: &str, selector: &str, reason: &str) -> ModelError {
    ModelError::MalformedSelector {
        block: block.to_string(),
        selector: selector.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Block, BlockGraph};

    fn parse_one(input: &str) -> ParsedSelector {
        let mut list = parse_selector_list("Test", input).unwrap();
        assert_eq!(list.len(), 1);
        list.remove(0)
    }

    fn button_graph() -> (BlockGraph, BlockId) {
        let mut graph = BlockGraph::new();
        let icon = graph.insert(Block::new("blocks/icon.css", "Icon"));
        let mut button = Block::new("blocks/button.css", "Button");
        button.add_reference("icon", icon);
        let button = graph.insert(button);
        (graph, button)
    }

    #[test]
    fn test_parse_root() {
        let sel = parse_one(".root");
        assert_eq!(sel.compounds.len(), 1);
        let compound = &sel.compounds[0].1;
        assert_eq!(compound.scope, Scope::Local);
        assert_eq!(compound.class, None);
        assert!(compound.states.is_empty());
        assert_eq!(sel.key(), "root");
    }

    #[test]
    fn test_parse_state_only() {
        let sel = parse_one("[state|disabled]");
        let compound = &sel.compounds[0].1;
        assert_eq!(compound.class, None);
        assert_eq!(compound.states[0].name, "disabled");
        assert_eq!(sel.key(), "root[disabled]");
    }

    #[test]
    fn test_parse_state_with_value() {
        let sel = parse_one("[state|theme=red]");
        assert_eq!(sel.compounds[0].1.states[0].value.as_deref(), Some("red"));

        let quoted = parse_one("[state|theme=\"red\"]");
        assert_eq!(quoted, sel);
        assert_eq!(sel.key(), "root[theme=red]");
    }

    #[test]
    fn test_parse_class_with_state_and_pseudo() {
        let sel = parse_one(".icon[state|active]:hover");
        let compound = &sel.compounds[0].1;
        assert_eq!(compound.class.as_deref(), Some("icon"));
        assert_eq!(compound.states[0].name, "active");
        assert_eq!(compound.opaque, ":hover");
        assert_eq!(sel.key(), "icon[active]:hover");
    }

    #[test]
    fn test_parse_reference() {
        let sel = parse_one("icon.glyph");
        let compound = &sel.compounds[0].1;
        assert_eq!(compound.scope, Scope::Reference("icon".to_string()));
        assert_eq!(compound.class.as_deref(), Some("glyph"));
        assert_eq!(sel.key(), "icon/glyph");

        assert_eq!(parse_one("icon").key(), "icon/root");
        assert_eq!(parse_one("icon.root").key(), "icon/root");
    }

    #[test]
    fn test_parse_combinators() {
        let sel = parse_one(".root > .icon");
        assert_eq!(sel.compounds.len(), 2);
        assert_eq!(sel.compounds[1].0, Some(Combinator::Child));
        assert_eq!(sel.key(), "root > icon");

        assert_eq!(parse_one(".root .icon").key(), "root icon");
        assert_eq!(parse_one(".root+.icon").key(), "root + icon");
    }

    #[test]
    fn test_parse_list() {
        let list = parse_selector_list("Test", ".root, [state|open]").unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].key(), "root");
        assert_eq!(list[1].key(), "root[open]");
    }

    #[test]
    fn test_key_normalizes_formatting() {
        assert_eq!(parse_one(" .root  >  .icon ").key(), parse_one(".root>.icon").key());
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(
            parse_selector_list("Test", "#id"),
            Err(ModelError::MalformedSelector { .. })
        ));
        assert!(matches!(
            parse_selector_list("Test", "[state|]"),
            Err(ModelError::MalformedSelector { .. })
        ));
        assert!(matches!(
            parse_selector_list("Test", "[state|open"),
            Err(ModelError::MalformedSelector { .. })
        ));
        assert!(matches!(
            parse_selector_list("Test", ".root >"),
            Err(ModelError::MalformedSelector { .. })
        ));
    }

    #[test]
    fn test_rewrite_bem() {
        let (graph, button) = button_graph();
        let cases = [
            (".root", ".Button"),
            ("[state|disabled]", ".Button--disabled"),
            ("[state|theme=red]", ".Button--theme-red"),
            (".icon", ".Button__icon"),
            (".icon[state|active]", ".Button__icon--active"),
            ("[state|a][state|b]", ".Button--a.Button--b"),
            (".root:hover", ".Button:hover"),
            (".root > .icon", ".Button > .Button__icon"),
            ("icon.glyph", ".Icon__glyph"),
            ("icon", ".Icon"),
        ];
        for (input, expected) in cases {
            let sel = parse_one(input);
            let rewritten = graph
                .rewrite_selector(button, &sel, OutputMode::Bem)
                .unwrap();
            assert_eq!(rewritten, expected, "rewriting {input}");
        }
    }

    #[test]
    fn test_rewrite_is_stable() {
        let (graph, button) = button_graph();
        let sel = parse_one(".icon[state|active]");
        let first = graph.rewrite_selector(button, &sel, OutputMode::Bem).unwrap();
        let second = graph.rewrite_selector(button, &sel, OutputMode::Bem).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_rewrite_unknown_reference() {
        let (graph, button) = button_graph();
        let sel = parse_one("missing.glyph");
        assert!(matches!(
            graph.rewrite_selector(button, &sel, OutputMode::Bem),
            Err(ModelError::UnknownReference { .. })
        ));
    }
}
