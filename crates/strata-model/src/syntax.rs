//! Authoring-format vocabulary.
//!
//! Names of the meta at-rules and properties that are valid in block
//! source but not in plain CSS, plus parsers for their parameter forms.

/// Selector marking the block root.
pub const ROOT_CLASS: &str = ".root";

/// Attribute namespace used by state selectors: `[state|name]`.
pub const STATE_NAMESPACE: &str = "state";

/// `@block-reference <name> from "<path>"` - declares a composition edge.
pub const BLOCK_REFERENCE: &str = "block-reference";

/// `@block-debug <ref> to <channel>` - requests a debug listing.
pub const BLOCK_DEBUG: &str = "block-debug";

/// Per-property conflict annotation: `block-resolve: <property> <kind>;`.
pub const BLOCK_RESOLVE: &str = "block-resolve";

/// Reference name denoting the compiling block itself.
pub const SELF_REFERENCE: &str = "self";

/// Meta properties only valid inside the `.root` rule.
pub const BLOCK_PROP_NAMES: &[&str] = &["block-name", "extends", "implements"];

/// Whether `property` is a root-only meta property.
pub fn is_block_prop(property: &str) -> bool {
    BLOCK_PROP_NAMES.contains(&property)
}

/// Destination of a `@block-debug` directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugChannel {
    Comment,
    Stdout,
    Stderr,
}

/// Parsed `@block-debug` parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugDirective {
    pub reference: String,
    pub channel: DebugChannel,
}

/// Parse `<ref> to <channel>` from a `@block-debug` at-rule. Returns
/// `None` when the parameter text does not match that shape.
pub fn parse_block_debug(params: &str) -> Option<DebugDirective> {
    let mut words = params.split_whitespace();
    let reference = words.next()?;
    if words.next()? != "to" {
        return None;
    }
    let channel = match words.next()? {
        "comment" => DebugChannel::Comment,
        "stdout" => DebugChannel::Stdout,
        "stderr" => DebugChannel::Stderr,
        _ => return None,
    };
    if words.next().is_some() {
        return None;
    }
    Some(DebugDirective {
        reference: reference.to_string(),
        channel,
    })
}

/// How an annotated property resolves against competing rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionKind {
    /// This rule's declaration wins the conflict.
    Override,
    /// This rule's declaration loses the conflict.
    Yield,
}

/// Parsed `block-resolve` declaration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveAnnotation {
    pub property: String,
    pub kind: ResolutionKind,
}

/// Parse `<property> override` / `<property> yield` from a
/// `block-resolve` declaration value.
pub fn parse_block_resolve(value: &str) -> Option<ResolveAnnotation> {
    let mut words = value.split_whitespace();
    let property = words.next()?;
    let kind = match words.next()? {
        "override" => ResolutionKind::Override,
        "yield" => ResolutionKind::Yield,
        _ => return None,
    };
    if words.next().is_some() {
        return None;
    }
    Some(ResolveAnnotation {
        property: property.to_string(),
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_block_debug() {
        let directive = parse_block_debug("nav to comment").unwrap();
        assert_eq!(directive.reference, "nav");
        assert_eq!(directive.channel, DebugChannel::Comment);

        assert_eq!(
            parse_block_debug("self to stderr").unwrap().channel,
            DebugChannel::Stderr
        );
        assert!(parse_block_debug("nav comment").is_none());
        assert!(parse_block_debug("nav to console").is_none());
        assert!(parse_block_debug("nav to comment extra").is_none());
        assert!(parse_block_debug("").is_none());
    }

    #[test]
    fn test_parse_block_resolve() {
        let ann = parse_block_resolve("color override").unwrap();
        assert_eq!(ann.property, "color");
        assert_eq!(ann.kind, ResolutionKind::Override);

        assert_eq!(
            parse_block_resolve("background yield").unwrap().kind,
            ResolutionKind::Yield
        );
        assert!(parse_block_resolve("color").is_none());
        assert!(parse_block_resolve("color wins").is_none());
    }

    #[test]
    fn test_is_block_prop() {
        assert!(is_block_prop("block-name"));
        assert!(is_block_prop("extends"));
        assert!(is_block_prop("implements"));
        assert!(!is_block_prop("color"));
    }
}
