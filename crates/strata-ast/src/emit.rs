//! Plain-CSS emission.
//!
//! Printing the compiled tree back to text is the caller's concern; the
//! `Display` impl here exists so callers and tests have a canonical form.

use std::fmt;

use crate::node::{Node, Rule, Stylesheet};

impl fmt::Display for Stylesheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            match node {
                Node::Rule(rule) => write_rule(f, rule)?,
                Node::AtRule(at) => writeln!(f, "@{} {};", at.name, at.params)?,
                Node::Comment(comment) => writeln!(f, "/* {} */", comment.text)?,
            }
        }
        Ok(())
    }
}

fn write_rule(f: &mut fmt::Formatter<'_>, rule: &Rule) -> fmt::Result {
    writeln!(f, "{} {{", rule.selector)?;
    for decl in &rule.declarations {
        writeln!(f, "  {}: {};", decl.property, decl.value)?;
    }
    writeln!(f, "}}")
}

#[cfg(test)]
mod tests {
    use crate::{AtRule, Comment, Node, Rule, Span, Stylesheet};

    #[test]
    fn test_emit_rule_and_comment() {
        let mut sheet = Stylesheet::new();
        sheet.push(Node::Rule(
            Rule::new(".Button", Span::new(1, 1))
                .declare("color", "black", Span::new(1, 11))
                .declare("width", "10px", Span::new(2, 11)),
        ));
        sheet.push(Node::Comment(Comment::new("Source: button.css", Span::synthetic())));

        let css = sheet.to_string();
        assert_eq!(
            css,
            ".Button {\n  color: black;\n  width: 10px;\n}\n\n/* Source: button.css */\n"
        );
    }

    #[test]
    fn test_emit_at_rule() {
        let mut sheet = Stylesheet::new();
        sheet.push(Node::AtRule(AtRule::new(
            "block-debug",
            "self to comment",
            Span::new(1, 1),
        )));
        assert_eq!(sheet.to_string(), "@block-debug self to comment;\n");
    }

    #[test]
    fn test_emit_preserves_order() {
        let mut sheet = Stylesheet::new();
        sheet.push(Node::Rule(Rule::new(".b", Span::new(1, 1))));
        sheet.push(Node::Rule(Rule::new(".a", Span::new(2, 1))));
        let css = sheet.to_string();
        assert!(css.find(".b").unwrap() < css.find(".a").unwrap());
    }
}
