//! Syntax check of translated output.
//!
//! POSIX-family output is parsed with tree-sitter-bash; any `ERROR` or
//! missing node is reported. The text is also word-split with `shlex` as an
//! independent check of quote balance. Other dialects have no grammar here
//! and are not checked.

use serde::Serialize;
use tree_sitter::Parser;

use crate::dialect::DialectKind;

/// A problem found in emitted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

/// Check `text` as written for `dialect`.
pub fn check(text: &str, dialect: DialectKind) -> Vec<Issue> {
    if !dialect.is_posix_family() {
        return Vec::new();
    }
    let mut issues = tree_issues(text);
    // Here-document bodies are not shell words.
    if !text.contains("<<") && shlex::split(text).is_none() {
        issues.push(Issue {
            message: "text does not split into words (unbalanced quoting)".into(),
            offset: None,
        });
    }
    issues
}

fn tree_issues(text: &str) -> Vec<Issue> {
    let mut parser = Parser::new();
    if parser
        .set_language(&tree_sitter_bash::LANGUAGE.into())
        .is_err()
    {
        log::warn!("tree-sitter-bash grammar could not be loaded; skipping syntax check");
        return Vec::new();
    }
    let Some(tree) = parser.parse(text, None) else {
        return vec![Issue {
            message: "parser gave up".into(),
            offset: None,
        }];
    };
    if !tree.root_node().has_error() {
        return Vec::new();
    }

    let mut issues = Vec::new();
    let mut cursor = tree.walk();
    loop {
        let node = cursor.node();
        let reported = if node.is_missing() {
            issues.push(Issue {
                message: format!("missing `{}`", node.kind()),
                offset: Some(node.start_byte()),
            });
            true
        } else if node.is_error() {
            let snippet = node
                .utf8_text(text.as_bytes())
                .unwrap_or_default()
                .lines()
                .next()
                .unwrap_or_default();
            issues.push(Issue {
                message: format!("syntax error near `{snippet}`"),
                offset: Some(node.start_byte()),
            });
            true
        } else {
            false
        };
        if !reported && node.has_error() && cursor.goto_first_child() {
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                return issues;
            }
        }
    }
}
