//! Hover provider.
//!
//! The node under the cursor is resolved with the Definition Resolver and the
//! declaration it points at is rendered.
//!
//! | Target | Shows |
//! |--------|-------|
//! | Function parameter | `Local parameter` |
//! | Function, operator, port | its type annotation, else its left-hand side |
//! | Type, type alias, constructor | the declaration |
//! | Module | the module header |
//!
//! A `{-| ... -}` documentation comment attached to the declaration follows
//! the code block.
//!
//! # Configuration
//!
//! Hover can be disabled via [`Settings::hover`]:
//!
//! ```toml
//! hover = false
//! ```

use tower_lsp::lsp_types::{Hover, HoverContents, MarkupContent, MarkupKind, Position, Url};

use crate::{
    config::Settings,
    declarations::{self, NodeType},
    forest::Forest,
    gotodef,
    syntax::{kind, SyntaxNode},
};

pub fn hover(forest: &Forest, uri: &Url, position: Position, settings: &Settings) -> Option<Hover> {
    if !settings.hover {
        return None;
    }

    let resolved = gotodef::resolve_definition_at(forest, uri, position)?;
    let value = match resolved.node_type {
        NodeType::FunctionParameter => "Local parameter".to_string(),
        _ => hint(resolved.node.node())?,
    };

    Some(Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value,
        }),
        range: None,
    })
}

/// Markdown describing a declaration.
pub fn hint(declaration: SyntaxNode<'_>) -> Option<String> {
    let signature = match declaration.kind() {
        kind::VALUE_DECLARATION => match declarations::annotation_of(declaration) {
            Some(annotation) => annotation.text(),
            None => declaration
                .child_of_kind(kind::FUNCTION_DECLARATION_LEFT)?
                .text(),
        },
        kind::PORT_ANNOTATION
        | kind::TYPE_DECLARATION
        | kind::TYPE_ALIAS_DECLARATION
        | kind::UNION_VARIANT
        | kind::MODULE_DECLARATION => declaration.text(),
        _ => return None,
    };

    let mut value = format!("```elm\n{}\n```", signature.trim_end());
    if let Some(documentation) = doc_comment(declaration) {
        value.push_str("\n\n");
        value.push_str(&documentation);
    }
    Some(value)
}

/// Text of the `{-| -}` comment documenting a declaration. Module docs follow
/// the header; every other declaration's docs precede it (and its annotation).
fn doc_comment(declaration: SyntaxNode<'_>) -> Option<String> {
    let comment = if declaration.kind() == kind::MODULE_DECLARATION {
        declaration.next_named_sibling()?
    } else {
        let anchor = declarations::annotation_of(declaration)
            .filter(|annotation| annotation.end() <= declaration.start())
            .unwrap_or(declaration);
        anchor.prev_named_sibling()?
    };

    if comment.kind() != kind::BLOCK_COMMENT {
        return None;
    }
    let text = comment.text().strip_prefix("{-|")?;
    let text = text.strip_suffix("-}").unwrap_or(text);
    Some(text.trim().to_string())
}
