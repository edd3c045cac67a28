use rayon::prelude::*;
use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, Url};

use crate::{
    config::Settings,
    forest::Forest,
    syntax::{SyntaxNode, Tree},
};

const SOURCE: &str = "elmwood";

/// Longest excerpt of unexpected text quoted in a message.
const EXCERPT_LENGTH: usize = 40;

/// One diagnostic per outermost `ERROR` node and per `MISSING` node.
pub fn syntax_diagnostics(tree: &Tree) -> Vec<Diagnostic> {
    let root = tree.root();
    std::iter::once(root)
        .chain(root.descendants())
        .filter_map(|node| {
            let message = if node.is_missing() {
                format!("Missing \"{}\"", node.kind())
            } else if node.is_error() && !node.ancestors().any(|ancestor| ancestor.is_error()) {
                format!("Unexpected syntax: \"{}\"", excerpt(node))
            } else {
                return None;
            };
            Some(Diagnostic {
                range: node.range(),
                message,
                source: Some(SOURCE.into()),
                severity: Some(DiagnosticSeverity::ERROR),
                ..Default::default()
            })
        })
        .collect()
}

fn excerpt(node: SyntaxNode<'_>) -> String {
    let text = node.text().trim();
    match text.char_indices().nth(EXCERPT_LENGTH) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

pub fn diagnostics(forest: &Forest, uri: &Url, settings: &Settings) -> Option<Vec<Diagnostic>> {
    if !settings.syntax_diagnostics {
        return None;
    }
    let entry = forest.get(uri)?;
    Some(syntax_diagnostics(&entry.tree))
}

/// Diagnostics for every file of the forest, by uri.
pub fn workspace_diagnostics(forest: &Forest, settings: &Settings) -> Vec<(Url, Vec<Diagnostic>)> {
    if !settings.syntax_diagnostics {
        return Vec::new();
    }
    forest
        .all_entries()
        .into_par_iter()
        .map(|entry| (entry.uri.clone(), syntax_diagnostics(&entry.tree)))
        .collect()
}
