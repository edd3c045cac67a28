use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use tower_lsp::lsp_types::Position;

use crate::{
    declarations::{self, NodeType},
    exposing::ExposedKind,
};

use super::{auto_import, util, CandidateKind, CandidateSymbol, Completer, Context};

static TYPE_ANNOTATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:port\s+)?[a-z]\w*\s*:(?:[^:]|$)").unwrap());

/// `view : M|`: types and type aliases.
pub struct TypeAnnotationCompleter<'a> {
    context: Context<'a>,
}

impl<'a> Completer<'a> for TypeAnnotationCompleter<'a> {
    fn construct(context: Context<'a>, position: Position) -> Option<Self> {
        let before = util::text_before_cursor(context.tree(), position);
        TYPE_ANNOTATION
            .is_match(before)
            .then_some(TypeAnnotationCompleter { context })
    }

    fn completions(&self) -> Vec<CandidateSymbol> {
        let tree = self.context.tree();

        let mut candidates: Vec<CandidateSymbol> = declarations::type_declarations(tree)
            .filter_map(declarations::upper_name)
            .map(|name| CandidateSymbol::new(name, CandidateKind::Type))
            .chain(
                declarations::type_alias_declarations(tree)
                    .filter_map(declarations::upper_name)
                    .map(|name| CandidateSymbol::new(name, CandidateKind::TypeAlias)),
            )
            .collect();

        candidates.extend(
            self.context
                .imports
                .iter()
                .filter(|entry| matches!(entry.kind, NodeType::Type | NodeType::TypeAlias))
                .map(|entry| {
                    CandidateSymbol::new(entry.alias.clone(), entry.kind.into())
                        .from_module(&entry.module_name)
                }),
        );

        if self.context.settings.auto_import_completions {
            let visible: HashSet<&str> = candidates.iter().map(|c| c.name.as_str()).collect();
            let importable = auto_import::auto_import_candidates(
                &self.context,
                &visible,
                |kind| matches!(kind, ExposedKind::Type | ExposedKind::TypeAlias),
                false,
            );
            candidates.extend(importable);
        }

        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotation_pattern() {
        assert!(TYPE_ANNOTATION.is_match("view : "));
        assert!(TYPE_ANNOTATION.is_match("    helper : Int -> M"));
        assert!(TYPE_ANNOTATION.is_match("port send : S"));
        assert!(!TYPE_ANNOTATION.is_match("    x :: xs"));
        assert!(!TYPE_ANNOTATION.is_match("view model ="));
    }
}
