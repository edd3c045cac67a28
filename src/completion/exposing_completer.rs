use once_cell::sync::Lazy;
use regex::Regex;
use tower_lsp::lsp_types::Position;

use crate::{declarations, syntax::kind};

use super::{util, CandidateKind, CandidateSymbol, Completer, Context};

static MODULE_EXPOSING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:port\s+)?module\s+[A-Z][\w.]*\s+exposing\s*\(([^)]*)$").unwrap()
});

/// The file's own `module X exposing (|`: everything it declares.
pub struct ModuleExposingCompleter<'a> {
    context: Context<'a>,
}

impl<'a> Completer<'a> for ModuleExposingCompleter<'a> {
    fn construct(context: Context<'a>, position: Position) -> Option<Self> {
        let tree = context.tree();
        let before = util::text_before_cursor(tree, position);
        // Multi-line lists are recognised from the tree instead of the line.
        let in_header_list = MODULE_EXPOSING.is_match(before)
            || util::node_at_cursor(tree, position)
                .ancestors()
                .any(|ancestor| {
                    ancestor.kind() == kind::EXPOSING_LIST
                        && ancestor
                            .parent()
                            .is_some_and(|parent| parent.kind() == kind::MODULE_DECLARATION)
                });
        in_header_list.then_some(ModuleExposingCompleter { context })
    }

    fn completions(&self) -> Vec<CandidateSymbol> {
        let tree = self.context.tree();

        let functions = declarations::functions(tree)
            .filter_map(declarations::function_name)
            .map(|name| CandidateSymbol::new(name, CandidateKind::Function));

        let types = declarations::type_declarations(tree).flat_map(|declaration| {
            let Some(name) = declarations::upper_name(declaration) else {
                return Vec::new();
            };
            let mut candidates = vec![
                CandidateSymbol::new(name, CandidateKind::Type),
                CandidateSymbol::new(format!("{name}(..)"), CandidateKind::Type),
            ];
            candidates.extend(
                declarations::union_variants(declaration)
                    .filter_map(declarations::upper_name)
                    .map(|variant| CandidateSymbol::new(variant, CandidateKind::UnionConstructor)),
            );
            candidates
        });

        let aliases = declarations::type_alias_declarations(tree)
            .filter_map(declarations::upper_name)
            .map(|name| CandidateSymbol::new(name, CandidateKind::TypeAlias));

        functions.chain(types).chain(aliases).collect()
    }
}
