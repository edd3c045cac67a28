use std::collections::HashSet;

use tower_lsp::lsp_types::Position;

use crate::{
    declarations::{self, NodeType},
    scope,
};

use super::{auto_import, util, CandidateKind, CandidateSymbol, Completer, Context};

/// Expression position: local bindings, the file's own declarations, imported
/// names and, when enabled, names other modules could provide.
pub struct ValueCompleter<'a> {
    context: Context<'a>,
    position: Position,
}

impl<'a> Completer<'a> for ValueCompleter<'a> {
    fn construct(context: Context<'a>, position: Position) -> Option<Self> {
        Some(ValueCompleter { context, position })
    }

    fn completions(&self) -> Vec<CandidateSymbol> {
        let tree = self.context.tree();
        let cursor = util::node_at_cursor(tree, self.position);

        let locals = scope::visible_bindings(cursor)
            .into_iter()
            .map(|binding| CandidateSymbol::new(binding.name, binding.kind.into()));

        let functions = declarations::functions(tree)
            .filter_map(declarations::function_name)
            .map(|name| CandidateSymbol::new(name, CandidateKind::Function));

        let constructors = declarations::type_declarations(tree)
            .flat_map(declarations::union_variants)
            .filter_map(declarations::upper_name)
            .map(|name| CandidateSymbol::new(name, CandidateKind::UnionConstructor));

        // Type aliases of records double as constructors.
        let aliases = declarations::type_alias_declarations(tree)
            .filter_map(declarations::upper_name)
            .map(|name| CandidateSymbol::new(name, CandidateKind::TypeAlias));

        let qualified = self.context.settings.qualified_completions;
        let imported = self
            .context
            .imports
            .iter()
            .filter(|entry| !matches!(entry.kind, NodeType::Type | NodeType::Operator))
            .filter(|entry| qualified || entry.kind == NodeType::Module || !entry.alias.contains('.'))
            .map(|entry| {
                CandidateSymbol::new(entry.alias.clone(), entry.kind.into())
                    .from_module(&entry.module_name)
            });

        let mut candidates: Vec<CandidateSymbol> = locals
            .chain(functions)
            .chain(constructors)
            .chain(aliases)
            .chain(imported)
            .collect();

        if self.context.settings.auto_import_completions {
            let visible: HashSet<&str> = candidates.iter().map(|c| c.name.as_str()).collect();
            let importable =
                auto_import::auto_import_candidates(&self.context, &visible, |_| true, true);
            candidates.extend(importable);
        }

        candidates
    }
}
