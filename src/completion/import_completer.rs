use once_cell::sync::Lazy;
use regex::Regex;
use tower_lsp::lsp_types::Position;

use crate::exposing;

use super::{util, CandidateKind, CandidateSymbol, Completer, Context};

static IMPORT_MODULE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^import\s+([A-Z][\w.]*)?$").unwrap());

static IMPORT_EXPOSING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^import\s+([A-Z][\w.]*)(?:\s+as\s+[A-Z]\w*)?\s+exposing\s*\(([^)]*)$").unwrap()
});

/// `import Js|`: every module name known to the forest.
pub struct ImportModuleCompleter<'a> {
    context: Context<'a>,
}

impl<'a> Completer<'a> for ImportModuleCompleter<'a> {
    fn construct(context: Context<'a>, position: Position) -> Option<Self> {
        let before = util::text_before_cursor(context.tree(), position);
        IMPORT_MODULE.is_match(before).then_some(ImportModuleCompleter { context })
    }

    fn completions(&self) -> Vec<CandidateSymbol> {
        self.context
            .forest
            .module_names()
            .into_iter()
            .map(|name| CandidateSymbol::new(name, CandidateKind::Module))
            .collect()
    }
}

/// `import Json.Decode exposing (f|`: the imported module's exposed surface.
pub struct ImportExposingCompleter<'a> {
    context: Context<'a>,
    module_name: String,
}

impl<'a> Completer<'a> for ImportExposingCompleter<'a> {
    fn construct(context: Context<'a>, position: Position) -> Option<Self> {
        let before = util::text_before_cursor(context.tree(), position);
        let captures = IMPORT_EXPOSING.captures(before)?;
        Some(ImportExposingCompleter {
            context,
            module_name: captures.get(1)?.as_str().to_string(),
        })
    }

    fn completions(&self) -> Vec<CandidateSymbol> {
        let Some(target) = self.context.forest.find_by_module_name(&self.module_name) else {
            return Vec::new();
        };
        let Some(surface) = exposing::exposed_surface(&target.tree) else {
            return Vec::new();
        };

        surface
            .exposed
            .iter()
            .flat_map(|symbol| {
                let plain = CandidateSymbol::new(symbol.name.clone(), symbol.kind.into())
                    .from_module(&surface.module_name);
                let with_constructors = symbol
                    .union_constructors
                    .as_ref()
                    .filter(|constructors| !constructors.is_empty())
                    .map(|_| {
                        CandidateSymbol::new(format!("{}(..)", symbol.name), symbol.kind.into())
                            .from_module(&surface.module_name)
                    });
                std::iter::once(plain).chain(with_constructors)
            })
            .collect()
    }
}
