use std::collections::HashSet;

use tracing::debug;

use crate::exposing::{self, ExposedKind};

use super::{util, CandidateKind, CandidateSymbol, Context};

/// Symbols other modules expose that are not visible yet, each with the
/// edit importing it. Constructors are imported through `Type(..)`.
pub fn auto_import_candidates(
    context: &Context<'_>,
    visible: &HashSet<&str>,
    accept: impl Fn(ExposedKind) -> bool,
    with_constructors: bool,
) -> Vec<CandidateSymbol> {
    let tree = context.tree();
    let mut candidates = Vec::new();

    for entry in context.forest.all_entries() {
        if entry.uri == context.entry.uri {
            continue;
        }
        let Some(surface) = exposing::exposed_surface(&entry.tree) else {
            continue;
        };
        let module_name = surface.module_name.as_str();
        let detail = format!("Auto import from module '{module_name}'");

        for symbol in surface.exposed.iter().filter(|symbol| accept(symbol.kind)) {
            if symbol.kind == ExposedKind::Operator {
                continue;
            }
            if !visible.contains(symbol.name.as_str()) {
                candidates.push(
                    CandidateSymbol::new(symbol.name.clone(), symbol.kind.into())
                        .from_module(module_name)
                        .with_detail(detail.clone())
                        .with_edit(util::import_edit(tree, module_name, &symbol.name)),
                );
            }

            if !with_constructors {
                continue;
            }
            let exposed_type = format!("{}(..)", symbol.name);
            for constructor in symbol
                .union_constructors
                .iter()
                .flatten()
                .filter(|constructor| constructor.accessible_without_prefix)
                .filter(|constructor| !visible.contains(constructor.name.as_str()))
            {
                candidates.push(
                    CandidateSymbol::new(constructor.name.clone(), CandidateKind::UnionConstructor)
                        .from_module(module_name)
                        .with_detail(detail.clone())
                        .with_edit(util::import_edit(tree, module_name, &exposed_type)),
                );
            }
        }
    }

    debug!(count = candidates.len(), "Auto import candidates");
    candidates
}
