use once_cell::sync::Lazy;
use regex::Regex;
use tower_lsp::lsp_types::Position;

use super::{util, CandidateSymbol, Completer, Context};

static QUALIFIED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[^\w.])((?:[A-Z]\w*\.)+)(\w*)$").unwrap());

/// `Json.Decode.|`: imported names carrying that prefix, sub-modules
/// included.
pub struct QualifiedCompleter<'a> {
    context: Context<'a>,
    qualifier: String,
}

impl<'a> Completer<'a> for QualifiedCompleter<'a> {
    fn construct(context: Context<'a>, position: Position) -> Option<Self> {
        let before = util::text_before_cursor(context.tree(), position);
        let captures = QUALIFIED.captures(before)?;
        Some(QualifiedCompleter {
            context,
            qualifier: captures.get(1)?.as_str().to_string(),
        })
    }

    fn completions(&self) -> Vec<CandidateSymbol> {
        self.context
            .imports
            .iter()
            .filter(|entry| entry.alias.starts_with(&self.qualifier))
            .map(|entry| {
                CandidateSymbol::new(entry.alias.clone(), entry.kind.into())
                    .from_module(&entry.module_name)
            })
            .collect()
    }
}
