use once_cell::sync::Lazy;
use regex::Regex;
use tower_lsp::lsp_types::Position;

use crate::{declarations, syntax::kind};

use super::{util, CandidateKind, CandidateSymbol, Completer, Context};

static TOP_LEVEL_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([a-z]\w*)?$").unwrap());

/// A name typed at column 0: suggests the name of the annotation just above
/// or of the declaration just below.
pub struct TopLevelNameCompleter<'a> {
    context: Context<'a>,
    line: u32,
}

impl<'a> Completer<'a> for TopLevelNameCompleter<'a> {
    fn construct(context: Context<'a>, position: Position) -> Option<Self> {
        let before = util::text_before_cursor(context.tree(), position);
        TOP_LEVEL_NAME.is_match(before).then_some(TopLevelNameCompleter {
            context,
            line: position.line,
        })
    }

    fn completions(&self) -> Vec<CandidateSymbol> {
        let tree = self.context.tree();
        let above = self.line.checked_sub(1);

        declarations::top_level(tree)
            .filter(|node| match node.kind() {
                kind::TYPE_ANNOTATION => Some(node.end().line) == above,
                kind::VALUE_DECLARATION => node.start().line == self.line + 1,
                _ => false,
            })
            .filter_map(declarations::function_name)
            .map(|name| CandidateSymbol::new(name, CandidateKind::Function))
            .collect()
    }
}
