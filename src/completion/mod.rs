//! Completion and auto-import.
//!
//! Completion runs a chain of [`Completer`]s; the first one whose context
//! matches the cursor produces the candidates.
//!
//! | Completer | Context |
//! |-----------|---------|
//! | [`ImportModuleCompleter`] | `import Mod|` |
//! | [`ImportExposingCompleter`] | `import Mod exposing (a, |` |
//! | [`ModuleExposingCompleter`] | `module Main exposing (|` |
//! | [`RecordFieldCompleter`] | `model.|`, `{ model | f|`, `{ f|` |
//! | [`QualifiedCompleter`] | `Json.Decode.|` |
//! | [`TypeAnnotationCompleter`] | `view : |` |
//! | [`TopLevelNameCompleter`] | a name typed at column 0 |
//! | [`ValueCompleter`] | any other expression position |
//!
//! A completion triggered by `.` that matches none of the dot contexts yields
//! nothing.

use tower_lsp::lsp_types::{
    CompletionContext, CompletionItem, CompletionItemKind, CompletionList, CompletionParams,
    CompletionResponse, CompletionTriggerKind, Position, TextEdit, Url,
};
use itertools::Itertools;
use tracing::debug;

use crate::{
    config::Settings,
    declarations::NodeType,
    exposing::ExposedKind,
    forest::{Forest, ForestEntry},
    imports::ImportIndex,
    syntax::Tree,
};

use self::{
    exposing_completer::ModuleExposingCompleter,
    import_completer::{ImportExposingCompleter, ImportModuleCompleter},
    qualified_completer::QualifiedCompleter,
    record_completer::RecordFieldCompleter,
    toplevel_completer::TopLevelNameCompleter,
    type_completer::TypeAnnotationCompleter,
    value_completer::ValueCompleter,
};

mod auto_import;
mod exposing_completer;
mod import_completer;
mod qualified_completer;
mod record_completer;
mod toplevel_completer;
mod type_completer;
mod util;
mod value_completer;

#[derive(Clone, Copy)]
pub struct Context<'a> {
    forest: &'a Forest,
    entry: &'a ForestEntry,
    imports: &'a ImportIndex,
    settings: &'a Settings,
    trigger: TriggerKind,
}

impl<'a> Context<'a> {
    fn tree(&self) -> &'a Tree {
        &self.entry.tree
    }
}

pub trait Completer<'a>: Sized {
    fn construct(context: Context<'a>, position: Position) -> Option<Self>;

    fn completions(&self) -> Vec<CandidateSymbol>;
}

/// How the completion request was started.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TriggerKind {
    #[default]
    Invoked,
    Character(char),
    Incomplete,
}

impl TriggerKind {
    pub fn from_context(context: Option<&CompletionContext>) -> Self {
        match context {
            Some(context) if context.trigger_kind == CompletionTriggerKind::TRIGGER_CHARACTER => {
                context
                    .trigger_character
                    .as_deref()
                    .and_then(|text| text.chars().next())
                    .map_or(TriggerKind::Invoked, TriggerKind::Character)
            }
            Some(context)
                if context.trigger_kind
                    == CompletionTriggerKind::TRIGGER_FOR_INCOMPLETE_COMPLETIONS =>
            {
                TriggerKind::Incomplete
            }
            _ => TriggerKind::Invoked,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CandidateKind {
    Function,
    FunctionParameter,
    Type,
    TypeAlias,
    UnionConstructor,
    Operator,
    Module,
    Field,
}

impl From<NodeType> for CandidateKind {
    fn from(node_type: NodeType) -> Self {
        match node_type {
            NodeType::Function => CandidateKind::Function,
            NodeType::FunctionParameter => CandidateKind::FunctionParameter,
            NodeType::TypeAlias => CandidateKind::TypeAlias,
            NodeType::Type => CandidateKind::Type,
            NodeType::Operator => CandidateKind::Operator,
            NodeType::Module => CandidateKind::Module,
            NodeType::UnionConstructor => CandidateKind::UnionConstructor,
        }
    }
}

impl From<ExposedKind> for CandidateKind {
    fn from(kind: ExposedKind) -> Self {
        NodeType::from(kind).into()
    }
}

/// One completion candidate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateSymbol {
    pub name: String,
    pub kind: CandidateKind,
    /// Module the symbol comes from, when it is not the current file.
    pub source_module: Option<String>,
    pub detail: Option<String>,
    /// Extra edits applied on accept (auto-import).
    pub insert_edits: Vec<TextEdit>,
}

impl CandidateSymbol {
    pub fn new(name: impl Into<String>, kind: CandidateKind) -> Self {
        CandidateSymbol {
            name: name.into(),
            kind,
            source_module: None,
            detail: None,
            insert_edits: Vec::new(),
        }
    }

    fn from_module(mut self, module_name: &str) -> Self {
        self.source_module = Some(module_name.to_string());
        self
    }

    fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    fn with_edit(mut self, edit: TextEdit) -> Self {
        self.insert_edits.push(edit);
        self
    }

    pub fn to_completion_item(&self) -> CompletionItem {
        let kind = match self.kind {
            CandidateKind::Function => CompletionItemKind::FUNCTION,
            CandidateKind::FunctionParameter => CompletionItemKind::VARIABLE,
            CandidateKind::Type => CompletionItemKind::ENUM,
            CandidateKind::TypeAlias => CompletionItemKind::STRUCT,
            CandidateKind::UnionConstructor => CompletionItemKind::ENUM_MEMBER,
            CandidateKind::Operator => CompletionItemKind::OPERATOR,
            CandidateKind::Module => CompletionItemKind::MODULE,
            CandidateKind::Field => CompletionItemKind::FIELD,
        };
        CompletionItem {
            label: self.name.clone(),
            kind: Some(kind),
            detail: self.detail.clone(),
            additional_text_edits: (!self.insert_edits.is_empty())
                .then(|| self.insert_edits.clone()),
            ..Default::default()
        }
    }
}

/// Candidates for the cursor at `position` in `uri`. Unknown files yield none.
pub fn get_completion_candidates(
    forest: &Forest,
    uri: &Url,
    position: Position,
    trigger: TriggerKind,
    settings: &Settings,
) -> Vec<CandidateSymbol> {
    let Some(entry) = forest.get(uri) else {
        return Vec::new();
    };
    let imports = ImportIndex::build(forest, &entry);
    let context = Context {
        forest,
        entry: &entry,
        imports: &imports,
        settings,
        trigger,
    };

    let candidates = run_completer::<ImportModuleCompleter>(context, position)
        .or_else(|| run_completer::<ImportExposingCompleter>(context, position))
        .or_else(|| run_completer::<ModuleExposingCompleter>(context, position))
        .or_else(|| run_completer::<RecordFieldCompleter>(context, position))
        .or_else(|| run_completer::<QualifiedCompleter>(context, position))
        .or_else(|| matches!(context.trigger, TriggerKind::Character('.')).then(Vec::new))
        .or_else(|| run_completer::<TypeAnnotationCompleter>(context, position))
        .or_else(|| run_completer::<TopLevelNameCompleter>(context, position))
        .or_else(|| run_completer::<ValueCompleter>(context, position))
        .unwrap_or_default();

    let candidates: Vec<_> = candidates
        .into_iter()
        .unique_by(|candidate| candidate.name.clone())
        .take(settings.completion_limit)
        .collect();
    debug!(uri = %uri, line = position.line, character = position.character, count = candidates.len(), "Completion candidates");
    candidates
}

fn run_completer<'a, T: Completer<'a>>(
    context: Context<'a>,
    position: Position,
) -> Option<Vec<CandidateSymbol>> {
    let completer = T::construct(context, position)?;
    Some(completer.completions())
}

pub fn get_completions(
    forest: &Forest,
    params: &CompletionParams,
    settings: &Settings,
) -> Option<CompletionResponse> {
    let uri = &params.text_document_position.text_document.uri;
    let position = params.text_document_position.position;
    let trigger = TriggerKind::from_context(params.context.as_ref());

    let items = get_completion_candidates(forest, uri, position, trigger, settings)
        .iter()
        .map(CandidateSymbol::to_completion_item)
        .collect::<Vec<_>>();

    Some(CompletionResponse::List(CompletionList {
        is_incomplete: true,
        items,
    }))
}
