//! Record field completion.
//!
//! The record being completed is read from the parse tree when the cursor is
//! on a field name:
//!
//! - `model.|` or `model.user.|`: the target of a `field_access_expr`;
//! - `{ model | f|`: a `record_expr` with a `record_base_identifier`;
//! - `{ outer | inner = { f|`: a `record_expr` that is the value of a `field`;
//! - `{ f|`: a `record_expr` on its own, fields of the enclosing
//!   declaration's result.
//!
//! Half-typed records rarely parse into those nodes, so when the tree gives
//! no answer the same shapes are recognised in the text between the start of
//! the enclosing top-level declaration and the cursor.
//!
//! The record's type comes from annotations: a parameter's type is the
//! matching segment of its function's annotation, a named value's type is
//! the result of its own annotation. A `type_ref` is resolved to its type
//! alias locally first, then through the import index.

use once_cell::sync::Lazy;
use regex::Regex;
use tower_lsp::lsp_types::Position;
use tracing::debug;

use crate::{
    declarations::{self, NodeType},
    scope,
    syntax::{kind, SyntaxNode, Tree},
};

use super::{util, CandidateKind, CandidateSymbol, Completer, Context};

static FIELD_ACCESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|[^\w.])([a-z]\w*(?:\.[a-z]\w*)*)\.(\w*)$").unwrap());

static ACCESS_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z]\w*(?:\.[a-z]\w*)*$").unwrap());

static UPDATE_BASE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*([a-z]\w*)\s*\|").unwrap());

static NESTED_FIELD: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-z]\w*)\s*=$").unwrap());

static FIELD_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z]\w*$").unwrap());

/// Type declarations and annotations hold record types, not record values.
static TYPE_LEVEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:type\s|(?:port\s+)?[a-z]\w*\s*:)").unwrap());

const MAX_ALIAS_DEPTH: usize = 64;

#[derive(Clone, Debug, PartialEq, Eq)]
enum RecordTarget {
    Value(String),
    Field {
        record: Box<RecordTarget>,
        field: String,
    },
    Literal,
}

impl RecordTarget {
    fn access_path(path: &str) -> Self {
        let mut segments = path.split('.');
        let base = RecordTarget::Value(segments.next().unwrap_or_default().to_string());
        segments.fold(base, |record, field| RecordTarget::Field {
            record: Box::new(record),
            field: field.to_string(),
        })
    }
}

pub struct RecordFieldCompleter<'a> {
    context: Context<'a>,
    position: Position,
    target: RecordTarget,
}

impl<'a> Completer<'a> for RecordFieldCompleter<'a> {
    fn construct(context: Context<'a>, position: Position) -> Option<Self> {
        let tree = context.tree();
        let target = match tree_target(util::node_at_cursor(tree, position)) {
            Some(target) => target,
            None => text_target(tree, position)?,
        };

        Some(RecordFieldCompleter {
            context,
            position,
            target,
        })
    }

    fn completions(&self) -> Vec<CandidateSymbol> {
        let Some(record) = self.record_type(&self.target) else {
            return Vec::new();
        };
        record
            .children_of_kind(kind::FIELD_TYPE)
            .filter_map(|field| {
                let name = field.child_of_kind(kind::LOWER_CASE_IDENTIFIER)?.text();
                let mut candidate = CandidateSymbol::new(name, CandidateKind::Field);
                if let Some(type_text) = field.child_of_kind(kind::TYPE_EXPRESSION) {
                    candidate = candidate.with_detail(type_text.text());
                }
                Some(candidate)
            })
            .collect()
    }
}

impl<'a> RecordFieldCompleter<'a> {
    /// The `record_type` node describing `target`.
    fn record_type(&self, target: &RecordTarget) -> Option<SyntaxNode<'a>> {
        match target {
            RecordTarget::Value(name) => self.record_of(self.type_of_value(name)?),
            RecordTarget::Field { record, field } => {
                let record = self.record_type(record)?;
                let field_type = record.children_of_kind(kind::FIELD_TYPE).find(|candidate| {
                    candidate
                        .child_of_kind(kind::LOWER_CASE_IDENTIFIER)
                        .is_some_and(|name| name.text() == field)
                })?;
                self.record_of(field_type.child_of_kind(kind::TYPE_EXPRESSION)?)
            }
            RecordTarget::Literal => {
                let declaration = self.enclosing_declaration()?;
                self.record_of(result_type(declaration)?)
            }
        }
    }

    fn type_of_value(&self, name: &str) -> Option<SyntaxNode<'a>> {
        let tree = self.context.tree();
        let cursor = util::node_at_cursor(tree, self.position);

        match scope::find_local_binding(cursor, name) {
            Some(binding) if binding.kind == NodeType::FunctionParameter => {
                parameter_type(binding.node)
            }
            Some(binding) => result_type(binding.node),
            None => result_type(declarations::find_function(tree, name)?),
        }
    }

    fn enclosing_declaration(&self) -> Option<SyntaxNode<'a>> {
        let tree = self.context.tree();
        util::node_at_cursor(tree, self.position)
            .ancestors()
            .find(|node| node.kind() == kind::VALUE_DECLARATION)
            .or_else(|| {
                declarations::top_level_of_kind(tree, kind::VALUE_DECLARATION)
                    .take_while(|node| node.start() <= self.position)
                    .last()
            })
    }

    /// Follows a type node down to a `record_type`. Aliases that refer back to
    /// an alias already followed yield nothing.
    fn record_of(&self, type_node: SyntaxNode<'a>) -> Option<SyntaxNode<'a>> {
        let mut node = type_node;
        let mut followed: Vec<SyntaxNode<'a>> = Vec::new();
        loop {
            node = match node.kind() {
                kind::RECORD_TYPE => return Some(node),
                kind::TYPE_EXPRESSION => node.first_named_child()?,
                kind::TYPE_REF => {
                    let name = node.child_of_kind(kind::UPPER_CASE_QID)?.text();
                    let alias = self.find_alias(node.tree(), name)?;
                    if followed.contains(&alias) || followed.len() >= MAX_ALIAS_DEPTH {
                        debug!(alias = name, "Alias cycle while resolving record type");
                        return None;
                    }
                    followed.push(alias);
                    alias.child_of_kind(kind::TYPE_EXPRESSION)?
                }
                _ => return None,
            };
        }
    }

    fn find_alias(&self, tree: &'a Tree, name: &str) -> Option<SyntaxNode<'a>> {
        if !name.contains('.') {
            if let Some(local) = declarations::find_type_alias(tree, name) {
                return Some(local);
            }
        }
        self.context
            .imports
            .find(name, NodeType::TypeAlias)
            .map(|entry| entry.node.node())
    }
}

/// Annotated type of the parameter bound by `pattern`.
fn parameter_type(pattern: SyntaxNode<'_>) -> Option<SyntaxNode<'_>> {
    let declaration = pattern
        .ancestors()
        .find(|node| node.kind() == kind::VALUE_DECLARATION)?;
    let left = declaration.child_of_kind(kind::FUNCTION_DECLARATION_LEFT)?;
    let index = left
        .named_children()
        .skip(1)
        .position(|parameter| parameter == pattern || pattern.ancestors().any(|a| a == parameter))?;
    let annotation = declarations::annotation_of(declaration)?;
    let segments = declarations::arrow_segments(annotation.child_of_kind(kind::TYPE_EXPRESSION)?);
    segments.get(index).copied()
}

/// Result segment of a declaration's annotation.
fn result_type(declaration: SyntaxNode<'_>) -> Option<SyntaxNode<'_>> {
    let annotation = declarations::annotation_of(declaration)?;
    declarations::arrow_segments(annotation.child_of_kind(kind::TYPE_EXPRESSION)?)
        .last()
        .copied()
}

/// Record target of the field name under the cursor, from the parse tree.
fn tree_target(cursor: SyntaxNode<'_>) -> Option<RecordTarget> {
    if cursor.kind() != kind::LOWER_CASE_IDENTIFIER {
        return None;
    }
    let parent = cursor.parent()?;
    match parent.kind() {
        kind::FIELD_ACCESS_EXPR if parent.last_named_child() == Some(cursor) => {
            let target = parent.first_named_child()?.text();
            ACCESS_PATH
                .is_match(target)
                .then(|| RecordTarget::access_path(target))
        }
        kind::FIELD if parent.first_named_child() == Some(cursor) => {
            record_expr_target(parent.parent()?)
        }
        _ => None,
    }
}

/// Walks out of nested `field = { ... }` values to the outermost record.
fn record_expr_target(record: SyntaxNode<'_>) -> Option<RecordTarget> {
    let mut record = record;
    let mut fields = Vec::new();
    let base = loop {
        if record.kind() != kind::RECORD_EXPR {
            return None;
        }
        if let Some(base) = record.child_of_kind(kind::RECORD_BASE_IDENTIFIER) {
            break RecordTarget::Value(base.text().to_string());
        }
        match record.parent() {
            Some(field) if field.kind() == kind::FIELD => {
                fields.push(field.first_named_child()?.text().to_string());
                record = field.parent()?;
            }
            _ => break RecordTarget::Literal,
        }
    };
    Some(
        fields
            .into_iter()
            .rev()
            .fold(base, |record, field| RecordTarget::Field {
                record: Box::new(record),
                field,
            }),
    )
}

/// Record target recognised in the text before the cursor.
fn text_target(tree: &Tree, position: Position) -> Option<RecordTarget> {
    let before = util::text_before_cursor(tree, position);
    if let Some(captures) = FIELD_ACCESS.captures(before) {
        return Some(RecordTarget::access_path(&captures[1]));
    }

    let region_start = declarations::top_level(tree)
        .take_while(|node| node.start() <= position)
        .last()
        .map_or(0, |node| node.byte_range().start);
    let region = tree
        .source()
        .get(region_start..tree.offset_at(position))
        .unwrap_or_default();
    if TYPE_LEVEL.is_match(region) {
        return None;
    }
    brace_target(region)
}

/// Classifies the innermost open `{` of `text`, which ends at the cursor.
fn brace_target(text: &str) -> Option<RecordTarget> {
    let open = unmatched_braces(text);
    let &innermost = open.last()?;
    let inner = &text[innermost + 1..];

    let segment = current_segment(inner);
    if segment.contains('=') {
        return None;
    }
    let segment = segment.trim();
    if !segment.is_empty() && !FIELD_PREFIX.is_match(segment) {
        return None;
    }

    if let Some(captures) = UPDATE_BASE.captures(inner) {
        return Some(RecordTarget::Value(captures[1].to_string()));
    }

    if open.len() > 1 {
        let before = text[..innermost].trim_end();
        let captures = NESTED_FIELD.captures(before)?;
        let field = captures.get(1)?;
        let record = brace_target(&text[..field.start()])?;
        return Some(RecordTarget::Field {
            record: Box::new(record),
            field: field.as_str().to_string(),
        });
    }

    Some(RecordTarget::Literal)
}

/// Byte offsets of `{` not closed before the end of `text`. Comments, strings
/// and character literals are skipped.
fn unmatched_braces(text: &str) -> Vec<usize> {
    let mut open = Vec::new();
    let mut chars = text.char_indices().peekable();
    let mut comment_depth = 0usize;
    let mut in_string = false;
    let mut in_line_comment = false;

    while let Some((index, c)) = chars.next() {
        let next = chars.peek().map(|&(_, next)| next);
        if in_line_comment {
            in_line_comment = c != '\n';
            continue;
        }
        if comment_depth > 0 {
            match (c, next) {
                ('{', Some('-')) => {
                    comment_depth += 1;
                    chars.next();
                }
                ('-', Some('}')) => {
                    comment_depth -= 1;
                    chars.next();
                }
                _ => {}
            }
            continue;
        }
        if in_string {
            match c {
                '\\' => {
                    chars.next();
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match (c, next) {
            ('{', Some('-')) => {
                comment_depth = 1;
                chars.next();
            }
            ('-', Some('-')) => in_line_comment = true,
            ('"', _) => in_string = true,
            ('\'', _) => {
                // 'x' or '\n'
                while let Some((_, inner)) = chars.next() {
                    match inner {
                        '\\' => {
                            chars.next();
                        }
                        '\'' => break,
                        _ => {}
                    }
                }
            }
            ('{', _) => open.push(index),
            ('}', _) => {
                open.pop();
            }
            _ => {}
        }
    }
    open
}

/// Text after the last top-level `,` or update `|` of a record body.
fn current_segment(inner: &str) -> &str {
    let bytes = inner.as_bytes();
    let mut depth = 0i32;
    let mut start = 0;
    for (index, &byte) in bytes.iter().enumerate() {
        match byte {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth -= 1,
            b',' if depth == 0 => start = index + 1,
            b'|' if depth == 0 => {
                let previous = index.checked_sub(1).map(|i| bytes[i]);
                let next = bytes.get(index + 1).copied();
                let operator = matches!(previous, Some(b'|' | b'<'))
                    || matches!(next, Some(b'|' | b'>' | b'=' | b'.'));
                if !operator {
                    start = index + 1;
                }
            }
            _ => {}
        }
    }
    &inner[start..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestWorkspace;

    fn tree_target_at(fixture: &str) -> Option<RecordTarget> {
        let workspace = TestWorkspace::new(fixture);
        let (uri, position) = workspace.caret();
        let entry = workspace.forest.get(&uri)?;
        tree_target(util::node_at_cursor(&entry.tree, position))
    }

    fn value(name: &str) -> RecordTarget {
        RecordTarget::Value(name.to_string())
    }

    #[test]
    fn tree_targets_follow_record_nodes() {
        assert_eq!(
            tree_target_at("module Main exposing (..)\n\nview model =\n    { model | u{-caret-}ser = model.user }\n"),
            Some(value("model"))
        );
        assert_eq!(
            tree_target_at("module Main exposing (..)\n\nview model =\n    { model | user = { n{-caret-}ame = \"\" } }\n"),
            Some(RecordTarget::Field {
                record: Box::new(value("model")),
                field: "user".to_string(),
            })
        );
        assert_eq!(
            tree_target_at("module Main exposing (..)\n\nview model =\n    model.user.{-caret-}name\n"),
            Some(RecordTarget::Field {
                record: Box::new(value("model")),
                field: "user".to_string(),
            })
        );
        assert_eq!(
            tree_target_at("module Main exposing (..)\n\ninit =\n    { c{-caret-}ount = 0 }\n"),
            Some(RecordTarget::Literal)
        );
    }

    #[test]
    fn field_values_are_not_tree_targets() {
        assert_eq!(
            tree_target_at("module Main exposing (..)\n\ninit =\n    { count = f{-caret-}oo }\n"),
            None
        );
        assert_eq!(
            tree_target_at("module Main exposing (..)\n\nview model =\n    m{-caret-}odel.user\n"),
            None
        );
    }

    #[test]
    fn classifies_update_nested_and_literal() {
        assert_eq!(
            brace_target("update msg model =\n    { model | p"),
            Some(RecordTarget::Value("model".to_string()))
        );
        assert_eq!(
            brace_target("update model =\n    { model | user = { na"),
            Some(RecordTarget::Field {
                record: Box::new(RecordTarget::Value("model".to_string())),
                field: "user".to_string(),
            })
        );
        assert_eq!(
            brace_target("init =\n    { count = 0, "),
            Some(RecordTarget::Literal)
        );
    }

    #[test]
    fn value_position_is_not_a_field() {
        assert_eq!(brace_target("init =\n    { count = 0"), None);
        assert_eq!(brace_target("view model =\n    text model.name"), None);
    }

    #[test]
    fn closed_records_comments_and_strings_are_skipped() {
        assert_eq!(
            unmatched_braces("{ a = { b = 1 }, c = \"{\" {- { -} , d"),
            vec![0]
        );
        assert!(unmatched_braces("x = '{' -- {\n").is_empty());
    }

    #[test]
    fn pipe_operators_do_not_split_fields() {
        assert_eq!(current_segment(" model | na"), " na");
        assert_eq!(current_segment(" a = x |> f"), " a = x |> f");
        assert_eq!(current_segment(" a = { b | c }, d"), " d");
    }

    #[test]
    fn access_path_builds_nested_targets() {
        assert_eq!(
            RecordTarget::access_path("model.user"),
            RecordTarget::Field {
                record: Box::new(RecordTarget::Value("model".to_string())),
                field: "user".to_string(),
            }
        );
    }
}
