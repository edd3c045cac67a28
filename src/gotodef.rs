//! Definition Resolver.
//!
//! A reference node is first classified by its syntactic position into a
//! [`ReferenceContext`]; each context then tries a fixed sequence of lookups
//! and the first success wins.
//!
//! | Context | Lookups |
//! |---------|---------|
//! | module header name | the header itself |
//! | `import` module name | Import Index (`Module`) |
//! | qualifier segment (`Json` in `Json.Decode.int`) | Import Index (`Module`) |
//! | function declaration name | enclosing `let` block, then top level |
//! | own exposing list value, annotation name | top-level function |
//! | own exposing list type, name after `type`/`alias` | type, then type alias |
//! | import exposing list value | Import Index (`Function`) |
//! | import exposing list type | Import Index (`Type`, then `TypeAlias`) |
//! | union variant name | the variant itself |
//! | upper-case qualified name | local type, alias, constructor; then Import Index |
//! | lower-case value / pattern / record base | local scopes, top-level function, Import Index |
//! | operator | local `infix` declaration, then Import Index |

use std::sync::Arc;

use once_cell::unsync::OnceCell;
use tower_lsp::lsp_types::{Location, Position, Url};
use tracing::{debug, trace};

use crate::{
    declarations::{self, NodeType},
    forest::{Forest, ForestEntry},
    imports::ImportIndex,
    scope,
    syntax::{kind, NodeId, NodeRef, SyntaxNode},
};

/// Where a reference points.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedReference {
    pub node: NodeRef,
    pub uri: Url,
    pub node_type: NodeType,
}

/// Syntactic position of a reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReferenceContext {
    ModuleHeader { declaration: NodeId },
    ImportedModule { module_name: String },
    ModuleQualifier { qualifier: String },
    FunctionDeclarationName { name: String, let_block: Option<NodeId> },
    LocalFunctionName { name: String },
    LocalTypeName { name: String },
    ImportExposedValue { name: String },
    ImportExposedType { name: String },
    UnionVariant { variant: NodeId },
    UpperCaseQid { text: String },
    Value { name: String, qualified: String },
    Operator { symbol: String },
}

impl ReferenceContext {
    pub fn classify(node: SyntaxNode<'_>) -> Option<Self> {
        let node = match node.kind() {
            kind::VALUE_QID | kind::UPPER_CASE_QID => node.last_named_child()?,
            _ => node,
        };
        let parent = node.parent()?;
        let grandparent = parent.parent();
        let previous_keyword = parent.prev_named_sibling().map(|sibling| sibling.kind());
        let under = |owner_kind: &str| {
            grandparent
                .and_then(|list| list.parent())
                .is_some_and(|owner| owner.kind() == owner_kind)
        };

        let context = match parent.kind() {
            kind::UPPER_CASE_QID if previous_keyword == Some(kind::MODULE) => {
                ReferenceContext::ModuleHeader {
                    declaration: grandparent?.id(),
                }
            }
            kind::UPPER_CASE_QID if previous_keyword == Some(kind::IMPORT) => {
                ReferenceContext::ImportedModule {
                    module_name: parent.text().to_string(),
                }
            }
            kind::FUNCTION_DECLARATION_LEFT => ReferenceContext::FunctionDeclarationName {
                name: node.text().to_string(),
                let_block: grandparent
                    .and_then(|declaration| declaration.parent())
                    .filter(|scope| scope.kind() == kind::LET_IN_EXPR)
                    .map(|scope| scope.id()),
            },
            kind::EXPOSED_VALUE if under(kind::MODULE_DECLARATION) => {
                ReferenceContext::LocalFunctionName {
                    name: node.text().to_string(),
                }
            }
            kind::TYPE_ANNOTATION => ReferenceContext::LocalFunctionName {
                name: node.text().to_string(),
            },
            kind::EXPOSED_TYPE if under(kind::MODULE_DECLARATION) => {
                ReferenceContext::LocalTypeName {
                    name: node.text().to_string(),
                }
            }
            kind::TYPE_DECLARATION | kind::TYPE_ALIAS_DECLARATION
                if matches!(
                    node.prev_named_sibling().map(|sibling| sibling.kind()),
                    Some(kind::TYPE | kind::ALIAS)
                ) =>
            {
                ReferenceContext::LocalTypeName {
                    name: node.text().to_string(),
                }
            }
            kind::EXPOSED_VALUE if under(kind::IMPORT_CLAUSE) => {
                ReferenceContext::ImportExposedValue {
                    name: node.text().to_string(),
                }
            }
            kind::EXPOSED_TYPE if under(kind::IMPORT_CLAUSE) => {
                ReferenceContext::ImportExposedType {
                    name: node.text().to_string(),
                }
            }
            kind::UNION_VARIANT => ReferenceContext::UnionVariant {
                variant: parent.id(),
            },
            kind::UPPER_CASE_QID | kind::VALUE_QID if is_qualifier(node) => {
                ReferenceContext::ModuleQualifier {
                    qualifier: qualifier_up_to(parent, node),
                }
            }
            kind::UPPER_CASE_QID => ReferenceContext::UpperCaseQid {
                text: parent.text().to_string(),
            },
            kind::VALUE_QID | kind::LOWER_PATTERN | kind::RECORD_BASE_IDENTIFIER => {
                ReferenceContext::Value {
                    name: node.text().to_string(),
                    qualified: parent.text().to_string(),
                }
            }
            _ if node.kind() == kind::OPERATOR_IDENTIFIER => ReferenceContext::Operator {
                symbol: node.text().to_string(),
            },
            _ => return None,
        };
        trace!(node = ?node, context = ?context, "Reference classified");
        Some(context)
    }
}

/// A segment followed by a `.` inside a qualified name.
fn is_qualifier(segment: SyntaxNode<'_>) -> bool {
    segment.kind() == kind::UPPER_CASE_IDENTIFIER
        && segment
            .next_sibling()
            .is_some_and(|next| next.kind() == kind::DOT)
}

/// `Json.Decode` for the `Decode` segment of `Json.Decode.int`.
fn qualifier_up_to(qid: SyntaxNode<'_>, segment: SyntaxNode<'_>) -> String {
    let start = qid.byte_range().start;
    let end = segment.byte_range().end;
    qid.tree().source()[start..end].to_string()
}

struct Resolver<'f> {
    forest: &'f Forest,
    entry: Arc<ForestEntry>,
    imports: OnceCell<ImportIndex>,
}

impl<'f> Resolver<'f> {
    fn imports(&self) -> &ImportIndex {
        self.imports
            .get_or_init(|| ImportIndex::build(self.forest, &self.entry))
    }

    fn local(&self, node: SyntaxNode<'_>, node_type: NodeType) -> ResolvedReference {
        ResolvedReference {
            node: NodeRef::new(self.entry.tree.clone(), node.id()),
            uri: self.entry.uri.clone(),
            node_type,
        }
    }

    fn imported(&self, alias: &str, node_type: NodeType) -> Option<ResolvedReference> {
        self.imports()
            .find(alias, node_type)
            .map(|entry| ResolvedReference {
                node: entry.node.clone(),
                uri: entry.source_uri.clone(),
                node_type,
            })
    }

    fn local_type(&self, name: &str) -> Option<ResolvedReference> {
        let tree = &self.entry.tree;
        declarations::find_type(tree, name)
            .map(|node| self.local(node, NodeType::Type))
            .or_else(|| {
                declarations::find_type_alias(tree, name)
                    .map(|node| self.local(node, NodeType::TypeAlias))
            })
    }

    fn local_function(&self, name: &str) -> Option<ResolvedReference> {
        declarations::find_function(&self.entry.tree, name)
            .map(|node| self.local(node, NodeType::Function))
    }

    fn resolve(&self, node: SyntaxNode<'_>, context: ReferenceContext) -> Option<ResolvedReference> {
        let tree = &self.entry.tree;
        match context {
            ReferenceContext::ModuleHeader { declaration } => {
                Some(self.local(tree.node(declaration)?, NodeType::Module))
            }
            ReferenceContext::ImportedModule { module_name } => {
                self.imported(&module_name, NodeType::Module)
            }
            ReferenceContext::ModuleQualifier { qualifier } => {
                self.imported(&qualifier, NodeType::Module)
            }
            ReferenceContext::FunctionDeclarationName { name, let_block } => let_block
                .and_then(|id| tree.node(id))
                .and_then(|block| declarations::find_let_function(block, &name))
                .map(|node| self.local(node, NodeType::Function))
                .or_else(|| self.local_function(&name)),
            ReferenceContext::LocalFunctionName { name } => self.local_function(&name),
            ReferenceContext::LocalTypeName { name } => self.local_type(&name),
            ReferenceContext::ImportExposedValue { name } => {
                self.imported(&name, NodeType::Function)
            }
            ReferenceContext::ImportExposedType { name } => self
                .imported(&name, NodeType::Type)
                .or_else(|| self.imported(&name, NodeType::TypeAlias)),
            ReferenceContext::UnionVariant { variant } => {
                Some(self.local(tree.node(variant)?, NodeType::UnionConstructor))
            }
            ReferenceContext::UpperCaseQid { text } => self
                .local_type(&text)
                .or_else(|| {
                    declarations::find_union_constructor(tree, &text)
                        .map(|node| self.local(node, NodeType::UnionConstructor))
                })
                .or_else(|| self.imported(&text, NodeType::Type))
                .or_else(|| self.imported(&text, NodeType::TypeAlias))
                .or_else(|| self.imported(&text, NodeType::UnionConstructor)),
            ReferenceContext::Value { name, qualified } => {
                let local = (name == qualified)
                    .then(|| scope::find_local_binding(node, &name))
                    .flatten()
                    .map(|binding| self.local(binding.node, binding.kind));
                local
                    .or_else(|| self.local_function(&qualified))
                    .or_else(|| self.imported(&qualified, NodeType::Function))
            }
            ReferenceContext::Operator { symbol } => declarations::find_operator(tree, &symbol)
                .map(|node| self.local(node, NodeType::Operator))
                .or_else(|| self.imported(&symbol, NodeType::Operator)),
        }
    }
}

/// Resolves `node`, which must belong to the tree the Forest currently holds
/// for `uri`.
pub fn resolve_definition(
    forest: &Forest,
    uri: &Url,
    node: SyntaxNode<'_>,
) -> Option<ResolvedReference> {
    let entry = forest.get(uri)?;
    if !std::ptr::eq(node.tree(), Arc::as_ptr(&entry.tree)) {
        debug!(uri = %uri, "Reference node is not from the current tree");
        return None;
    }

    let context = ReferenceContext::classify(node)?;
    let resolver = Resolver {
        forest,
        entry: entry.clone(),
        imports: OnceCell::new(),
    };
    let resolved = resolver.resolve(node, context);
    debug!(
        uri = %uri,
        name = node.text(),
        found = ?resolved.as_ref().map(|reference| (reference.uri.as_str(), reference.node_type)),
        "Definition lookup"
    );
    resolved
}

/// Resolves the named node under `position`.
pub fn resolve_definition_at(
    forest: &Forest,
    uri: &Url,
    position: Position,
) -> Option<ResolvedReference> {
    let entry = forest.get(uri)?;
    let node = entry.tree.named_descendant_for_position(position);
    resolve_definition(forest, uri, node)
}

pub fn goto_definition(forest: &Forest, uri: &Url, position: Position) -> Option<Location> {
    let resolved = resolve_definition_at(forest, uri, position)?;
    let range = resolved.node.node().range();
    Some(Location {
        uri: resolved.uri,
        range,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestWorkspace;

    fn resolve(workspace: &TestWorkspace, file: &str, needle: &str, nth: usize) -> Option<ResolvedReference> {
        let position = workspace.locate(file, needle, nth);
        resolve_definition_at(&workspace.forest, &workspace.uri(file), position)
    }

    fn declared_at(reference: &ResolvedReference) -> Position {
        reference.node.node().start()
    }

    /// Test: the module name in the header resolves to the header.
    #[test]
    fn module_header_resolves_to_itself() {
        let workspace = TestWorkspace::new("module Main exposing (..)\n\nmain =\n    1\n");
        let reference = resolve(&workspace, "Main.elm", "Main", 0).expect("header");

        assert_eq!(reference.node_type, NodeType::Module);
        assert_eq!(reference.node.node().kind(), kind::MODULE_DECLARATION);
        assert_eq!(reference.uri, workspace.uri("Main.elm"));
    }

    /// Test: an import's module name resolves to the imported module header.
    #[test]
    fn import_module_name_resolves_across_files() {
        let workspace = TestWorkspace::new(
            r#"
--@ Page/Home.elm
module Page.Home exposing (view)

view =
    1
--@ Main.elm
module Main exposing (..)

import Page.Home

main =
    Page.Home.view
"#,
        );

        let imported = resolve(&workspace, "Main.elm", "Page.Home", 0).expect("import");
        assert_eq!(imported.node_type, NodeType::Module);
        assert_eq!(imported.uri, workspace.uri("Page/Home.elm"));

        let qualified = resolve(&workspace, "Main.elm", "view", 0).expect("qualified value");
        assert_eq!(qualified.node_type, NodeType::Function);
        assert_eq!(qualified.uri, workspace.uri("Page/Home.elm"));

        let qualifier = resolve(&workspace, "Main.elm", "Home.view", 0).expect("qualifier");
        assert_eq!(qualifier.node_type, NodeType::Module);
        assert_eq!(qualifier.node.node().kind(), kind::MODULE_DECLARATION);
    }

    /// Test: a constructor imported with `Msg(..)` resolves to its variant.
    #[test]
    fn imported_constructor_in_case_pattern() {
        let workspace = TestWorkspace::new(
            r#"
--@ A.elm
module A exposing (..)

type Msg
    = Msg1
    | Msg2
--@ B.elm
module B exposing (..)

import A exposing (Msg(..))

update : Msg -> Int
update msg =
    case msg of
        Msg1 ->
            1

        Msg2 ->
            2
"#,
        );

        let reference = resolve(&workspace, "B.elm", "Msg1", 0).expect("constructor");
        assert_eq!(reference.node_type, NodeType::UnionConstructor);
        assert_eq!(reference.uri, workspace.uri("A.elm"));
        assert_eq!(reference.node.node().kind(), kind::UNION_VARIANT);
        assert_eq!(declared_at(&reference), workspace.locate("A.elm", "Msg1", 0));

        let msg_type = resolve(&workspace, "B.elm", "Msg ->", 0).expect("type");
        assert_eq!(msg_type.node_type, NodeType::Type);
        assert_eq!(msg_type.node.node().kind(), kind::TYPE_DECLARATION);

        let exposed = resolve(&workspace, "B.elm", "Msg(..)", 0).expect("import list type");
        assert_eq!(exposed, msg_type);
    }

    /// Test: a parameter shadows an identically named top-level function.
    #[test]
    fn parameter_shadows_top_level() {
        let workspace = TestWorkspace::new(
            "module Main exposing (..)\n\nvalue =\n    1\n\ncompute value =\n    value + 1\n",
        );

        let reference = resolve(&workspace, "Main.elm", "value + 1", 0).expect("parameter");
        assert_eq!(reference.node_type, NodeType::FunctionParameter);
        assert_eq!(reference.node.node().kind(), kind::LOWER_PATTERN);
        assert_eq!(declared_at(&reference), workspace.locate("Main.elm", "value =", 1));
    }

    /// Test: a let binding wins over a top-level function of the same name.
    #[test]
    fn let_binding_shadows_top_level() {
        let workspace = TestWorkspace::new(
            r#"module Main exposing (..)

helper =
    0

main =
    let
        helper =
            42
    in
    helper
"#,
        );

        let reference = resolve(&workspace, "Main.elm", "helper", 2).expect("let binding");
        assert_eq!(reference.node_type, NodeType::Function);
        assert_eq!(declared_at(&reference), workspace.locate("Main.elm", "helper", 1));

        let let_name = resolve(&workspace, "Main.elm", "helper", 1).expect("let name");
        assert_eq!(let_name, reference);

        let top = resolve(&workspace, "Main.elm", "helper", 0).expect("top-level name");
        assert_eq!(declared_at(&top), Position::new(2, 0));
    }

    /// Test: a parameter resolves before an enclosing let binding of the same name.
    #[test]
    fn parameter_before_outer_let() {
        let workspace = TestWorkspace::new(
            r#"module Main exposing (..)

main =
    let
        x =
            1

        double x =
            x * 2
    in
    double x
"#,
        );

        let inner = resolve(&workspace, "Main.elm", "x * 2", 0).expect("inner x");
        assert_eq!(inner.node_type, NodeType::FunctionParameter);
        assert_eq!(declared_at(&inner), workspace.locate("Main.elm", "x =", 1));

        let outer = resolve(&workspace, "Main.elm", "x\n", 0).expect("outer x");
        assert_eq!(outer.node_type, NodeType::Function);
        assert_eq!(declared_at(&outer), workspace.locate("Main.elm", "x =", 0));
    }

    /// Test: annotations and the exposing list point at the declaration.
    #[test]
    fn annotation_and_exposing_list() {
        let workspace = TestWorkspace::new(
            r#"module Main exposing (view, Model)

type alias Model =
    { count : Int }

view : Model -> Int
view model =
    model.count
"#,
        );

        let from_list = resolve(&workspace, "Main.elm", "view", 0).expect("exposed value");
        let from_annotation = resolve(&workspace, "Main.elm", "view", 1).expect("annotation");
        assert_eq!(from_list, from_annotation);
        assert_eq!(from_list.node.node().kind(), kind::VALUE_DECLARATION);

        let alias = resolve(&workspace, "Main.elm", "Model", 0).expect("exposed alias");
        assert_eq!(alias.node_type, NodeType::TypeAlias);
        let alias_name = resolve(&workspace, "Main.elm", "Model", 1).expect("alias name");
        assert_eq!(alias, alias_name);
        let in_annotation = resolve(&workspace, "Main.elm", "Model", 2).expect("annotation type");
        assert_eq!(alias, in_annotation);
    }

    /// Test: when two imports expose the same name, the later one wins.
    #[test]
    fn later_import_wins() {
        let workspace = TestWorkspace::new(
            r#"
--@ Foo.elm
module Foo exposing (..)

bar =
    1
--@ Baz.elm
module Baz exposing (..)

bar =
    2
--@ Main.elm
module Main exposing (..)

import Foo exposing (bar)
import Baz exposing (bar)

main =
    bar
"#,
        );

        let reference = resolve(&workspace, "Main.elm", "bar\n", 0).expect("bar");
        assert_eq!(reference.uri, workspace.uri("Baz.elm"));
        assert_eq!(reference.node_type, NodeType::Function);
    }

    /// Test: an operator resolves through its infix declaration.
    #[test]
    fn operator_resolves_locally_and_through_imports() {
        let workspace = TestWorkspace::new(
            r#"
--@ Parser.elm
module Parser exposing ((|=), keeper)

infix left 5 (|=) = keeper

keeper a b =
    a
--@ Main.elm
module Main exposing (..)

import Parser exposing ((|=))

main =
    1 |= 2
"#,
        );

        let local = resolve(&workspace, "Parser.elm", "|=", 1).expect("local operator");
        assert_eq!(local.node_type, NodeType::Operator);
        assert_eq!(local.node.node().kind(), kind::VALUE_DECLARATION);

        let imported = resolve(&workspace, "Main.elm", "|=", 1).expect("imported operator");
        assert_eq!(imported, ResolvedReference { uri: workspace.uri("Parser.elm"), ..local });
    }

    /// Test: names that resolve nowhere yield nothing.
    #[test]
    fn unresolvable_names() {
        let workspace = TestWorkspace::new(
            "module Main exposing (..)\n\nimport Html exposing (div)\n\nmain =\n    div missing\n",
        );

        assert!(resolve(&workspace, "Main.elm", "missing", 0).is_none());
        assert!(resolve(&workspace, "Main.elm", "div", 1).is_none());
        assert!(resolve(&workspace, "Main.elm", "Html", 0).is_none());
    }

    /// Test: nodes from a replaced tree are refused.
    #[test]
    fn stale_nodes_are_refused() {
        let workspace = TestWorkspace::new("module Main exposing (..)\n\nmain =\n    1\n");
        let uri = workspace.uri("Main.elm");
        let stale = workspace.entry("Main.elm");

        workspace
            .forest
            .upsert_source(uri.clone(), "module Main exposing (..)\n\nmain =\n    2\n")
            .unwrap();

        let node = stale.tree.named_descendant_for_position(Position::new(0, 8));
        assert!(resolve_definition(&workspace.forest, &uri, node).is_none());
        assert!(resolve_definition_at(&workspace.forest, &uri, Position::new(0, 8)).is_some());
    }

    /// Test: goto_definition reports the declaration's location.
    #[test]
    fn goto_definition_location() {
        let workspace = TestWorkspace::new(
            "module Main exposing (..)\n\nanswer =\n    42\n\nmain =\n    answer\n",
        );
        let position = workspace.locate("Main.elm", "answer", 1);
        let location = goto_definition(&workspace.forest, &workspace.uri("Main.elm"), position)
            .expect("location");

        assert_eq!(location.uri, workspace.uri("Main.elm"));
        assert_eq!(location.range.start, Position::new(2, 0));
        assert_eq!(location.range.end, Position::new(3, 6));
    }

    /// Test: cursor and result columns count UTF-16 units on lines with
    /// multibyte text.
    #[test]
    fn multibyte_line_positions() {
        let workspace = TestWorkspace::new(
            "module Main exposing (..)\n\nanswer =\n    42\n\nmain =\n    ( \"日本\", answer )\n\nlabel =\n    \"é\" ++ main\n",
        );
        let uri = workspace.uri("Main.elm");

        let resolved = resolve_definition_at(&workspace.forest, &uri, Position::new(6, 12))
            .expect("answer resolves");
        assert_eq!(resolved.node.node().start(), Position::new(2, 0));

        let location = goto_definition(&workspace.forest, &uri, Position::new(9, 11))
            .expect("main resolves");
        assert_eq!(location.range.start, Position::new(5, 0));
        assert_eq!(workspace.locate("Main.elm", "main", 1), Position::new(9, 11));
    }
}
