//! Declaration lookups over one file's tree.
//!
//! These are the primitive searches the resolvers are built from: find a
//! top-level function, operator, type, type alias or union constructor by
//! name, read a module's name, enumerate import clauses.

use crate::syntax::{kind, SyntaxNode, Tree};

/// What a resolved name refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeType {
    Function,
    FunctionParameter,
    TypeAlias,
    Type,
    Operator,
    Module,
    UnionConstructor,
}

/// Top-level declarations in source order. `ERROR` nodes directly under the
/// root are flattened one level so declarations recovered inside them count.
pub fn top_level(tree: &Tree) -> impl Iterator<Item = SyntaxNode<'_>> {
    tree.root().children().flat_map(|child| {
        let flattened: Vec<_> = if child.is_error() {
            child.named_children().collect()
        } else {
            vec![child]
        };
        flattened
    })
}

pub fn top_level_of_kind<'t>(tree: &'t Tree, kind: &'static str) -> impl Iterator<Item = SyntaxNode<'t>> {
    top_level(tree).filter(move |node| node.kind() == kind)
}

pub fn module_declaration(tree: &Tree) -> Option<SyntaxNode<'_>> {
    top_level_of_kind(tree, kind::MODULE_DECLARATION).next()
}

pub fn module_name(tree: &Tree) -> Option<String> {
    module_declaration(tree)?
        .child_of_kind(kind::UPPER_CASE_QID)
        .map(|name| name.text().to_string())
}

pub fn import_clauses(tree: &Tree) -> impl Iterator<Item = SyntaxNode<'_>> {
    top_level_of_kind(tree, kind::IMPORT_CLAUSE)
}

/// Module name of an import clause.
pub fn imported_module_name<'t>(import: SyntaxNode<'t>) -> Option<&'t str> {
    import.child_of_kind(kind::UPPER_CASE_QID).map(|name| name.text())
}

/// Name introduced by `import Foo as F`.
pub fn import_alias<'t>(import: SyntaxNode<'t>) -> Option<&'t str> {
    import
        .child_of_kind(kind::AS_CLAUSE)?
        .child_of_kind(kind::UPPER_CASE_IDENTIFIER)
        .map(|name| name.text())
}

/// Name node of a `value_declaration` or `port_annotation`.
pub fn function_name_node(declaration: SyntaxNode<'_>) -> Option<SyntaxNode<'_>> {
    match declaration.kind() {
        kind::VALUE_DECLARATION => declaration
            .child_of_kind(kind::FUNCTION_DECLARATION_LEFT)?
            .child_of_kind(kind::LOWER_CASE_IDENTIFIER),
        kind::PORT_ANNOTATION | kind::TYPE_ANNOTATION => {
            declaration.child_of_kind(kind::LOWER_CASE_IDENTIFIER)
        }
        _ => None,
    }
}

pub fn function_name(declaration: SyntaxNode<'_>) -> Option<&str> {
    function_name_node(declaration).map(|name| name.text())
}

/// Name of a type, type alias or union variant.
pub fn upper_name(declaration: SyntaxNode<'_>) -> Option<&str> {
    declaration
        .child_of_kind(kind::UPPER_CASE_IDENTIFIER)
        .map(|name| name.text())
}

/// Functions of a file in source order; ports count as functions.
pub fn functions(tree: &Tree) -> impl Iterator<Item = SyntaxNode<'_>> {
    top_level(tree).filter(|node| {
        (node.kind() == kind::VALUE_DECLARATION && function_name_node(*node).is_some())
            || node.kind() == kind::PORT_ANNOTATION
    })
}

pub fn find_function<'t>(tree: &'t Tree, name: &str) -> Option<SyntaxNode<'t>> {
    functions(tree).find(|declaration| function_name(*declaration) == Some(name))
}

/// Value declaration bound directly inside a `let` block.
pub fn find_let_function<'t>(let_block: SyntaxNode<'t>, name: &str) -> Option<SyntaxNode<'t>> {
    let_block
        .children_of_kind(kind::VALUE_DECLARATION)
        .find(|declaration| function_name(*declaration) == Some(name))
}

/// `infix left 5 (|=) = keeper` resolves `|=` to the `keeper` declaration.
pub fn find_operator<'t>(tree: &'t Tree, operator: &str) -> Option<SyntaxNode<'t>> {
    let infix = top_level_of_kind(tree, kind::INFIX_DECLARATION).find(|infix| {
        infix
            .child_of_kind(kind::OPERATOR_IDENTIFIER)
            .is_some_and(|symbol| symbol.text() == operator)
    })?;
    let target = infix.child_of_kind(kind::VALUE_EXPR)?;
    find_function(tree, target.text())
}

pub fn type_declarations(tree: &Tree) -> impl Iterator<Item = SyntaxNode<'_>> {
    top_level_of_kind(tree, kind::TYPE_DECLARATION)
}

pub fn type_alias_declarations(tree: &Tree) -> impl Iterator<Item = SyntaxNode<'_>> {
    top_level_of_kind(tree, kind::TYPE_ALIAS_DECLARATION)
}

pub fn find_type<'t>(tree: &'t Tree, name: &str) -> Option<SyntaxNode<'t>> {
    type_declarations(tree).find(|declaration| upper_name(*declaration) == Some(name))
}

pub fn find_type_alias<'t>(tree: &'t Tree, name: &str) -> Option<SyntaxNode<'t>> {
    type_alias_declarations(tree).find(|declaration| upper_name(*declaration) == Some(name))
}

pub fn union_variants<'t>(declaration: SyntaxNode<'t>) -> impl Iterator<Item = SyntaxNode<'t>> {
    declaration.children_of_kind(kind::UNION_VARIANT)
}

/// The `union_variant` node declaring a constructor.
pub fn find_union_constructor<'t>(tree: &'t Tree, name: &str) -> Option<SyntaxNode<'t>> {
    type_declarations(tree)
        .flat_map(union_variants)
        .find(|variant| upper_name(*variant) == Some(name))
}

/// Type annotation written for the named declaration among `siblings`.
pub fn find_annotation<'t>(
    mut siblings: impl Iterator<Item = SyntaxNode<'t>>,
    name: &str,
) -> Option<SyntaxNode<'t>> {
    siblings.find(|node| {
        node.kind() == kind::TYPE_ANNOTATION && function_name(*node) == Some(name)
    })
}

/// Annotation of a value declaration, searched among its own scope: the
/// enclosing `let` block or the file's top level.
pub fn annotation_of(declaration: SyntaxNode<'_>) -> Option<SyntaxNode<'_>> {
    let name = function_name(declaration)?;
    match declaration.parent() {
        Some(parent) if parent.kind() == kind::LET_IN_EXPR => {
            find_annotation(parent.children(), name)
        }
        _ => find_annotation(top_level(declaration.tree()), name),
    }
}

/// Top-level segments of a type expression: `A -> B -> C` yields `[A, B, C]`.
pub fn arrow_segments(type_expression: SyntaxNode<'_>) -> Vec<SyntaxNode<'_>> {
    type_expression
        .named_children()
        .filter(|node| {
            !matches!(
                node.kind(),
                kind::ARROW | kind::LINE_COMMENT | kind::BLOCK_COMMENT
            )
        })
        .collect()
}
