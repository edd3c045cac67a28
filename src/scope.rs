//! Local scopes: parameters, `let` bindings, `case` branch and lambda
//! variables visible at a node.
//!
//! Scopes are found by walking the parent chain outward from a node. The walk
//! is iterative and stops after [`MAX_SCOPE_DEPTH`] ancestors; the nearest
//! scope that binds a name wins.

use crate::{
    declarations::{self, NodeType},
    syntax::{kind, SyntaxNode},
};

pub const MAX_SCOPE_DEPTH: usize = 512;

/// A name bound by an enclosing scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocalBinding<'t> {
    pub name: &'t str,
    /// `lower_pattern` for pattern variables, `value_declaration` for `let`
    /// functions.
    pub node: SyntaxNode<'t>,
    pub kind: NodeType,
}

/// Nearest enclosing binding of `name`.
pub fn find_local_binding<'t>(node: SyntaxNode<'t>, name: &str) -> Option<LocalBinding<'t>> {
    enclosing_scopes(node)
        .flat_map(bindings_of_scope)
        .find(|binding| binding.name == name)
}

/// Nearest enclosing function parameter named `name`.
pub fn find_function_parameter_definition<'t>(
    node: SyntaxNode<'t>,
    name: &str,
) -> Option<SyntaxNode<'t>> {
    enclosing_scopes(node)
        .filter(|scope| scope.kind() == kind::VALUE_DECLARATION)
        .flat_map(bindings_of_scope)
        .find(|binding| binding.name == name)
        .map(|binding| binding.node)
}

/// Every binding visible at `node`, nearest scope first. Shadowed names are
/// kept; callers de-duplicate.
pub fn visible_bindings(node: SyntaxNode<'_>) -> Vec<LocalBinding<'_>> {
    enclosing_scopes(node).flat_map(bindings_of_scope).collect()
}

fn enclosing_scopes<'t>(node: SyntaxNode<'t>) -> impl Iterator<Item = SyntaxNode<'t>> {
    std::iter::once(node)
        .chain(node.ancestors())
        .take(MAX_SCOPE_DEPTH)
        .filter(|scope| {
            matches!(
                scope.kind(),
                kind::VALUE_DECLARATION
                    | kind::LET_IN_EXPR
                    | kind::CASE_OF_BRANCH
                    | kind::ANONYMOUS_FUNCTION_EXPR
            )
        })
}

fn bindings_of_scope(scope: SyntaxNode<'_>) -> Vec<LocalBinding<'_>> {
    match scope.kind() {
        kind::VALUE_DECLARATION => scope
            .child_of_kind(kind::FUNCTION_DECLARATION_LEFT)
            .map(pattern_variables)
            .unwrap_or_default(),
        kind::LET_IN_EXPR => scope
            .children_of_kind(kind::VALUE_DECLARATION)
            .flat_map(|declaration| {
                match declarations::function_name_node(declaration) {
                    Some(name) => vec![LocalBinding {
                        name: name.text(),
                        node: declaration,
                        kind: NodeType::Function,
                    }],
                    // Destructuring: `( a, b ) = pair`
                    None => declaration
                        .child_of_kind(kind::PATTERN)
                        .map(pattern_variables)
                        .unwrap_or_default(),
                }
            })
            .collect(),
        kind::CASE_OF_BRANCH => scope
            .first_named_child()
            .map(pattern_variables)
            .unwrap_or_default(),
        kind::ANONYMOUS_FUNCTION_EXPR => scope
            .children()
            .take_while(|child| child.kind() != kind::ARROW)
            .flat_map(|child| {
                if child.kind() == kind::LOWER_PATTERN {
                    vec![parameter(child)]
                } else {
                    pattern_variables(child)
                }
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn pattern_variables(pattern: SyntaxNode<'_>) -> Vec<LocalBinding<'_>> {
    pattern
        .descendants_of_kind(kind::LOWER_PATTERN)
        .map(parameter)
        .collect()
}

fn parameter(pattern: SyntaxNode<'_>) -> LocalBinding<'_> {
    LocalBinding {
        name: pattern.text(),
        node: pattern,
        kind: NodeType::FunctionParameter,
    }
}
