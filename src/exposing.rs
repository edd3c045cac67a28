//! Exposing Resolver: which symbols a module makes visible to importers.
//!
//! The surface is computed from the module declaration's exposing list:
//!
//! | Exposing list | Surface |
//! |---------------|---------|
//! | `(..)` | every top-level function, then type alias, then type, in source order; all constructors accessible unqualified |
//! | `(foo)` | the function `foo` |
//! | `((|=))` | the operator, declared by the function its `infix` names |
//! | `(Msg(..))` | the type with every constructor accessible unqualified |
//! | `(Msg(A, B))` | the type; only `A` and `B` accessible unqualified |
//! | `(Msg)` | the type `Msg` if one exists, else the type alias `Msg` |
//!
//! Entries that name nothing in the file are dropped.

use tower_lsp::lsp_types::Url;
use tracing::debug;

use crate::{
    declarations::{self, NodeType},
    forest::Forest,
    syntax::{kind, NodeId, SyntaxNode, Tree},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExposedKind {
    Function,
    Type,
    TypeAlias,
    Operator,
}

impl From<ExposedKind> for NodeType {
    fn from(kind: ExposedKind) -> Self {
        match kind {
            ExposedKind::Function => NodeType::Function,
            ExposedKind::Type => NodeType::Type,
            ExposedKind::TypeAlias => NodeType::TypeAlias,
            ExposedKind::Operator => NodeType::Operator,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExposedUnionConstructor {
    pub name: String,
    /// The `union_variant` node.
    pub node: NodeId,
    pub accessible_without_prefix: bool,
}

/// One exposed symbol. `node` is the declaration node inside the exposing
/// module's tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExposedSymbol {
    pub name: String,
    pub node: NodeId,
    pub kind: ExposedKind,
    /// Present only for types whose constructors are exposed in some form.
    pub union_constructors: Option<Vec<ExposedUnionConstructor>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExposedSurface {
    pub module_name: String,
    pub exposed: Vec<ExposedSymbol>,
}

impl ExposedSurface {
    pub fn find(&self, name: &str, kind: ExposedKind) -> Option<&ExposedSymbol> {
        self.exposed
            .iter()
            .find(|symbol| symbol.kind == kind && symbol.name == name)
    }

    /// Constructors importers may use without a module prefix.
    pub fn unqualified_constructors(&self) -> impl Iterator<Item = &ExposedUnionConstructor> {
        self.exposed
            .iter()
            .flat_map(|symbol| symbol.union_constructors.iter().flatten())
            .filter(|constructor| constructor.accessible_without_prefix)
    }
}

/// Surface of the module stored under `uri`.
pub fn get_exposed_surface(forest: &Forest, uri: &Url) -> Option<ExposedSurface> {
    let entry = forest.get(uri)?;
    exposed_surface(&entry.tree)
}

/// `None` when the tree has no module declaration or exposing list.
pub fn exposed_surface(tree: &Tree) -> Option<ExposedSurface> {
    let header = declarations::module_declaration(tree)?;
    let module_name = header.child_of_kind(kind::UPPER_CASE_QID)?.text().to_string();
    let list = header.child_of_kind(kind::EXPOSING_LIST)?;

    let exposed = if list.child_of_kind(kind::DOUBLE_DOT).is_some() {
        wildcard_surface(tree)
    } else {
        list.named_children()
            .filter_map(|entry| explicit_entry(tree, entry))
            .collect()
    };

    debug!(module = %module_name, exposed = exposed.len(), "Exposed surface computed");
    Some(ExposedSurface {
        module_name,
        exposed,
    })
}

fn wildcard_surface(tree: &Tree) -> Vec<ExposedSymbol> {
    let functions = declarations::functions(tree).filter_map(|declaration| {
        Some(ExposedSymbol {
            name: declarations::function_name(declaration)?.to_string(),
            node: declaration.id(),
            kind: ExposedKind::Function,
            union_constructors: None,
        })
    });

    let aliases = declarations::type_alias_declarations(tree).filter_map(|declaration| {
        Some(ExposedSymbol {
            name: declarations::upper_name(declaration)?.to_string(),
            node: declaration.id(),
            kind: ExposedKind::TypeAlias,
            union_constructors: None,
        })
    });

    let types = declarations::type_declarations(tree)
        .filter_map(|declaration| exposed_type(declaration, |_| true));

    functions.chain(aliases).chain(types).collect()
}

fn explicit_entry(tree: &Tree, entry: SyntaxNode<'_>) -> Option<ExposedSymbol> {
    match entry.kind() {
        kind::EXPOSED_OPERATOR => {
            let operator = entry.child_of_kind(kind::OPERATOR_IDENTIFIER)?.text();
            let declaration = declarations::find_operator(tree, operator)?;
            Some(ExposedSymbol {
                name: operator.to_string(),
                node: declaration.id(),
                kind: ExposedKind::Operator,
                union_constructors: None,
            })
        }
        kind::EXPOSED_VALUE => {
            let declaration = declarations::find_function(tree, entry.text())?;
            Some(ExposedSymbol {
                name: entry.text().to_string(),
                node: declaration.id(),
                kind: ExposedKind::Function,
                union_constructors: None,
            })
        }
        kind::EXPOSED_TYPE => {
            let name = entry.child_of_kind(kind::UPPER_CASE_IDENTIFIER)?.text();
            match entry.child_of_kind(kind::EXPOSED_UNION_CONSTRUCTORS) {
                Some(constructors) if constructors.child_of_kind(kind::DOUBLE_DOT).is_some() => {
                    exposed_type(declarations::find_type(tree, name)?, |_| true)
                }
                Some(constructors) => {
                    let listed: Vec<&str> = constructors
                        .descendants_of_kind(kind::UPPER_CASE_IDENTIFIER)
                        .map(|constructor| constructor.text())
                        .collect();
                    exposed_type(declarations::find_type(tree, name)?, |variant| {
                        listed.contains(&variant)
                    })
                }
                None => bare_upper_name(tree, name),
            }
        }
        _ => None,
    }
}

/// A bare `Name` is tried as a type, then as a type alias.
fn bare_upper_name(tree: &Tree, name: &str) -> Option<ExposedSymbol> {
    if let Some(declaration) = declarations::find_type(tree, name) {
        return Some(ExposedSymbol {
            name: name.to_string(),
            node: declaration.id(),
            kind: ExposedKind::Type,
            union_constructors: None,
        });
    }
    declarations::find_type_alias(tree, name).map(|declaration| ExposedSymbol {
        name: name.to_string(),
        node: declaration.id(),
        kind: ExposedKind::TypeAlias,
        union_constructors: None,
    })
}

fn exposed_type(
    declaration: SyntaxNode<'_>,
    accessible: impl Fn(&str) -> bool,
) -> Option<ExposedSymbol> {
    let constructors = declarations::union_variants(declaration)
        .filter_map(|variant| {
            let name = declarations::upper_name(variant)?;
            Some(ExposedUnionConstructor {
                name: name.to_string(),
                node: variant.id(),
                accessible_without_prefix: accessible(name),
            })
        })
        .collect();

    Some(ExposedSymbol {
        name: declarations::upper_name(declaration)?.to_string(),
        node: declaration.id(),
        kind: ExposedKind::Type,
        union_constructors: Some(constructors),
    })
}
