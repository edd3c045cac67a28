//! Import Index: every name a file's import clauses bring into scope.
//!
//! For each `import` clause whose module exists in the [`Forest`]:
//!
//! - the module itself is available under its name (and under its `as`
//!   alias), kind [`NodeType::Module`];
//! - every exposed symbol is available qualified, as `Prefix.name`;
//! - `exposing (..)` adds every exposed symbol unqualified, plus every
//!   constructor the module exposes unqualified;
//! - `exposing (a, B, C(..))` adds the intersection of the list with the
//!   module's exposed surface. Constructors come along only for types listed
//!   with `(..)`; a bare `B` imports the type alone.
//!
//! Clauses naming unknown modules contribute nothing. Entries are keyed by
//! `(alias, kind)`; when two clauses produce the same key the later one wins.

use std::collections::HashMap;
use std::sync::Arc;

use tower_lsp::lsp_types::Url;
use tracing::debug;

use crate::{
    declarations::{self, NodeType},
    exposing::{self, ExposedKind, ExposedSurface, ExposedSymbol},
    forest::{Forest, ForestEntry},
    syntax::{kind, NodeId, NodeRef, SyntaxNode},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportEntry {
    pub alias: String,
    pub kind: NodeType,
    /// Declaration node inside the imported module's tree.
    pub node: NodeRef,
    pub source_uri: Url,
    pub module_name: String,
}

#[derive(Clone, Debug, Default)]
pub struct ImportIndex {
    entries: Vec<ImportEntry>,
    by_key: HashMap<(String, NodeType), usize>,
}

impl ImportIndex {
    pub fn build(forest: &Forest, entry: &ForestEntry) -> Self {
        let mut index = ImportIndex::default();
        for clause in declarations::import_clauses(&entry.tree) {
            index.add_clause(forest, clause);
        }
        debug!(uri = %entry.uri, entries = index.len(), "Import index built");
        index
    }

    fn add_clause(&mut self, forest: &Forest, clause: SyntaxNode<'_>) {
        let Some(module_name) = declarations::imported_module_name(clause) else {
            return;
        };
        let Some(target) = forest.find_by_module_name(module_name) else {
            debug!(module = module_name, "Imported module not in forest");
            return;
        };
        let Some(surface) = exposing::exposed_surface(&target.tree) else {
            return;
        };
        let Some(header) = declarations::module_declaration(&target.tree) else {
            return;
        };

        let import = Imported {
            target: &target,
            surface: &surface,
        };
        let prefix = declarations::import_alias(clause).unwrap_or(module_name);

        self.insert(import.entry(module_name.to_string(), NodeType::Module, header.id()));
        if prefix != module_name {
            self.insert(import.entry(prefix.to_string(), NodeType::Module, header.id()));
        }

        for symbol in &surface.exposed {
            self.insert(import.entry(
                format!("{prefix}.{}", symbol.name),
                symbol.kind.into(),
                symbol.node,
            ));
            for constructor in symbol.union_constructors.iter().flatten() {
                self.insert(import.entry(
                    format!("{prefix}.{}", constructor.name),
                    NodeType::UnionConstructor,
                    constructor.node,
                ));
            }
        }

        let Some(list) = clause.child_of_kind(kind::EXPOSING_LIST) else {
            return;
        };
        if list.child_of_kind(kind::DOUBLE_DOT).is_some() {
            for symbol in &surface.exposed {
                self.insert_unqualified(&import, symbol, true);
            }
            return;
        }

        for item in list.named_children() {
            let with_constructors = item
                .child_of_kind(kind::EXPOSED_UNION_CONSTRUCTORS)
                .is_some();
            let matched = match item.kind() {
                kind::EXPOSED_VALUE => surface.find(item.text(), ExposedKind::Function),
                kind::EXPOSED_OPERATOR => item
                    .child_of_kind(kind::OPERATOR_IDENTIFIER)
                    .and_then(|operator| surface.find(operator.text(), ExposedKind::Operator)),
                kind::EXPOSED_TYPE => item
                    .child_of_kind(kind::UPPER_CASE_IDENTIFIER)
                    .and_then(|name| {
                        surface
                            .find(name.text(), ExposedKind::Type)
                            .or_else(|| surface.find(name.text(), ExposedKind::TypeAlias))
                    }),
                _ => None,
            };
            match matched {
                Some(symbol) => self.insert_unqualified(&import, symbol, with_constructors),
                None => debug!(
                    module = module_name,
                    name = item.text(),
                    "Import names a symbol the module does not expose"
                ),
            }
        }
    }

    fn insert_unqualified(
        &mut self,
        import: &Imported<'_>,
        symbol: &ExposedSymbol,
        with_constructors: bool,
    ) {
        self.insert(import.entry(symbol.name.clone(), symbol.kind.into(), symbol.node));
        if !with_constructors {
            return;
        }
        for constructor in symbol
            .union_constructors
            .iter()
            .flatten()
            .filter(|constructor| constructor.accessible_without_prefix)
        {
            self.insert(import.entry(
                constructor.name.clone(),
                NodeType::UnionConstructor,
                constructor.node,
            ));
        }
    }

    fn insert(&mut self, entry: ImportEntry) {
        let key = (entry.alias.clone(), entry.kind);
        match self.by_key.get(&key) {
            Some(&position) => self.entries[position] = entry,
            None => {
                self.by_key.insert(key, self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    pub fn find(&self, alias: &str, kind: NodeType) -> Option<&ImportEntry> {
        self.by_key
            .get(&(alias.to_string(), kind))
            .map(|&position| &self.entries[position])
    }

    pub fn entries(&self) -> &[ImportEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImportEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

struct Imported<'a> {
    target: &'a Arc<ForestEntry>,
    surface: &'a ExposedSurface,
}

impl Imported<'_> {
    fn entry(&self, alias: String, kind: NodeType, node: NodeId) -> ImportEntry {
        ImportEntry {
            alias,
            kind,
            node: NodeRef::new(self.target.tree.clone(), node),
            source_uri: self.target.uri.clone(),
            module_name: self.surface.module_name.clone(),
        }
    }
}

/// Import index of the file stored under `uri`; empty if the file is unknown.
pub fn get_import_index(forest: &Forest, uri: &Url) -> ImportIndex {
    forest
        .get(uri)
        .map(|entry| ImportIndex::build(forest, &entry))
        .unwrap_or_default()
}
