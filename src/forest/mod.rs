//! The Forest: one parsed tree per file.
//!
//! Every query starts here. An entry pairs a document URI with its current
//! tree and the module name declared by that tree. Entries are immutable and
//! shared through [`Arc`]; replacing a file swaps the whole entry in one map
//! insert, so a reader either sees the old entry or the new one.
//!
//! # Operations
//!
//! | Operation | Purpose |
//! |-----------|---------|
//! | [`Forest::upsert`] | Store a parsed tree for a URI |
//! | [`Forest::upsert_source`] | Parse text and store it |
//! | [`Forest::from_sources`] | Parse a batch of files in parallel |
//! | [`Forest::get`] / [`Forest::remove`] | Single-entry access |
//! | [`Forest::all_entries`] | Snapshot of every entry |
//! | [`Forest::find_by_module_name`] | Exact module name lookup |

use std::sync::Arc;

use dashmap::DashMap;
use itertools::Itertools;
use rayon::prelude::*;
use tower_lsp::lsp_types::Url;
use tracing::{debug, info, warn};

use crate::{
    declarations,
    parser::{self, ParseError},
    syntax::Tree,
};


/// A file's current tree and the module name its header declares.
#[derive(Debug, Clone)]
pub struct ForestEntry {
    pub uri: Url,
    pub tree: Arc<Tree>,
    pub module_name: Option<String>,
}

impl ForestEntry {
    /// Derives the module name from the tree's own module declaration.
    pub fn new(uri: Url, tree: Tree) -> Self {
        let module_name = declarations::module_name(&tree);
        ForestEntry {
            uri,
            tree: Arc::new(tree),
            module_name,
        }
    }
}

#[derive(Debug, Default)]
pub struct Forest {
    entries: DashMap<Url, Arc<ForestEntry>>,
}

impl Forest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses every source on the rayon pool. Files that fail to parse are
    /// logged and left out.
    pub fn from_sources(sources: Vec<(Url, String)>) -> Self {
        let forest = Forest::new();
        sources
            .into_par_iter()
            .for_each(|(uri, text)| match parser::parse(&text) {
                Ok(tree) => {
                    forest.insert(ForestEntry::new(uri, tree));
                }
                Err(err) => warn!(uri = %uri, error = %err, "Skipping unparsable file"),
            });
        info!(files = forest.len(), "Forest constructed");
        forest
    }

    pub fn upsert(&self, uri: Url, tree: Tree, module_name: Option<String>) {
        self.insert(ForestEntry {
            uri,
            tree: Arc::new(tree),
            module_name,
        });
    }

    /// Parses `text`, derives the module name and stores the result.
    pub fn upsert_source(&self, uri: Url, text: &str) -> Result<Arc<ForestEntry>, ParseError> {
        let tree = parser::parse(text)?;
        let entry = Arc::new(ForestEntry::new(uri, tree));
        self.insert_arc(entry.clone());
        Ok(entry)
    }

    fn insert(&self, entry: ForestEntry) {
        self.insert_arc(Arc::new(entry));
    }

    fn insert_arc(&self, entry: Arc<ForestEntry>) {
        debug!(
            uri = %entry.uri,
            module = ?entry.module_name,
            nodes = entry.tree.len(),
            "Forest entry stored"
        );
        self.entries.insert(entry.uri.clone(), entry);
    }

    pub fn get(&self, uri: &Url) -> Option<Arc<ForestEntry>> {
        self.entries.get(uri).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, uri: &Url) -> Option<Arc<ForestEntry>> {
        let removed = self.entries.remove(uri).map(|(_, entry)| entry);
        if removed.is_some() {
            info!(uri = %uri, "Forest entry removed");
        }
        removed
    }

    /// Snapshot of all entries, ordered by URI.
    pub fn all_entries(&self) -> Vec<Arc<ForestEntry>> {
        self.entries
            .iter()
            .map(|entry| entry.value().clone())
            .sorted_by(|a, b| a.uri.as_str().cmp(b.uri.as_str()))
            .collect()
    }

    /// Entry whose module declaration names `module_name`. When several
    /// files claim the same name the smallest URI wins.
    pub fn find_by_module_name(&self, module_name: &str) -> Option<Arc<ForestEntry>> {
        self.entries
            .iter()
            .filter(|entry| entry.module_name.as_deref() == Some(module_name))
            .map(|entry| entry.value().clone())
            .min_by(|a, b| a.uri.as_str().cmp(b.uri.as_str()))
    }

    /// Declared module names, sorted and de-duplicated.
    pub fn module_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter_map(|entry| entry.module_name.clone())
            .sorted()
            .dedup()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
