//! elmwood: the resolution core of an Elm language server.
//!
//! Given a workspace of Elm files parsed with `tree-sitter-elm`, this crate
//! resolves identifier references to their declarations across modules while
//! respecting each module's exposing list, and enumerates the names visible
//! or importable at a cursor.
//!
//! # Overview
//!
//! - **Forest**: workspace-wide store of parsed files and their module names
//! - **Exposing**: the public surface of a module
//! - **Imports**: what a file's import clauses bring into scope
//! - **Definition**: go-to-definition over local scopes, the file and imports
//! - **Completion**: context-aware candidates, including auto-import edits
//! - **Hover** and **syntax diagnostics** on top of the above
//!
//! # Architecture
//!
//! - [`syntax`]: arena tree with parent/child/sibling navigation
//! - [`parser`]: `tree-sitter-elm` to [`syntax::Tree`]
//! - [`forest`]: the [`forest::Forest`] store (concurrent map of uri to tree)
//! - [`declarations`]: primitive lookups over one file
//! - [`exposing`], [`imports`], [`scope`]: the name-visibility layers
//! - [`gotodef`], [`completion`], [`hover`], [`diagnostics`]: LSP features
//! - [`config`]: user and workspace settings
//!
//! # Usage
//!
//! The crate has no transport; an embedding server feeds it documents and
//! forwards requests.
//!
//! ```ignore
//! use elmwood::{config::Settings, forest::Forest, gotodef};
//!
//! let forest = Forest::new();
//! forest.upsert_source(uri.clone(), &text)?;
//! let location = gotodef::goto_definition(&forest, &uri, position);
//! ```

// Syntax tree and parsing
pub mod parser;
pub mod syntax;

// Workspace model
pub mod declarations;
pub mod exposing;
pub mod forest;
pub mod imports;
pub mod scope;

// LSP feature modules
pub mod completion;
pub mod diagnostics;
pub mod gotodef;
pub mod hover;

// Configuration
pub mod config;

// Test utilities (only available in test builds)
#[cfg(test)]
pub mod test_utils;
