//! Adapter from the `tree-sitter-elm` grammar to the arena [`Tree`].
//!
//! Parsing happens on a thread-local [`tree_sitter::Parser`], so files can be
//! parsed from rayon workers without sharing a parser. The tree-sitter tree is
//! converted with a cursor walk and dropped; nothing downstream depends on
//! tree-sitter types.

use std::cell::RefCell;

use derive_more::{Display, Error, From};
use once_cell::sync::Lazy;
use tree_sitter::{Language, LanguageError, Parser};

use crate::syntax::{Tree, TreeBuilder};

static ELM: Lazy<Language> = Lazy::new(|| tree_sitter_elm::LANGUAGE.into());

thread_local! {
    static PARSER: RefCell<Parser> = RefCell::new(Parser::new());
}

#[derive(Debug, Display, Error, From)]
pub enum ParseError {
    #[display("Elm grammar could not be loaded: {_0}")]
    #[from]
    Language(LanguageError),
    #[display("parse was cancelled")]
    Cancelled,
}

/// Parses Elm source text. Syntax errors do not fail the parse; they show up
/// as `ERROR` and `MISSING` nodes in the returned tree.
pub fn parse(source: &str) -> Result<Tree, ParseError> {
    PARSER.with(|parser| {
        let mut parser = parser.borrow_mut();
        if parser.language().is_none() {
            parser.set_language(&ELM)?;
        }
        let tree = parser.parse(source, None).ok_or(ParseError::Cancelled)?;
        Ok(convert(&tree, source))
    })
}

fn convert(tree: &tree_sitter::Tree, source: &str) -> Tree {
    let mut builder = TreeBuilder::with_source(source);
    let mut cursor = tree.walk();
    loop {
        let node = cursor.node();
        builder.open(node.kind(), node.is_named(), node.is_missing(), node.start_byte());
        if cursor.goto_first_child() {
            continue;
        }
        builder.close(node.end_byte());
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return builder.finish();
            }
            builder.close(cursor.node().end_byte());
        }
    }
}
