//! Shared test utilities.
//!
//! Fixtures are written as one string holding several files:
//!
//! ```text
//! --@ OtherModule.elm
//! module OtherModule exposing (..)
//! ...
//! --@ Main.elm
//! module Main exposing (..)
//! main =
//!     {-caret-}
//! ```
//!
//! Each `--@ Name.elm` line starts a new file; a fixture without such lines
//! is a single `Main.elm`. The optional `{-caret-}` marker is removed and its
//! position remembered.

use std::sync::Arc;

use tower_lsp::lsp_types::{Position, Url};

use crate::{
    forest::{Forest, ForestEntry},
    syntax::{kind, utf16_len, Tree, TreeBuilder},
};

const CARET: &str = "{-caret-}";

pub struct TestWorkspace {
    pub forest: Forest,
    caret: Option<(Url, Position)>,
}

impl TestWorkspace {
    pub fn new(fixture: &str) -> Self {
        let forest = Forest::new();
        let mut caret = None;

        for (name, lines) in split_files(fixture) {
            let uri = file_uri(&name);
            let mut text = String::new();
            for (line_number, line) in lines.iter().enumerate() {
                match line.find(CARET) {
                    Some(column) => {
                        caret = Some((
                            uri.clone(),
                            Position::new(line_number as u32, utf16_len(&line[..column])),
                        ));
                        text.push_str(&line.replacen(CARET, "", 1));
                    }
                    None => text.push_str(line),
                }
                text.push('\n');
            }
            forest
                .upsert_source(uri, &text)
                .expect("fixture should parse");
        }

        TestWorkspace { forest, caret }
    }

    pub fn uri(&self, name: &str) -> Url {
        file_uri(name)
    }

    pub fn entry(&self, name: &str) -> Arc<ForestEntry> {
        self.forest
            .get(&file_uri(name))
            .unwrap_or_else(|| panic!("{name} is not part of the fixture"))
    }

    pub fn caret(&self) -> (Url, Position) {
        self.caret.clone().expect("fixture has no {-caret-} marker")
    }

    /// Position of the `nth` (0-based) occurrence of `needle` in a file.
    pub fn locate(&self, name: &str, needle: &str, nth: usize) -> Position {
        let entry = self.entry(name);
        let source = entry.tree.source();
        let (offset, _) = source
            .match_indices(needle)
            .nth(nth)
            .unwrap_or_else(|| panic!("{needle:?} #{nth} not found in {name}"));
        let line = source[..offset].matches('\n').count();
        let line_start = source[..offset].rfind('\n').map_or(0, |index| index + 1);
        Position::new(line as u32, utf16_len(&source[line_start..offset]))
    }
}

pub fn file_uri(name: &str) -> Url {
    Url::parse(&format!("file:///workspace/src/{name}")).expect("valid fixture uri")
}

// module M exposing (Msg(Variant1))
//
// type Msg = Variant1 | Variant2
pub fn partially_exposed_module() -> Tree {
    let mut builder = TreeBuilder::new();
    builder
        .start_node(kind::FILE)
        .start_node(kind::MODULE_DECLARATION)
        .token(kind::MODULE, "module")
        .trivia(" ")
        .start_node(kind::UPPER_CASE_QID)
        .token(kind::UPPER_CASE_IDENTIFIER, "M")
        .finish_node()
        .trivia(" ")
        .start_node(kind::EXPOSING_LIST)
        .token("exposing", "exposing")
        .trivia(" ")
        .punct("(")
        .start_node(kind::EXPOSED_TYPE)
        .token(kind::UPPER_CASE_IDENTIFIER, "Msg")
        .start_node(kind::EXPOSED_UNION_CONSTRUCTORS)
        .punct("(")
        .start_node(kind::EXPOSED_UNION_CONSTRUCTOR)
        .token(kind::UPPER_CASE_IDENTIFIER, "Variant1")
        .finish_node()
        .punct(")")
        .finish_node()
        .finish_node()
        .punct(")")
        .finish_node()
        .finish_node()
        .trivia("\n\n")
        .start_node(kind::TYPE_DECLARATION)
        .token(kind::TYPE, "type")
        .trivia(" ")
        .token(kind::UPPER_CASE_IDENTIFIER, "Msg")
        .trivia(" ")
        .token("eq", "=")
        .trivia(" ")
        .start_node(kind::UNION_VARIANT)
        .token(kind::UPPER_CASE_IDENTIFIER, "Variant1")
        .finish_node()
        .trivia(" ")
        .punct("|")
        .trivia(" ")
        .start_node(kind::UNION_VARIANT)
        .token(kind::UPPER_CASE_IDENTIFIER, "Variant2")
        .finish_node()
        .finish_node()
        .trivia("\n")
        .finish_node();
    builder.finish()
}

fn split_files(fixture: &str) -> Vec<(String, Vec<&str>)> {
    let mut files: Vec<(String, Vec<&str>)> = Vec::new();
    for line in fixture.lines() {
        match line.strip_prefix("--@ ") {
            Some(name) => files.push((name.trim().to_string(), Vec::new())),
            None => match files.last_mut() {
                Some((_, lines)) => lines.push(line),
                None if line.trim().is_empty() => {}
                None => files.push(("Main.elm".to_string(), vec![line])),
            },
        }
    }
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_files_and_finds_caret() {
        let workspace = TestWorkspace::new(
            "\n--@ A.elm\nmodule A exposing (..)\n\na =\n    1\n--@ B.elm\nmodule B exposing (..)\n\nb =\n    {-caret-}a\n",
        );

        assert_eq!(workspace.forest.len(), 2);
        let (uri, position) = workspace.caret();
        assert_eq!(uri, workspace.uri("B.elm"));
        assert_eq!(position, Position::new(3, 4));
        assert_eq!(
            workspace.entry("B.elm").tree.source(),
            "module B exposing (..)\n\nb =\n    a\n"
        );
        assert_eq!(workspace.locate("A.elm", "a", 0), Position::new(2, 0));
        assert_eq!(workspace.locate("B.elm", "a", 0), Position::new(3, 4));
    }

    #[test]
    fn fixture_without_headers_is_main() {
        let workspace = TestWorkspace::new("module Main exposing (..)\n\nmain =\n    1\n");
        assert!(workspace.forest.get(&workspace.uri("Main.elm")).is_some());
    }
}
