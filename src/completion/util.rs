use tower_lsp::lsp_types::{Position, Range, TextEdit};

use crate::{
    declarations,
    syntax::{self, kind, SyntaxNode, Tree},
};

/// Text of the cursor's line up to the cursor.
pub fn text_before_cursor(tree: &Tree, position: Position) -> &str {
    let Some(line) = tree.line_text(position.line) else {
        return "";
    };
    &line[..syntax::byte_column(line, position.character)]
}

/// Node the cursor is typing into. A cursor right after an identifier belongs
/// to that identifier, so the lookup steps back one character when the
/// previous character is part of a word.
pub fn node_at_cursor(tree: &Tree, position: Position) -> SyntaxNode<'_> {
    let before = text_before_cursor(tree, position);
    match before.chars().next_back() {
        Some(previous) if previous.is_alphanumeric() || previous == '_' => {
            let column = syntax::utf16_len(before) - previous.len_utf16() as u32;
            tree.named_descendant_for_position(Position::new(position.line, column))
        }
        _ => tree.named_descendant_for_position(position),
    }
}

/// Where a new import clause goes: the line after the last import, else the
/// line after the module declaration, else the top of the file.
pub fn import_insertion_position(tree: &Tree) -> Position {
    declarations::import_clauses(tree)
        .last()
        .or_else(|| declarations::module_declaration(tree))
        .map_or(Position::new(0, 0), |node| Position::new(node.end().line + 1, 0))
}

/// Edit making `item` of `module_name` visible unqualified.
pub fn import_edit(tree: &Tree, module_name: &str, item: &str) -> TextEdit {
    let existing = declarations::import_clauses(tree)
        .find(|clause| declarations::imported_module_name(*clause) == Some(module_name));

    match existing {
        Some(clause) => match clause.child_of_kind(kind::EXPOSING_LIST) {
            Some(list) => {
                let end = list.end();
                let close = Position::new(end.line, end.character.saturating_sub(1));
                insert(close, format!(", {item}"))
            }
            None => insert(clause.end(), format!(" exposing ({item})")),
        },
        None => insert(
            import_insertion_position(tree),
            format!("import {module_name} exposing ({item})\n"),
        ),
    }
}

fn insert(position: Position, new_text: String) -> TextEdit {
    TextEdit {
        range: Range {
            start: position,
            end: position,
        },
        new_text,
    }
}
