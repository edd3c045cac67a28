//! Arena-backed syntax trees.
//!
//! Every file in the [`Forest`](crate::forest::Forest) is stored as a [`Tree`]:
//! a flat vector of nodes addressed by [`NodeId`]. Parent, child and sibling
//! relations are index relations, so a node handle is just a borrowed tree plus
//! an index and can be copied freely.
//!
//! | Type | Role |
//! |------|------|
//! | [`Tree`] | Owns the source text and the node arena |
//! | [`SyntaxNode`] | Borrowed `Copy` handle used for navigation |
//! | [`NodeRef`] | Owned handle (`Arc<Tree>` + id) for results that cross files |
//! | [`TreeBuilder`] | Constructs trees from tokens or from parser output |
//!
//! All walks are iterative; deeply nested expressions never recurse.

use std::fmt;
use std::ops::Range as ByteRange;
use std::sync::Arc;

use tower_lsp::lsp_types::{Position, Range};

mod builder;
pub mod kind;

pub use builder::TreeBuilder;

/// Index of a node inside its [`Tree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn from_index(index: usize) -> Self {
        NodeId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct NodeData {
    pub(crate) kind: &'static str,
    pub(crate) named: bool,
    pub(crate) missing: bool,
    pub(crate) bytes: ByteRange<usize>,
    pub(crate) start: Position,
    pub(crate) end: Position,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) index_in_parent: usize,
}

/// A parsed file. Node 0 is always the root.
#[derive(Clone, PartialEq, Eq)]
pub struct Tree {
    source: String,
    nodes: Vec<NodeData>,
    line_starts: Vec<usize>,
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("nodes", &self.nodes.len())
            .field("lines", &self.line_starts.len())
            .finish()
    }
}

impl Tree {
    pub(crate) fn from_parts(source: String, nodes: Vec<NodeData>, line_starts: Vec<usize>) -> Self {
        Tree {
            source,
            nodes,
            line_starts,
        }
    }

    pub fn root(&self) -> SyntaxNode<'_> {
        SyntaxNode {
            tree: self,
            id: NodeId(0),
        }
    }

    pub fn node(&self, id: NodeId) -> Option<SyntaxNode<'_>> {
        (id.index() < self.nodes.len()).then_some(SyntaxNode { tree: self, id })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// True when any node is an `ERROR` or a `MISSING` placeholder.
    pub fn has_error(&self) -> bool {
        self.nodes
            .iter()
            .any(|node| node.kind == kind::ERROR || node.missing)
    }

    /// Text of a line without its line terminator.
    pub fn line_text(&self, line: u32) -> Option<&str> {
        let start = *self.line_starts.get(line as usize)?;
        let end = self
            .line_starts
            .get(line as usize + 1)
            .copied()
            .unwrap_or(self.source.len());
        let text = &self.source[start..end];
        Some(text.trim_end_matches(['\n', '\r']))
    }

    /// Byte offset of a position, clamped to the end of its line.
    ///
    /// Positions count UTF-16 code units, as LSP clients send them.
    pub fn offset_at(&self, position: Position) -> usize {
        let Some(line) = self.line_text(position.line) else {
            return self.source.len();
        };
        self.line_starts[position.line as usize] + byte_column(line, position.character)
    }

    pub(crate) fn position_at(source: &str, line_starts: &[usize], offset: usize) -> Position {
        let offset = offset.min(source.len());
        let line = line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        Position {
            line: line as u32,
            character: utf16_len(&source[line_starts[line]..offset]),
        }
    }

    pub(crate) fn compute_line_starts(source: &str) -> Vec<usize> {
        std::iter::once(0)
            .chain(source.match_indices('\n').map(|(index, _)| index + 1))
            .collect()
    }

    /// Deepest named node spanning `start..end`.
    ///
    /// A child is entered when it starts at or before `start`, ends at or after
    /// `end` and ends strictly after `start`. A cursor sitting right after an
    /// identifier therefore does not select that identifier.
    pub fn named_descendant_for_range(&self, start: Position, end: Position) -> SyntaxNode<'_> {
        let mut node = self.root();
        let mut last_named = node;
        loop {
            let next = node.children().find(|child| {
                let child_end = point(child.end());
                child_end >= point(end)
                    && child_end > point(start)
                    && point(child.start()) <= point(start)
            });
            match next {
                Some(child) => {
                    if child.is_named() {
                        last_named = child;
                    }
                    node = child;
                }
                None => break,
            }
        }
        last_named
    }

    pub fn named_descendant_for_position(&self, position: Position) -> SyntaxNode<'_> {
        self.named_descendant_for_range(position, position)
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }
}

/// Byte offset into `line` of a UTF-16 column. Columns past the end of the
/// line, or inside a surrogate pair, land on the next character boundary.
pub fn byte_column(line: &str, character: u32) -> usize {
    let mut utf16_offset = 0u32;
    for (byte_offset, c) in line.char_indices() {
        if utf16_offset >= character {
            return byte_offset;
        }
        utf16_offset += c.len_utf16() as u32;
    }
    line.len()
}

/// UTF-16 width of `text`, the column it spans on a line.
pub fn utf16_len(text: &str) -> u32 {
    text.chars().map(|c| c.len_utf16() as u32).sum()
}

fn point(position: Position) -> (u32, u32) {
    (position.line, position.character)
}

/// Borrowed handle to one node of a [`Tree`].
#[derive(Clone, Copy)]
pub struct SyntaxNode<'t> {
    tree: &'t Tree,
    id: NodeId,
}

impl PartialEq for SyntaxNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for SyntaxNode<'_> {}

impl fmt::Debug for SyntaxNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (start, end) = (self.start(), self.end());
        write!(
            f,
            "{}@{}:{}..{}:{}",
            self.kind(),
            start.line,
            start.character,
            end.line,
            end.character
        )
    }
}

impl<'t> SyntaxNode<'t> {
    fn data(&self) -> &'t NodeData {
        self.tree.data(self.id)
    }

    fn wrap(&self, id: NodeId) -> SyntaxNode<'t> {
        SyntaxNode {
            tree: self.tree,
            id,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'t Tree {
        self.tree
    }

    pub fn kind(&self) -> &'static str {
        self.data().kind
    }

    pub fn is_named(&self) -> bool {
        self.data().named
    }

    pub fn is_error(&self) -> bool {
        self.data().kind == kind::ERROR
    }

    pub fn is_missing(&self) -> bool {
        self.data().missing
    }

    pub fn text(&self) -> &'t str {
        &self.tree.source[self.data().bytes.clone()]
    }

    pub fn byte_range(&self) -> ByteRange<usize> {
        self.data().bytes.clone()
    }

    pub fn start(&self) -> Position {
        self.data().start
    }

    pub fn end(&self) -> Position {
        self.data().end
    }

    pub fn range(&self) -> Range {
        Range {
            start: self.start(),
            end: self.end(),
        }
    }

    pub fn parent(&self) -> Option<SyntaxNode<'t>> {
        self.data().parent.map(|id| self.wrap(id))
    }

    pub fn child_count(&self) -> usize {
        self.data().children.len()
    }

    pub fn child(&self, index: usize) -> Option<SyntaxNode<'t>> {
        self.data().children.get(index).map(|&id| self.wrap(id))
    }

    pub fn children(&self) -> impl DoubleEndedIterator<Item = SyntaxNode<'t>> + 't {
        let tree = self.tree;
        self.data()
            .children
            .iter()
            .map(move |&id| SyntaxNode { tree, id })
    }

    pub fn named_children(&self) -> impl DoubleEndedIterator<Item = SyntaxNode<'t>> + 't {
        self.children().filter(|child| child.is_named())
    }

    pub fn first_child(&self) -> Option<SyntaxNode<'t>> {
        self.child(0)
    }

    pub fn first_named_child(&self) -> Option<SyntaxNode<'t>> {
        self.named_children().next()
    }

    pub fn last_named_child(&self) -> Option<SyntaxNode<'t>> {
        self.named_children().next_back()
    }

    /// First child (named or not) of the given kind.
    pub fn child_of_kind(&self, kind: &str) -> Option<SyntaxNode<'t>> {
        self.children().find(|child| child.kind() == kind)
    }

    pub fn children_of_kind<'k>(
        &self,
        kind: &'k str,
    ) -> impl Iterator<Item = SyntaxNode<'t>> + 'k
    where
        't: 'k,
    {
        self.children().filter(move |child| child.kind() == kind)
    }

    pub fn next_sibling(&self) -> Option<SyntaxNode<'t>> {
        let parent = self.parent()?;
        parent.child(self.data().index_in_parent + 1)
    }

    pub fn prev_sibling(&self) -> Option<SyntaxNode<'t>> {
        let parent = self.parent()?;
        let index = self.data().index_in_parent.checked_sub(1)?;
        parent.child(index)
    }

    pub fn next_named_sibling(&self) -> Option<SyntaxNode<'t>> {
        let mut sibling = self.next_sibling();
        while let Some(node) = sibling {
            if node.is_named() {
                return Some(node);
            }
            sibling = node.next_sibling();
        }
        None
    }

    pub fn prev_named_sibling(&self) -> Option<SyntaxNode<'t>> {
        let mut sibling = self.prev_sibling();
        while let Some(node) = sibling {
            if node.is_named() {
                return Some(node);
            }
            sibling = node.prev_sibling();
        }
        None
    }

    /// Strict ancestors, nearest first.
    pub fn ancestors(&self) -> Ancestors<'t> {
        Ancestors {
            next: self.parent(),
        }
    }

    /// Strict descendants in pre-order.
    pub fn descendants(&self) -> Descendants<'t> {
        Descendants {
            tree: self.tree,
            stack: self.data().children.iter().rev().copied().collect(),
        }
    }

    pub fn descendants_of_kind<'k>(
        &self,
        kind: &'k str,
    ) -> impl Iterator<Item = SyntaxNode<'t>> + 'k
    where
        't: 'k,
    {
        self.descendants().filter(move |node| node.kind() == kind)
    }

    pub fn contains(&self, position: Position) -> bool {
        point(self.start()) <= point(position) && point(position) <= point(self.end())
    }
}

pub struct Ancestors<'t> {
    next: Option<SyntaxNode<'t>>,
}

impl<'t> Iterator for Ancestors<'t> {
    type Item = SyntaxNode<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        self.next = node.parent();
        Some(node)
    }
}

pub struct Descendants<'t> {
    tree: &'t Tree,
    stack: Vec<NodeId>,
}

impl<'t> Iterator for Descendants<'t> {
    type Item = SyntaxNode<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.data(id).children.iter().rev().copied());
        Some(SyntaxNode {
            tree: self.tree,
            id,
        })
    }
}

/// Owned node handle. Keeps its tree alive, so it stays valid after the
/// [`Forest`](crate::forest::Forest) replaces the file it came from.
#[derive(Clone)]
pub struct NodeRef {
    tree: Arc<Tree>,
    id: NodeId,
}

impl NodeRef {
    pub fn new(tree: Arc<Tree>, id: NodeId) -> Self {
        NodeRef { tree, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &Arc<Tree> {
        &self.tree
    }

    pub fn node(&self) -> SyntaxNode<'_> {
        SyntaxNode {
            tree: &self.tree,
            id: self.id,
        }
    }
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.tree, &other.tree) && self.id == other.id
    }
}

impl Eq for NodeRef {}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.node().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // module A exposing (foo)
    //
    // foo = bar
    fn sample() -> Tree {
        let mut builder = TreeBuilder::new();
        builder
            .start_node(kind::FILE)
            .start_node(kind::MODULE_DECLARATION)
            .token(kind::MODULE, "module")
            .trivia(" ")
            .start_node(kind::UPPER_CASE_QID)
            .token(kind::UPPER_CASE_IDENTIFIER, "A")
            .finish_node()
            .trivia(" ")
            .start_node(kind::EXPOSING_LIST)
            .token("exposing", "exposing")
            .trivia(" ")
            .punct("(")
            .start_node(kind::EXPOSED_VALUE)
            .token(kind::LOWER_CASE_IDENTIFIER, "foo")
            .finish_node()
            .punct(")")
            .finish_node()
            .finish_node()
            .trivia("\n\n")
            .start_node(kind::VALUE_DECLARATION)
            .start_node(kind::FUNCTION_DECLARATION_LEFT)
            .token(kind::LOWER_CASE_IDENTIFIER, "foo")
            .finish_node()
            .trivia(" ")
            .token("eq", "=")
            .trivia(" ")
            .start_node(kind::VALUE_EXPR)
            .start_node(kind::VALUE_QID)
            .token(kind::LOWER_CASE_IDENTIFIER, "bar")
            .finish_node()
            .finish_node()
            .finish_node()
            .trivia("\n")
            .finish_node();
        builder.finish()
    }

    #[test]
    fn builder_tracks_text_and_positions() {
        let tree = sample();
        assert_eq!(tree.source(), "module A exposing (foo)\n\nfoo = bar\n");

        let declaration = tree
            .root()
            .child_of_kind(kind::VALUE_DECLARATION)
            .expect("value declaration");
        assert_eq!(declaration.text(), "foo = bar");
        assert_eq!(declaration.start(), Position::new(2, 0));
        assert_eq!(declaration.end(), Position::new(2, 9));
    }

    #[test]
    fn siblings_skip_anonymous_nodes() {
        let tree = sample();
        let list = tree
            .root()
            .descendants_of_kind(kind::EXPOSING_LIST)
            .next()
            .expect("exposing list");
        let value = list.child_of_kind(kind::EXPOSED_VALUE).expect("value");

        assert_eq!(value.prev_sibling().map(|node| node.kind()), Some("("));
        assert_eq!(value.prev_named_sibling().map(|node| node.kind()), Some("exposing"));
        assert_eq!(value.next_named_sibling(), None);
    }

    #[test]
    fn position_lookup_excludes_node_ending_at_cursor() {
        let tree = sample();

        let inside = tree.named_descendant_for_position(Position::new(2, 7));
        assert_eq!(inside.kind(), kind::LOWER_CASE_IDENTIFIER);
        assert_eq!(inside.text(), "bar");

        // Right after `bar`: nothing ends strictly after the cursor.
        let after = tree.named_descendant_for_position(Position::new(2, 9));
        assert_eq!(after.kind(), kind::FILE);

        let before = tree.named_descendant_for_range(Position::new(2, 8), Position::new(2, 9));
        assert_eq!(before.text(), "bar");
    }

    #[test]
    fn ancestors_and_descendants_are_ordered() {
        let tree = sample();
        let bar = tree.named_descendant_for_position(Position::new(2, 6));

        let kinds: Vec<_> = bar.ancestors().map(|node| node.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                kind::VALUE_QID,
                kind::VALUE_EXPR,
                kind::VALUE_DECLARATION,
                kind::FILE
            ]
        );

        let identifiers: Vec<_> = tree
            .root()
            .descendants_of_kind(kind::LOWER_CASE_IDENTIFIER)
            .map(|node| node.text())
            .collect();
        assert_eq!(identifiers, vec!["foo", "foo", "bar"]);
    }

    #[test]
    fn line_helpers() {
        let tree = sample();
        assert_eq!(tree.line_text(0), Some("module A exposing (foo)"));
        assert_eq!(tree.line_text(1), Some(""));
        assert_eq!(tree.offset_at(Position::new(2, 4)), 29);
        assert_eq!(tree.offset_at(Position::new(2, 99)), 34);
    }

    /// Test: node positions and client positions use UTF-16 columns.
    #[test]
    fn positions_count_utf16_units() {
        let mut builder = TreeBuilder::new();
        builder
            .start_node(kind::FILE)
            .token("string_constant_expr", "\"日本😀\"")
            .trivia(" ")
            .start_node(kind::VALUE_QID)
            .token(kind::LOWER_CASE_IDENTIFIER, "answer")
            .finish_node()
            .finish_node();
        let tree = builder.finish();

        // 2 quotes + 2 BMP characters + one surrogate pair + 1 space.
        let answer = tree.named_descendant_for_position(Position::new(0, 8));
        assert_eq!(answer.text(), "answer");
        assert_eq!(answer.start(), Position::new(0, 7));
        assert_eq!(answer.end(), Position::new(0, 13));

        assert_eq!(tree.offset_at(Position::new(0, 7)), 13);
        assert_eq!(tree.offset_at(Position::new(0, 99)), tree.source().len());
        assert_eq!(byte_column("😀x", 1), 4);
        assert_eq!(utf16_len("日本😀"), 4);
    }

    #[test]
    fn node_refs_compare_by_tree_identity() {
        let tree = Arc::new(sample());
        let other = Arc::new(sample());
        let id = tree.root().id();

        assert_eq!(NodeRef::new(tree.clone(), id), NodeRef::new(tree.clone(), id));
        assert_ne!(NodeRef::new(tree, id), NodeRef::new(other, id));
    }
}
