use super::{kind, NodeData, NodeId, Tree};

/// Incremental [`Tree`] construction.
///
/// Two modes share the same arena logic:
///
/// - token mode ([`TreeBuilder::new`]): the source text is accumulated from
///   tokens and trivia, the way a hand-written fixture reads;
/// - offset mode (`with_source`): nodes are opened and closed at byte offsets
///   into an existing source, which is how parser output is converted.
///
/// Line/column positions are computed once, in [`TreeBuilder::finish`].
#[derive(Default)]
pub struct TreeBuilder {
    source: String,
    nodes: Vec<NodeData>,
    open: Vec<NodeId>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_source(source: &str) -> Self {
        TreeBuilder {
            source: source.to_string(),
            ..Self::default()
        }
    }

    pub fn start_node(&mut self, kind: &'static str) -> &mut Self {
        let at = self.source.len();
        self.open(kind, true, false, at);
        self
    }

    pub fn finish_node(&mut self) -> &mut Self {
        let at = self.source.len();
        self.close(at);
        self
    }

    /// Named leaf.
    pub fn token(&mut self, kind: &'static str, text: &str) -> &mut Self {
        self.leaf(kind, true, text)
    }

    /// Anonymous leaf whose kind is its own text, like `(` or `,`.
    pub fn punct(&mut self, text: &'static str) -> &mut Self {
        self.leaf(text, false, text)
    }

    /// Zero-width placeholder for a token the parser expected but did not find.
    pub fn missing(&mut self, kind: &'static str) -> &mut Self {
        let at = self.source.len();
        self.open(kind, true, true, at);
        self.close(at);
        self
    }

    /// Text that belongs to no node (whitespace, newlines).
    pub fn trivia(&mut self, text: &str) -> &mut Self {
        self.source.push_str(text);
        self
    }

    fn leaf(&mut self, kind: &'static str, named: bool, text: &str) -> &mut Self {
        let at = self.source.len();
        self.source.push_str(text);
        self.open(kind, named, false, at);
        let end = self.source.len();
        self.close(end);
        self
    }

    pub(crate) fn open(&mut self, kind: &'static str, named: bool, missing: bool, start: usize) {
        let id = NodeId::from_index(self.nodes.len());
        let parent = self.open.last().copied();
        let index_in_parent = match parent {
            Some(parent) => {
                let siblings = &mut self.nodes[parent.index()].children;
                siblings.push(id);
                siblings.len() - 1
            }
            None => 0,
        };
        self.nodes.push(NodeData {
            kind,
            named,
            missing,
            bytes: start..start,
            start: Default::default(),
            end: Default::default(),
            parent,
            children: Vec::new(),
            index_in_parent,
        });
        self.open.push(id);
    }

    pub(crate) fn close(&mut self, end: usize) {
        if let Some(id) = self.open.pop() {
            self.nodes[id.index()].bytes.end = end;
        }
    }

    pub fn finish(mut self) -> Tree {
        let len = self.source.len();
        while let Some(id) = self.open.pop() {
            self.nodes[id.index()].bytes.end = len;
        }
        if self.nodes.is_empty() {
            self.open(kind::FILE, true, false, 0);
            self.close(len);
        }

        let line_starts = Tree::compute_line_starts(&self.source);
        for node in &mut self.nodes {
            node.start = Tree::position_at(&self.source, &line_starts, node.bytes.start);
            node.end = Tree::position_at(&self.source, &line_starts, node.bytes.end);
        }
        Tree::from_parts(self.source, self.nodes, line_starts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_lsp::lsp_types::Position;

    #[test]
    fn empty_builder_yields_a_root() {
        let tree = TreeBuilder::new().finish();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.root().kind(), kind::FILE);
        assert_eq!(tree.root().child_count(), 0);
    }

    #[test]
    fn missing_tokens_are_zero_width() {
        let mut builder = TreeBuilder::new();
        builder
            .start_node(kind::FILE)
            .token(kind::LOWER_CASE_IDENTIFIER, "x")
            .missing("eq")
            .finish_node();
        let tree = builder.finish();

        let missing = tree.root().child(1).expect("missing node");
        assert!(missing.is_missing());
        assert_eq!(missing.text(), "");
        assert_eq!(missing.start(), Position::new(0, 1));
        assert!(tree.has_error());
    }

    #[test]
    fn offsets_mode_places_nodes_on_existing_text() {
        let mut builder = TreeBuilder::with_source("a\nbc");
        builder.open(kind::FILE, true, false, 0);
        builder.open(kind::LOWER_CASE_IDENTIFIER, true, false, 2);
        builder.close(4);
        builder.close(4);
        let tree = builder.finish();

        let identifier = tree.root().child(0).expect("identifier");
        assert_eq!(identifier.text(), "bc");
        assert_eq!(identifier.start(), Position::new(1, 0));
        assert_eq!(identifier.end(), Position::new(1, 2));
    }
}
