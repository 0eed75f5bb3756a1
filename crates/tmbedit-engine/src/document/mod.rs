/*!
 * # Structured Document Model
 *
 * A small rich-text tree used as the editing surface the spell-check engine
 * runs against. It is deliberately minimal: the real editor owns a much richer
 * schema, but the engine only needs three things from it:
 *
 * - **Position addressing** that every node kind agrees on
 * - **Depth-first traversal** of text-bearing, block and inline nodes
 * - **One position map per edit** so annotations can follow the text
 *
 * ## Position Addressing
 *
 * Positions count tokens, not bytes:
 *
 * - a block occupies `2 + content size` (an open and a close token)
 * - a text node occupies one position per `char`
 * - an inline leaf (hard break, image) occupies one position
 *
 * The first top-level node starts at position 0, so the first character of
 * a leading paragraph sits at position 1.
 *
 * ## Edit Loop
 *
 * ```rust
 * use tmbedit_engine::document::{Cmd, Document};
 *
 * let mut doc = Document::from_plain_text("Teh quick fox");
 * let patch = doc.apply(Cmd::InsertText { at: 1, text: "X".to_string() }).unwrap();
 *
 * // Every patch carries the position map of the edit it performed
 * assert_eq!(patch.step.new_len(), doc.size());
 * ```
 */

pub mod commands;
pub mod patch;
pub mod step;

pub use commands::{Cmd, EditError};
pub use patch::Patch;
pub use step::{Assoc, EditStep};

/// Block-level node kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    Heading(u8),
    CodeBlock,
    BlockQuote,
    BulletList,
    OrderedList,
    ListItem,
}

impl BlockKind {
    /// Textblocks hold inline content directly; the rest hold other blocks.
    pub fn is_textblock(&self) -> bool {
        matches!(
            self,
            BlockKind::Paragraph | BlockKind::Heading(_) | BlockKind::CodeBlock
        )
    }
}

/// Inline leaves that carry no text of their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineKind {
    HardBreak,
    Image { src: String },
    Mention { label: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Block { kind: BlockKind, children: Vec<Node> },
    Text(String),
    Inline(InlineKind),
}

impl Node {
    pub fn paragraph(text: &str) -> Self {
        let children = if text.is_empty() {
            Vec::new()
        } else {
            vec![Node::Text(text.to_string())]
        };
        Node::Block {
            kind: BlockKind::Paragraph,
            children,
        }
    }

    pub fn block(kind: BlockKind, children: Vec<Node>) -> Self {
        Node::Block { kind, children }
    }

    pub fn text(text: &str) -> Self {
        Node::Text(text.to_string())
    }

    /// Number of positions this node occupies
    pub fn size(&self) -> usize {
        match self {
            Node::Block { children, .. } => 2 + content_size(children),
            Node::Text(text) => text.chars().count(),
            Node::Inline(_) => 1,
        }
    }
}

pub(crate) fn content_size(nodes: &[Node]) -> usize {
    nodes.iter().map(Node::size).sum()
}

/// Root of the document tree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    pub(crate) children: Vec<Node>,
    /// Incremented on each applied command
    pub(crate) version: u64,
}

impl Document {
    pub fn new(children: Vec<Node>) -> Self {
        Self {
            children,
            version: 0,
        }
    }

    /// Build a document from raw bytes, one paragraph per blank-line separated chunk
    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let text = std::str::from_utf8(bytes)?;
        Ok(Self::from_plain_text(text))
    }

    /// Paragraphs are split on blank lines; single newlines become hard breaks.
    pub fn from_plain_text(text: &str) -> Self {
        let mut children = Vec::new();

        for chunk in text.split("\n\n") {
            let chunk = chunk.trim_matches('\n');
            if chunk.is_empty() {
                continue;
            }

            let mut inlines = Vec::new();
            for (i, line) in chunk.split('\n').enumerate() {
                if i > 0 {
                    inlines.push(Node::Inline(InlineKind::HardBreak));
                }
                if !line.is_empty() {
                    inlines.push(Node::Text(line.to_string()));
                }
            }

            children.push(Node::Block {
                kind: BlockKind::Paragraph,
                children: inlines,
            });
        }

        Self::new(children)
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Total number of addressable positions
    pub fn size(&self) -> usize {
        content_size(&self.children)
    }

    /// Visit every node depth-first, pre-order, with its start position.
    pub fn descendants<F>(&self, mut f: F)
    where
        F: FnMut(&Node, usize),
    {
        visit_nodes(&self.children, 0, &mut f);
    }

    /// Text covered by a position range; non-text positions are skipped.
    pub fn text_between(&self, range: std::ops::Range<usize>) -> String {
        let mut out = String::new();
        self.descendants(|node, pos| {
            if let Node::Text(text) = node {
                for (i, ch) in text.chars().enumerate() {
                    if range.contains(&(pos + i)) {
                        out.push(ch);
                    }
                }
            }
        });
        out
    }
}

fn visit_nodes<F>(nodes: &[Node], start: usize, f: &mut F)
where
    F: FnMut(&Node, usize),
{
    let mut pos = start;
    for node in nodes {
        f(node, pos);
        if let Node::Block { children, .. } = node {
            visit_nodes(children, pos + 1, f);
        }
        pos += node.size();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sizes_follow_token_addressing() {
        let doc = Document::new(vec![
            Node::paragraph("héllo"),
            Node::block(
                BlockKind::BulletList,
                vec![Node::block(BlockKind::ListItem, vec![Node::paragraph("ab")])],
            ),
        ]);

        // paragraph: 2 + 5 chars; list: 2 + item(2 + paragraph(2 + 2))
        assert_eq!(doc.children()[0].size(), 7);
        assert_eq!(doc.children()[1].size(), 8);
        assert_eq!(doc.size(), 15);
    }

    #[test]
    fn test_descendants_reports_start_positions() {
        let doc = Document::new(vec![
            Node::block(
                BlockKind::Paragraph,
                vec![
                    Node::text("ab"),
                    Node::Inline(InlineKind::HardBreak),
                    Node::text("c"),
                ],
            ),
            Node::paragraph("d"),
        ]);

        let mut seen = Vec::new();
        doc.descendants(|node, pos| seen.push((pos, node.size())));

        assert_eq!(seen, vec![(0, 6), (1, 2), (3, 1), (4, 1), (6, 3), (7, 1)]);
    }

    #[test]
    fn test_from_plain_text_splits_paragraphs_and_breaks() {
        let doc = Document::from_plain_text("one\ntwo\n\nthree\n");

        assert_eq!(
            doc.children(),
            &[
                Node::block(
                    BlockKind::Paragraph,
                    vec![
                        Node::text("one"),
                        Node::Inline(InlineKind::HardBreak),
                        Node::text("two"),
                    ],
                ),
                Node::paragraph("three"),
            ]
        );
    }

    #[test]
    fn test_from_bytes_rejects_invalid_utf8() {
        assert!(Document::from_bytes(&[0xff, 0xfe]).is_err());
    }

    #[test]
    fn test_text_between() {
        let doc = Document::from_plain_text("Teh quick\n\nfox");
        assert_eq!(doc.text_between(1..4), "Teh");
        assert_eq!(doc.text_between(0..doc.size()), "Teh quickfox");
    }
}
