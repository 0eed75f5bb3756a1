use serde::{Deserialize, Serialize};

use crate::document::{Document, InlineKind, Node};

/// Character appended for inline leaves that carry no text.
pub const INLINE_PLACEHOLDER: char = ' ';

/// One contiguous run of projected text and the document positions it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetMapEntry {
    pub doc_start: usize,
    pub doc_end: usize,
    pub text_offset: usize,
    pub text_length: usize,
}

impl OffsetMapEntry {
    pub fn text_end(&self) -> usize {
        self.text_offset + self.text_length
    }

    pub fn contains_text_offset(&self, offset: usize) -> bool {
        offset >= self.text_offset && offset < self.text_end()
    }
}

/// Entries in document order with strictly increasing text offsets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetMap {
    entries: Vec<OffsetMapEntry>,
}

impl OffsetMap {
    pub fn entries(&self) -> &[OffsetMapEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry whose text run contains `offset`.
    pub fn entry_for_text_offset(&self, offset: usize) -> Option<&OffsetMapEntry> {
        let index = self.entries.partition_point(|e| e.text_end() <= offset);
        self.entries
            .get(index)
            .filter(|e| e.contains_text_offset(offset))
    }

    /// Document position of a projected character.
    ///
    /// `None` for separators and placeholders, which have no text run.
    pub fn text_to_doc(&self, offset: usize) -> Option<usize> {
        self.entry_for_text_offset(offset)
            .map(|e| e.doc_start + (offset - e.text_offset))
    }

    /// Text offset of a document position inside a text node.
    pub fn doc_to_text(&self, pos: usize) -> Option<usize> {
        let index = self.entries.partition_point(|e| e.doc_end <= pos);
        self.entries
            .get(index)
            .filter(|e| pos >= e.doc_start && pos < e.doc_end)
            .map(|e| e.text_offset + (pos - e.doc_start))
    }

    fn push(&mut self, entry: OffsetMapEntry) {
        debug_assert!(
            self.entries
                .last()
                .is_none_or(|prev| prev.text_end() <= entry.text_offset),
            "offset map entries must be ordered: {:?} then {:?}",
            self.entries.last(),
            entry
        );
        self.entries.push(entry);
    }
}

/// Flattened text of a document at one instant, with its offset map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    pub text: String,
    pub map: OffsetMap,
}

/// Flatten a document into plain text the checker can consume.
///
/// Text nodes contribute their text and one map entry; blocks start on a new
/// line; inline leaves contribute exactly one character so that every
/// projected character outside separators matches one document position.
pub fn project(doc: &Document) -> Projection {
    let mut text = String::new();
    // Tracked in chars; `text.len()` is bytes
    let mut text_len = 0;
    let mut map = OffsetMap::default();

    doc.descendants(|node, pos| match node {
        Node::Text(content) => {
            let length = content.chars().count();
            if length == 0 {
                return;
            }
            map.push(OffsetMapEntry {
                doc_start: pos,
                doc_end: pos + length,
                text_offset: text_len,
                text_length: length,
            });
            text.push_str(content);
            text_len += length;
        }
        Node::Block { .. } => {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
                text_len += 1;
            }
        }
        Node::Inline(InlineKind::HardBreak) => {
            text.push('\n');
            text_len += 1;
        }
        Node::Inline(InlineKind::Image { .. } | InlineKind::Mention { .. }) => {
            text.push(INLINE_PLACEHOLDER);
            text_len += 1;
        }
    });

    Projection { text, map }
}
