use crate::document::{BlockKind, Document, EditStep, InlineKind, Node, Patch, content_size};

/// Edit commands understood by the reference document.
///
/// Every command reports exactly one [`EditStep`] in its [`Patch`].
#[derive(Debug, Clone, PartialEq)]
pub enum Cmd {
    InsertText { at: usize, text: String },
    DeleteRange { range: std::ops::Range<usize> },
    /// Delete and insert as a single step (e.g. accepting a suggestion)
    ReplaceRange {
        range: std::ops::Range<usize>,
        text: String,
    },
    InsertInline { at: usize, inline: InlineKind },
    SplitBlock { at: usize },
    /// `at` must sit between two sibling blocks (or at either end of a list of blocks)
    InsertBlock { at: usize, block: Node },
    /// Remove the block whose open token is at `at`
    RemoveBlock { at: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("Position {pos} is past the end of the document (size {size})")]
    OutOfBounds { pos: usize, size: usize },
    #[error("Invalid range {start}..{end}")]
    InvalidRange { start: usize, end: usize },
    #[error("Position {0} is not inside a textblock")]
    NotInTextblock(usize),
    #[error("Range {start}..{end} crosses a block boundary")]
    CrossesBlocks { start: usize, end: usize },
    #[error("Position {0} is not a block boundary")]
    NotABlockBoundary(usize),
    #[error("No block starts at position {0}")]
    NoBlockAt(usize),
    #[error("Only block nodes can be inserted between blocks")]
    NotABlock,
}

impl Document {
    /// Apply a command, returning the position map of the edit.
    ///
    /// The document is left untouched when an error is returned.
    pub fn apply(&mut self, cmd: Cmd) -> Result<Patch, EditError> {
        let base_len = self.size();

        let (step, changed) = match cmd {
            Cmd::InsertText { at, text } => {
                self.check_position(at)?;
                let len = text.chars().count();
                self.edit_inlines(at..at, |inlines, start, _| {
                    splice_inlines(inlines, start..start, vec![Node::Text(text)]);
                })?;
                (EditStep::insert(at, len, base_len), at..at + len)
            }
            Cmd::DeleteRange { range } => {
                self.check_range(&range)?;
                self.edit_inlines(range.clone(), |inlines, start, end| {
                    splice_inlines(inlines, start..end, Vec::new());
                })?;
                (EditStep::delete(range.clone(), base_len), range.start..range.start)
            }
            Cmd::ReplaceRange { range, text } => {
                self.check_range(&range)?;
                let len = text.chars().count();
                self.edit_inlines(range.clone(), |inlines, start, end| {
                    splice_inlines(inlines, start..end, vec![Node::Text(text)]);
                })?;
                (
                    EditStep::replace(range.clone(), len, base_len),
                    range.start..range.start + len,
                )
            }
            Cmd::InsertInline { at, inline } => {
                self.check_position(at)?;
                self.edit_inlines(at..at, |inlines, start, _| {
                    splice_inlines(inlines, start..start, vec![Node::Inline(inline)]);
                })?;
                (EditStep::insert(at, 1, base_len), at..at + 1)
            }
            Cmd::SplitBlock { at } => {
                self.check_position(at)?;
                self.split_block(at)?;
                (EditStep::insert(at, 2, base_len), at..at + 2)
            }
            Cmd::InsertBlock { at, block } => {
                self.check_position(at)?;
                if !matches!(block, Node::Block { .. }) {
                    return Err(EditError::NotABlock);
                }
                let len = block.size();
                let (siblings, index) = locate_boundary(&mut self.children, 0, at)
                    .ok_or(EditError::NotABlockBoundary(at))?;
                siblings.insert(index, block);
                (EditStep::insert(at, len, base_len), at..at + len)
            }
            Cmd::RemoveBlock { at } => {
                self.check_position(at)?;
                let (siblings, index) = locate_boundary(&mut self.children, 0, at)
                    .ok_or(EditError::NoBlockAt(at))?;
                if !matches!(siblings.get(index), Some(Node::Block { .. })) {
                    return Err(EditError::NoBlockAt(at));
                }
                let removed = siblings.remove(index);
                (EditStep::delete(at..at + removed.size(), base_len), at..at)
            }
        };

        self.version += 1;

        Ok(Patch {
            step,
            changed,
            version: self.version,
        })
    }

    fn check_position(&self, pos: usize) -> Result<(), EditError> {
        let size = self.size();
        if pos > size {
            return Err(EditError::OutOfBounds { pos, size });
        }
        Ok(())
    }

    fn check_range(&self, range: &std::ops::Range<usize>) -> Result<(), EditError> {
        if range.start > range.end {
            return Err(EditError::InvalidRange {
                start: range.start,
                end: range.end,
            });
        }
        self.check_position(range.end)
    }

    /// Run `f` on the inline content of the textblock holding `range`,
    /// with the range translated to offsets inside that content.
    fn edit_inlines<F>(&mut self, range: std::ops::Range<usize>, f: F) -> Result<(), EditError>
    where
        F: FnOnce(&mut Vec<Node>, usize, usize),
    {
        let (siblings, index, content_start) = locate_textblock(&mut self.children, 0, range.start)
            .ok_or(EditError::NotInTextblock(range.start))?;
        let Node::Block { children, .. } = &mut siblings[index] else {
            return Err(EditError::NotInTextblock(range.start));
        };

        let content_end = content_start + content_size(children);
        if range.end > content_end {
            return Err(EditError::CrossesBlocks {
                start: range.start,
                end: range.end,
            });
        }

        f(children, range.start - content_start, range.end - content_start);
        Ok(())
    }

    fn split_block(&mut self, at: usize) -> Result<(), EditError> {
        let (siblings, index, content_start) =
            locate_textblock(&mut self.children, 0, at).ok_or(EditError::NotInTextblock(at))?;
        let Node::Block { kind, children } = &mut siblings[index] else {
            return Err(EditError::NotInTextblock(at));
        };

        let tail = split_inlines(children, at - content_start);
        // Splitting a heading continues with a plain paragraph
        let kind = match kind {
            BlockKind::Heading(_) => BlockKind::Paragraph,
            other => other.clone(),
        };
        siblings.insert(
            index + 1,
            Node::Block {
                kind,
                children: tail,
            },
        );
        Ok(())
    }
}

/// Find the textblock whose content contains `pos`.
///
/// Returns the sibling list holding it, its index, and its content start.
fn locate_textblock(
    nodes: &mut Vec<Node>,
    base: usize,
    pos: usize,
) -> Option<(&mut Vec<Node>, usize, usize)> {
    let mut offset = base;
    let mut found = None;

    for (index, node) in nodes.iter().enumerate() {
        let end = offset + node.size();
        if let Node::Block { kind, .. } = node {
            let content_start = offset + 1;
            if pos >= content_start && pos < end {
                found = Some((index, content_start, kind.is_textblock()));
                break;
            }
        }
        offset = end;
    }

    let (index, content_start, is_textblock) = found?;
    if is_textblock {
        return Some((nodes, index, content_start));
    }
    match &mut nodes[index] {
        Node::Block { children, .. } => locate_textblock(children, content_start, pos),
        _ => None,
    }
}

/// Find the block list and insertion index for a position between blocks.
fn locate_boundary(nodes: &mut Vec<Node>, base: usize, pos: usize) -> Option<(&mut Vec<Node>, usize)> {
    enum Found {
        Before(usize),
        Inside { index: usize, content_start: usize },
    }

    let mut offset = base;
    let mut found = None;

    for (index, node) in nodes.iter().enumerate() {
        if pos == offset {
            found = Some(Found::Before(index));
            break;
        }
        let end = offset + node.size();
        if pos < end {
            match node {
                Node::Block { kind, .. } if !kind.is_textblock() => {
                    found = Some(Found::Inside {
                        index,
                        content_start: offset + 1,
                    });
                    break;
                }
                _ => return None,
            }
        }
        offset = end;
    }

    match found {
        Some(Found::Before(index)) => Some((nodes, index)),
        Some(Found::Inside {
            index,
            content_start,
        }) => match &mut nodes[index] {
            Node::Block { children, .. } => locate_boundary(children, content_start, pos),
            _ => None,
        },
        None if pos == offset => {
            let len = nodes.len();
            Some((nodes, len))
        }
        None => None,
    }
}

/// Replace the inline content between two content offsets.
fn splice_inlines(inlines: &mut Vec<Node>, range: std::ops::Range<usize>, insert: Vec<Node>) {
    let tail = split_inlines(inlines, range.end);
    split_inlines(inlines, range.start);
    inlines.extend(insert);
    inlines.extend(tail);
    normalize_inlines(inlines);
}

/// Split inline content at a content offset, returning everything after it.
fn split_inlines(inlines: &mut Vec<Node>, at: usize) -> Vec<Node> {
    let mut offset = 0;

    for index in 0..inlines.len() {
        if offset == at {
            return inlines.split_off(index);
        }
        let size = inlines[index].size();
        if at < offset + size {
            if let Node::Text(text) = &mut inlines[index] {
                let byte = char_to_byte(text, at - offset);
                let tail_text = text.split_off(byte);
                let mut tail = inlines.split_off(index + 1);
                tail.insert(0, Node::Text(tail_text));
                return tail;
            }
        }
        offset += size;
    }

    Vec::new()
}

/// Merge adjacent text nodes and drop empty ones.
fn normalize_inlines(inlines: &mut Vec<Node>) {
    let mut merged: Vec<Node> = Vec::with_capacity(inlines.len());

    for node in std::mem::take(inlines) {
        if let Node::Text(text) = &node {
            if text.is_empty() {
                continue;
            }
            if let Some(Node::Text(prev)) = merged.last_mut() {
                prev.push_str(text);
                continue;
            }
        }
        merged.push(node);
    }

    *inlines = merged;
}

fn char_to_byte(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}
