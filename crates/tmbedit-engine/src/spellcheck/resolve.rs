use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::document::EditStep;
use crate::spellcheck::checker::ErrorSpan;
use crate::spellcheck::delta::EditDelta;
use crate::spellcheck::dictionary::CustomWords;
use crate::spellcheck::projection::OffsetMap;

/// A misspelling anchored to document positions `[doc_start, doc_end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAnnotation {
    pub doc_start: usize,
    pub doc_end: usize,
    pub word: String,
}

impl ResolvedAnnotation {
    pub fn range(&self) -> Range<usize> {
        self.doc_start..self.doc_end
    }

    /// Whether a caret at `pos` touches this annotation, including right
    /// after its last character.
    pub fn contains(&self, pos: usize) -> bool {
        pos >= self.doc_start && pos <= self.doc_end
    }
}

/// Document range a checker span covered when its text was projected.
///
/// `None` unless the whole span lies inside a single text run.
pub fn span_to_doc_range(span: &ErrorSpan, map: &OffsetMap) -> Option<Range<usize>> {
    let entry = map.entry_for_text_offset(span.index)?;
    let text_end = span.index.checked_add(span.length)?;
    if text_end > entry.text_end() {
        return None;
    }
    let doc_start = entry.doc_start + (span.index - entry.text_offset);
    Some(doc_start..doc_start + span.length)
}

/// Turn checker spans into annotations on the current document.
///
/// Spans are located in the projection they were computed from and then
/// carried through every edit made since. Spans whose text was deleted or
/// that do not fit inside a text run are dropped, as is anything past the
/// end of the document.
pub fn resolve(
    spans: &[ErrorSpan],
    delta: &EditDelta,
    map: &OffsetMap,
    doc_size: usize,
) -> Vec<ResolvedAnnotation> {
    let mut annotations: Vec<ResolvedAnnotation> = spans
        .iter()
        .filter_map(|span| {
            if span.length == 0 {
                return None;
            }
            let Some(original) = span_to_doc_range(span, map) else {
                log::debug!(
                    "No text run holds {}+{} for '{}', skipping",
                    span.index,
                    span.length,
                    span.word
                );
                return None;
            };
            let Some(mapped) = delta.map_range(original) else {
                log::trace!("'{}' was edited away before its result arrived", span.word);
                return None;
            };
            if mapped.end > doc_size {
                log::trace!(
                    "'{}' resolved to {:?}, past the end of the document ({doc_size})",
                    span.word,
                    mapped
                );
                return None;
            }
            Some(ResolvedAnnotation {
                doc_start: mapped.start,
                doc_end: mapped.end,
                word: span.word.clone(),
            })
        })
        .collect();

    annotations.sort_by_key(|a| (a.doc_start, a.doc_end));
    annotations
}

/// The annotations currently shown, ordered by position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationSet {
    annotations: Vec<ResolvedAnnotation>,
}

impl AnnotationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in the annotations of a newer result.
    pub fn replace_all(&mut self, mut annotations: Vec<ResolvedAnnotation>) {
        annotations.sort_by_key(|a| (a.doc_start, a.doc_end));
        self.annotations = annotations;
    }

    /// Carry every annotation through one edit, dropping the ones whose text is gone.
    pub fn remap(&mut self, step: &EditStep) {
        if step.is_identity() {
            return;
        }
        let doc_size = step.new_len();
        self.annotations.retain_mut(|annotation| {
            match step.map_range(annotation.range()) {
                Some(mapped) if mapped.end <= doc_size => {
                    annotation.doc_start = mapped.start;
                    annotation.doc_end = mapped.end;
                    true
                }
                _ => false,
            }
        });
    }

    /// Drop every annotation whose word the custom list now excludes;
    /// returns how many were removed.
    pub fn retract_excluded(&mut self, custom_words: &CustomWords) -> usize {
        let before = self.annotations.len();
        self.annotations.retain(|a| !custom_words.is_excluded(&a.word));
        before - self.annotations.len()
    }

    pub fn retain<F>(&mut self, f: F)
    where
        F: FnMut(&ResolvedAnnotation) -> bool,
    {
        self.annotations.retain(f);
    }

    pub fn clear(&mut self) {
        self.annotations.clear();
    }

    /// First annotation touching `pos`.
    pub fn at(&self, pos: usize) -> Option<&ResolvedAnnotation> {
        let index = self.annotations.partition_point(|a| a.doc_end < pos);
        self.annotations[index..]
            .iter()
            .take_while(|a| a.doc_start <= pos)
            .find(|a| a.contains(pos))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedAnnotation> {
        self.annotations.iter()
    }

    pub fn as_slice(&self) -> &[ResolvedAnnotation] {
        &self.annotations
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }
}
