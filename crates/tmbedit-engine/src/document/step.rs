use xi_rope::delta::{DeltaElement, Transformer};
use xi_rope::{Delta, Interval, Rope, RopeInfo};

/// Which side of an edit boundary a position sticks to.
///
/// Only decides positions sitting exactly where content is inserted. Anything
/// inside or at the right edge of a replaced range lands after the replacement
/// whichever side is chosen; pure deletions collapse onto the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    /// Stay before content inserted at this position.
    Before,
    /// Move past content inserted at this position.
    After,
}

/// Position map of a single structural edit.
///
/// Backed by an xi-rope `Delta` over document positions. The inserted rope
/// content is filler of the right length: only lengths matter for position
/// mapping, the real content lives in the document tree.
#[derive(Debug, Clone)]
pub struct EditStep {
    delta: Delta<RopeInfo>,
}

impl EditStep {
    /// Replace `start..end` of a document of size `base_len` with `new_len` positions.
    pub fn replace(range: std::ops::Range<usize>, new_len: usize, base_len: usize) -> Self {
        let filler = Rope::from(" ".repeat(new_len));
        let delta = Delta::simple_edit(Interval::new(range.start, range.end), filler, base_len);
        Self::from_delta(delta)
    }

    pub fn insert(at: usize, len: usize, base_len: usize) -> Self {
        Self::replace(at..at, len, base_len)
    }

    pub fn delete(range: std::ops::Range<usize>, base_len: usize) -> Self {
        Self::replace(range, 0, base_len)
    }

    /// Wrap an arbitrary delta whose units are document positions.
    pub fn from_delta(delta: Delta<RopeInfo>) -> Self {
        Self { delta }
    }

    /// Document size this step applies to.
    pub fn base_len(&self) -> usize {
        self.delta.base_len
    }

    /// Document size after this step.
    pub fn new_len(&self) -> usize {
        self.delta.new_document_len()
    }

    /// True when the step changes nothing, including empty edits the
    /// delta builder records as two adjacent copies.
    pub fn is_identity(&self) -> bool {
        let mut copied = 0;
        for el in &self.delta.els {
            match el {
                DeltaElement::Copy(from, to) => copied += to - from,
                DeltaElement::Insert(_) => return false,
            }
        }
        copied == self.delta.base_len
    }

    /// Map a position from before this step to after it.
    pub fn map(&self, pos: usize, assoc: Assoc) -> usize {
        Transformer::new(&self.delta).transform(pos, assoc == Assoc::After)
    }

    /// Map a range so that insertions at either edge stay outside it.
    ///
    /// `None` when nothing of the range survives the step.
    pub fn map_range(&self, range: std::ops::Range<usize>) -> Option<std::ops::Range<usize>> {
        let mut transformer = Transformer::new(&self.delta);
        let start = transformer.transform(range.start, true);
        let end = transformer.transform(range.end, false);
        (end > start).then_some(start..end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_insert_grows_document() {
        let step = EditStep::insert(4, 2, 10);
        assert_eq!(step.base_len(), 10);
        assert_eq!(step.new_len(), 12);
        assert!(!step.is_identity());
    }

    #[test]
    fn test_delete_at_end_of_document() {
        let step = EditStep::delete(7..10, 10);
        assert_eq!(step.new_len(), 7);
        assert_eq!(step.map(8, Assoc::Before), 7);
        assert_eq!(step.map(10, Assoc::After), 7);
    }

    #[rstest]
    #[case(0, Assoc::After, 0)]
    #[case(3, Assoc::Before, 3)]
    #[case(4, Assoc::Before, 4)]
    #[case(4, Assoc::After, 6)]
    #[case(5, Assoc::Before, 7)]
    #[case(10, Assoc::After, 12)]
    fn test_map_through_insertion(#[case] pos: usize, #[case] assoc: Assoc, #[case] expected: usize) {
        let step = EditStep::insert(4, 2, 10);
        assert_eq!(step.map(pos, assoc), expected);
    }

    #[rstest]
    #[case(1, Assoc::Before, 1)]
    #[case(2, Assoc::Before, 2)]
    #[case(2, Assoc::After, 2)]
    #[case(3, Assoc::Before, 2)]
    #[case(3, Assoc::After, 2)]
    #[case(5, Assoc::Before, 2)]
    #[case(5, Assoc::After, 2)]
    #[case(6, Assoc::Before, 3)]
    fn test_deletion_collapses_to_boundary(
        #[case] pos: usize,
        #[case] assoc: Assoc,
        #[case] expected: usize,
    ) {
        let step = EditStep::delete(2..5, 10);
        assert_eq!(step.map(pos, assoc), expected);
    }

    // "abcdef": replace "cd" (2..4) with three positions
    #[rstest]
    #[case::before_edit(1, Assoc::After, 1)]
    #[case::left_edge_before(2, Assoc::Before, 2)]
    #[case::left_edge_after(2, Assoc::After, 5)]
    #[case::interior_before(3, Assoc::Before, 5)]
    #[case::interior_after(3, Assoc::After, 5)]
    #[case::right_edge_before(4, Assoc::Before, 5)]
    #[case::right_edge_after(4, Assoc::After, 5)]
    #[case::past_edit(6, Assoc::Before, 7)]
    fn test_replacement_edges_and_interior(
        #[case] pos: usize,
        #[case] assoc: Assoc,
        #[case] expected: usize,
    ) {
        let step = EditStep::replace(2..4, 3, 6);
        assert_eq!(step.map(pos, assoc), expected);
    }

    #[test]
    fn test_from_delta_with_multiple_edits() {
        let mut builder = xi_rope::delta::Builder::new(10);
        builder.delete(Interval::new(1, 3));
        builder.replace(Interval::new(6, 6), Rope::from("xyz"));
        let step = EditStep::from_delta(builder.build());

        assert_eq!(step.map(0, Assoc::After), 0);
        assert_eq!(step.map(4, Assoc::After), 2);
        assert_eq!(step.map(6, Assoc::Before), 4);
        assert_eq!(step.map(6, Assoc::After), 7);
        assert_eq!(step.map(9, Assoc::After), 10);
        assert_eq!(step.new_len(), 11);
    }

    #[test]
    fn test_map_range_through_step() {
        let step = EditStep::replace(2..4, 3, 10);
        assert_eq!(step.map_range(0..2), Some(0..2));
        assert_eq!(step.map_range(4..6), Some(5..7));
        assert_eq!(step.map_range(2..4), None);
        assert_eq!(step.map_range(1..5), Some(1..6));
        // An end inside the replacement stretches over the new content
        assert_eq!(step.map_range(1..3), Some(1..5));
        assert_eq!(step.map_range(3..6), Some(5..7));
    }

    #[test]
    fn test_identity_step() {
        let step = EditStep::replace(3..3, 0, 5);
        assert!(step.is_identity());
        assert_eq!(step.new_len(), 5);
        assert_eq!(step.map(3, Assoc::After), 3);
    }
}
