use crate::document::{Assoc, EditStep};

/// Accumulated position map of every edit since some moment.
///
/// Steps are applied in the order they were recorded. Composition is plain
/// concatenation, so mapping through `a.compose(b)` equals mapping through
/// `a` and then through `b`.
#[derive(Debug, Clone, Default)]
pub struct EditDelta {
    steps: Vec<EditStep>,
}

impl EditDelta {
    /// The identity mapping
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, step: EditStep) {
        if step.is_identity() {
            return;
        }
        if let Some(last) = self.steps.last()
            && last.new_len() != step.base_len()
        {
            log::warn!(
                "Edit step expects a document of {} positions but the previous step produced {}",
                step.base_len(),
                last.new_len()
            );
        }
        self.steps.push(step);
    }

    /// Append every step of `other` after the steps of `self`.
    pub fn compose(mut self, other: EditDelta) -> Self {
        for step in other.steps {
            self.extend(step);
        }
        self
    }

    pub fn is_identity(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of non-identity steps recorded
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn map(&self, pos: usize, assoc: Assoc) -> usize {
        self.steps
            .iter()
            .fold(pos, |pos, step| step.map(pos, assoc))
    }

    /// Map a range so that insertions at either edge stay outside it.
    ///
    /// Returns `None` when the range collapsed (its text was deleted).
    pub fn map_range(&self, range: std::ops::Range<usize>) -> Option<std::ops::Range<usize>> {
        let start = self.map(range.start, Assoc::After);
        let end = self.map(range.end, Assoc::Before);
        (end > start).then_some(start..end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn typing_session() -> (EditStep, EditStep) {
        // doc of 20 positions: insert 3 at 5, then delete 10..14 of the new doc
        (EditStep::insert(5, 3, 20), EditStep::delete(10..14, 23))
    }

    #[test]
    fn test_empty_delta_is_identity() {
        let delta = EditDelta::empty();
        assert!(delta.is_identity());
        assert_eq!(delta.map(7, Assoc::Before), 7);
        assert_eq!(delta.map_range(2..9), Some(2..9));
    }

    #[rstest]
    #[case(0)]
    #[case(5)]
    #[case(6)]
    #[case(8)]
    #[case(11)]
    #[case(12)]
    #[case(19)]
    #[case(20)]
    fn test_extend_matches_sequential_mapping(#[case] pos: usize) {
        let (s1, s2) = typing_session();

        let mut delta = EditDelta::empty();
        delta.extend(s1.clone());
        delta.extend(s2.clone());

        for assoc in [Assoc::Before, Assoc::After] {
            assert_eq!(delta.map(pos, assoc), s2.map(s1.map(pos, assoc), assoc));
        }
    }

    #[rstest]
    #[case(0)]
    #[case(4)]
    #[case(9)]
    #[case(17)]
    fn test_compose_is_associative_at_any_split(#[case] pos: usize) {
        let steps = [
            EditStep::insert(2, 1, 20),
            EditStep::delete(4..9, 21),
            EditStep::replace(1..3, 4, 16),
        ];

        let all = steps.iter().cloned().fold(EditDelta::empty(), |mut d, s| {
            d.extend(s);
            d
        });

        for split in 0..=steps.len() {
            let mut left = EditDelta::empty();
            let mut right = EditDelta::empty();
            for (i, step) in steps.iter().cloned().enumerate() {
                if i < split {
                    left.extend(step);
                } else {
                    right.extend(step);
                }
            }
            let mapped_in_two = right.map(left.map(pos, Assoc::After), Assoc::After);
            assert_eq!(left.compose(right).map(pos, Assoc::After), mapped_in_two);
            assert_eq!(all.map(pos, Assoc::After), mapped_in_two);
        }
    }

    #[test]
    fn test_map_range_keeps_insertions_at_edges_outside() {
        let mut delta = EditDelta::empty();
        delta.extend(EditStep::insert(4, 2, 10));
        delta.extend(EditStep::insert(1, 1, 12));

        // range 1..4: insertion at 4 stays after, insertion at 1 pushes it right
        assert_eq!(delta.map_range(1..4), Some(2..5));
    }

    #[test]
    fn test_map_range_collapses_deleted_text() {
        let mut delta = EditDelta::empty();
        delta.extend(EditStep::delete(1..4, 10));

        assert_eq!(delta.map_range(1..4), None);
        assert_eq!(delta.map_range(2..3), None);
        // partially deleted ranges shrink
        assert_eq!(delta.map_range(3..6), Some(1..3));
    }

    #[test]
    fn test_replacing_a_word_collapses_its_range() {
        let mut delta = EditDelta::empty();
        delta.extend(EditStep::replace(1..4, 3, 10));

        assert_eq!(delta.map_range(1..4), None);
    }

    #[test]
    fn test_identity_steps_are_not_recorded() {
        let mut delta = EditDelta::empty();
        delta.extend(EditStep::insert(3, 0, 10));
        assert!(delta.is_empty());
    }
}
