//! Positional diffing of two record sequences.
//!
//! Comparison is index-aligned. An insertion or deletion shifts every later
//! position, so after one the located index is only a hint: the tamper signal
//! is a root mismatch, not the position reported here.

/// First aligned position whose bytes differ.
///
/// Returns `None` when every position present in both sequences matches,
/// even if one sequence is longer.
pub fn locate_first_difference<T: AsRef<[u8]>>(original: &[T], modified: &[T]) -> Option<usize> {
    changed_positions(original, modified).next()
}

/// Every aligned position whose bytes differ, in increasing order
pub fn changed_positions<'a, T: AsRef<[u8]>>(
    original: &'a [T],
    modified: &'a [T],
) -> impl Iterator<Item = usize> + 'a {
    original
        .iter()
        .zip(modified)
        .enumerate()
        .filter_map(|(index, (a, b))| (a.as_ref() != b.as_ref()).then_some(index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical() {
        assert_eq!(locate_first_difference(&["a", "b"], &["a", "b"]), None);
        assert_eq!(locate_first_difference::<&str>(&[], &[]), None);
    }

    #[test]
    fn in_place_edit() {
        assert_eq!(locate_first_difference(&["a", "b", "c"], &["a", "X", "c"]), Some(1));
        assert_eq!(changed_positions(&["a", "b", "c"], &["a", "X", "c"]).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn length_change_alone_is_not_located() {
        assert_eq!(locate_first_difference(&["a", "b"], &["a", "b", "c"]), None);
        assert_eq!(locate_first_difference(&["a", "b", "c"], &["a", "b"]), None);
    }

    #[test]
    fn deletion_shifts_later_positions() {
        let original = ["r0", "r1", "r2", "r3", "r4"];
        let deleted = ["r0", "r2", "r3", "r4"];
        assert_eq!(locate_first_difference(&original, &deleted), Some(1));
        // every later record looks changed
        assert_eq!(changed_positions(&original, &deleted).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn insertion_reports_insert_point() {
        let original = ["r0", "r1", "r2"];
        let inserted = ["r0", "fake", "r1", "r2"];
        assert_eq!(locate_first_difference(&original, &inserted), Some(1));
    }
}
