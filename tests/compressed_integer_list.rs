//! Property tests for the compressed integer list.

mod common;

use forest_lower::*;
use proptest::prelude::*;

fn sorted(mut values: Vec<u64>) -> Vec<u64> {
    values.sort_unstable();
    values
}

fn encoded_len(delta: u64) -> usize {
    let bits = 64 - delta.leading_zeros() as usize;
    bits.max(1).div_ceil(7)
}

#[test]
fn test_documented_example() {
    let mut list = CompressedIntegerList::new();
    for value in [0u64, 3, 3, 10, 1_000_000] {
        list.push_back(value).unwrap();
    }
    assert_eq!(list.iter().collect::<Vec<_>>(), vec![0, 3, 3, 10, 1_000_000]);
    assert_eq!(list.size(), 5);
    assert_eq!(list.max().unwrap(), 1_000_000);
}

#[test]
fn test_active_edges_of_forest_output() {
    let forest = common::random_simple_forest(21, 3, 5, 3);
    let output = forest.compute(&[0.2, -0.4, 0.9]).unwrap();
    let active = output.active_edges().unwrap();

    let expected: Vec<u64> = output
        .edge_indicator
        .iter()
        .enumerate()
        .filter(|(_, &on)| on)
        .map(|(edge, _)| edge as u64)
        .collect();
    assert_eq!(active.iter().collect::<Vec<_>>(), expected);
    assert!(active.size() >= forest.num_trees() as u64);
}

proptest! {
    #[test]
    fn prop_round_trip(values in prop::collection::vec(any::<u64>(), 0..200)) {
        let values = sorted(values);
        let list = CompressedIntegerList::from_sorted(values.iter().copied()).unwrap();

        prop_assert_eq!(list.size(), values.len() as u64);
        prop_assert_eq!(list.iter().collect::<Vec<_>>(), values.clone());
        match values.last() {
            Some(&last) => prop_assert_eq!(list.max().unwrap(), last),
            None => prop_assert!(list.max().is_err()),
        }
    }

    #[test]
    fn prop_byte_length_matches_deltas(values in prop::collection::vec(0u64..1_000_000_000, 1..100)) {
        let values = sorted(values);
        let list = CompressedIntegerList::from_sorted(values.iter().copied()).unwrap();

        let mut previous = 0;
        let mut expected = 0;
        for &value in &values {
            expected += encoded_len(value - previous);
            previous = value;
        }
        prop_assert_eq!(list.byte_len(), expected);
    }

    #[test]
    fn prop_decreasing_push_leaves_list_unchanged(
        values in prop::collection::vec(1u64..u64::MAX, 1..50),
        gap in 1u64..1000,
    ) {
        let values = sorted(values);
        let mut list = CompressedIntegerList::from_sorted(values.iter().copied()).unwrap();
        let max = list.max().unwrap();
        let bytes = list.byte_len();

        let err = list.push_back(max.saturating_sub(gap)).unwrap_err();
        let is_invalid_argument = matches!(err, ForestError::InvalidArgument { .. });
        prop_assert!(is_invalid_argument);
        prop_assert!(err.is_recoverable());
        prop_assert_eq!(list.size(), values.len() as u64);
        prop_assert_eq!(list.max().unwrap(), max);
        prop_assert_eq!(list.byte_len(), bytes);
        prop_assert_eq!(list.iter().collect::<Vec<_>>(), values);
    }

    #[test]
    fn prop_reset_empties(values in prop::collection::vec(any::<u64>(), 0..50)) {
        let mut list = CompressedIntegerList::from_sorted(sorted(values)).unwrap();
        list.reset();
        prop_assert_eq!(list.size(), 0);
        prop_assert!(!list.iter().is_valid());
        prop_assert!(list.is_empty());
    }

    #[test]
    fn prop_explicit_cursor_matches_iterator(values in prop::collection::vec(0u64..10_000, 0..60)) {
        let list = CompressedIntegerList::from_sorted(sorted(values)).unwrap();
        let mut cursor = list.iter();
        let mut walked = Vec::new();
        while cursor.is_valid() {
            walked.push(cursor.get().unwrap());
            cursor.advance().unwrap();
        }
        prop_assert!(cursor.get().is_err());
        prop_assert_eq!(walked, list.iter().collect::<Vec<_>>());
    }
}
