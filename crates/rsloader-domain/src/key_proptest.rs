//! Property-based tests for the identifier set.

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use crate::key::{Keys, StringKey};

    proptest! {
        #[test]
        fn test_keys_never_hold_duplicates(batches in prop::collection::vec(
            prop::collection::vec("[a-c]{1,2}", 0..6),
            0..6,
        )) {
            let mut keys: Keys<StringKey> = Keys::with_capacity(8);
            for batch in &batches {
                keys.append(batch.iter().map(StringKey::new));
            }

            let ids = keys.string_keys();
            let unique: HashSet<_> = ids.iter().collect();
            prop_assert_eq!(unique.len(), ids.len());

            let expected: HashSet<_> = batches.iter().flatten().collect();
            prop_assert_eq!(unique.len(), expected.len());
        }

        #[test]
        fn test_keys_keep_first_occurrence_order(values in prop::collection::vec(0u64..20, 0..30)) {
            let keys = Keys::from_keys(values.clone());

            let mut seen = HashSet::new();
            let expected: Vec<u64> = values.into_iter().filter(|v| seen.insert(*v)).collect();
            prop_assert_eq!(keys.raw_keys(), expected);
        }
    }
}
