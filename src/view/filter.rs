//! Filtered id computation
//!
//! A pure function of the current inputs. The output keeps the order of
//! `all_ids` (ascending), whichever filters are active.

use std::collections::{BTreeSet, HashSet};

/// Inputs to [`filtered_ids`]; `None` means the filter is inactive.
#[derive(Debug, Default, Clone, Copy)]
pub struct FilterInputs<'a> {
    /// The whole universe, ascending
    pub all_ids: &'a [u32],
    /// Favorites, when the favorites-only filter is on
    pub favorites: Option<&'a BTreeSet<u32>>,
    /// Directory prefix matches, when a search prefix is set
    pub search_matches: Option<&'a [u32]>,
    /// Category intersection, when categories are selected
    pub category_matches: Option<&'a [u32]>,
}

/// Intersect the universe with every active filter.
pub fn filtered_ids(inputs: FilterInputs<'_>) -> Vec<u32> {
    let search: Option<HashSet<u32>> = inputs.search_matches.map(|ids| ids.iter().copied().collect());
    let category: Option<HashSet<u32>> = inputs.category_matches.map(|ids| ids.iter().copied().collect());

    inputs
        .all_ids
        .iter()
        .copied()
        .filter(|id| inputs.favorites.map_or(true, |f| f.contains(id)))
        .filter(|id| search.as_ref().map_or(true, |s| s.contains(id)))
        .filter(|id| category.as_ref().map_or(true, |c| c.contains(id)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_filters_is_identity() {
        let all: Vec<u32> = (1..=10).collect();
        let ids = filtered_ids(FilterInputs {
            all_ids: &all,
            ..Default::default()
        });
        assert_eq!(ids, all);
    }

    #[test]
    fn test_filters_compose() {
        let all: Vec<u32> = (1..=20).collect();
        let favorites = BTreeSet::from([3, 6, 7, 12]);
        let search = [12, 6, 3, 19];
        let category = [6, 12, 15];

        let ids = filtered_ids(FilterInputs {
            all_ids: &all,
            favorites: Some(&favorites),
            search_matches: Some(&search[..]),
            category_matches: Some(&category[..]),
        });
        assert_eq!(ids, vec![6, 12]);
    }

    #[test]
    fn test_search_order_is_ascending() {
        let all: Vec<u32> = (1..=30).collect();
        let search = [29, 25, 26];
        let ids = filtered_ids(FilterInputs {
            all_ids: &all,
            search_matches: Some(&search[..]),
            ..Default::default()
        });
        assert_eq!(ids, vec![25, 26, 29]);
    }

    #[test]
    fn test_empty_match_lists_filter_everything() {
        let all: Vec<u32> = (1..=5).collect();
        let no_members: Vec<u32> = Vec::new();
        let ids = filtered_ids(FilterInputs {
            all_ids: &all,
            category_matches: Some(no_members.as_slice()),
            ..Default::default()
        });
        assert!(ids.is_empty());
    }
}
