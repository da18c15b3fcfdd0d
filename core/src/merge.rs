use std::collections::HashSet;

use crate::models::Recipe;

/// Mark each recipe favourite iff its id is in `favourite_ids`.
///
/// Order and every other field are kept as given.
#[must_use]
pub fn merge_favourites(remote: Vec<Recipe>, favourite_ids: &HashSet<i64>) -> Vec<Recipe> {
    remote
        .into_iter()
        .map(|r| {
            let is_favourite = favourite_ids.contains(&r.id);
            r.with_favourite(is_favourite)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe(id: i64, title: &str, is_favourite: bool) -> Recipe {
        Recipe {
            id,
            image_url: String::new(),
            title: title.to_string(),
            ready_in_minutes: 0,
            is_favourite,
        }
    }

    #[test]
    fn test_merge_marks_exactly_favourites() {
        let remote = vec![
            recipe(3, "Stew", false),
            recipe(1, "Soup", false),
            recipe(2, "Salad", true),
        ];
        let merged = merge_favourites(remote, &HashSet::from([1, 3, 99]));

        let flags: Vec<(i64, bool)> = merged.iter().map(|r| (r.id, r.is_favourite)).collect();
        // Stale `true` on id 2 is cleared, order is untouched
        assert_eq!(flags, vec![(3, true), (1, true), (2, false)]);
        assert_eq!(merged[1].title, "Soup");
    }

    #[test]
    fn test_merge_empty() {
        assert!(merge_favourites(Vec::new(), &HashSet::from([1])).is_empty());

        let merged = merge_favourites(vec![recipe(1, "Soup", true)], &HashSet::new());
        assert!(!merged[0].is_favourite);
    }

    #[test]
    fn test_merge_is_deterministic() {
        let remote = vec![recipe(1, "Soup", false), recipe(1, "Soup again", false)];
        let ids = HashSet::from([1]);
        let a = merge_favourites(remote.clone(), &ids);
        let b = merge_favourites(remote, &ids);
        assert_eq!(a, b);
        // Duplicate ids in a response are both annotated
        assert!(a.iter().all(|r| r.is_favourite));
    }

    #[test]
    fn test_chicken_scenario() {
        let merged = merge_favourites(vec![recipe(1, "Soup", false)], &HashSet::from([1]));
        assert_eq!(merged, vec![recipe(1, "Soup", true)]);
    }
}
