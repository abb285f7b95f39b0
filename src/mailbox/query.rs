use std::cmp::Reverse;

use crate::domain::item::ListItem;

/// Case-insensitive substring match over the item's primary text fields.
pub fn matches(item: &ListItem<'_>, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    item.search_fields()
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

/// Filter by `query`, then order newest first. `sort_by_key` is stable, so
/// equal timestamps keep collection order.
pub fn filter_and_sort<'a>(items: &[ListItem<'a>], query: &str) -> Vec<ListItem<'a>> {
    let mut out: Vec<ListItem<'a>> = items
        .iter()
        .filter(|item| matches(item, query))
        .cloned()
        .collect();
    out.sort_by_key(|item| Reverse(item.sort_timestamp));
    out
}
