//! Index projection over canonical rows.

use itemstore_core::item::Item;
use itemstore_core::storage::IndexQuery;

/// Selects, orders and limits the rows `query` would return from its index.
///
/// Rows are ordered by the index range key; ties fall back to the primary
/// key so that results are deterministic.
pub(crate) fn project<'a, I>(rows: I, query: &IndexQuery) -> Vec<Item>
where
    I: IntoIterator<Item = &'a Item>,
{
    let mut selected: Vec<(String, &Item)> = rows
        .into_iter()
        .filter(|item| query.matches(item))
        .map(|item| (query.index.range_key_of(item), item))
        .collect();

    selected.sort_by(|(a_range, a), (b_range, b)| {
        a_range
            .cmp(b_range)
            .then_with(|| a.id.cmp(&b.id))
            .then_with(|| a.edge_id.cmp(&b.edge_id))
    });
    if query.descending {
        selected.reverse();
    }

    let limit = query.limit.unwrap_or(usize::MAX);
    selected
        .into_iter()
        .take(limit)
        .map(|(_, item)| item.clone())
        .collect()
}
