//! Identity-based set operations shared by the daily and weekly stages.

use std::collections::HashSet;

use crate::types::NewsItem;

/// Drops every item whose `(title, link)` identity was already seen.
/// The first occurrence wins and the relative order of survivors is kept.
pub fn dedup_by_identity(items: Vec<NewsItem>) -> Vec<NewsItem> {
    let mut seen: HashSet<(String, String)> = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert((item.title.clone(), item.link.clone())))
        .collect()
}

/// Unions `existing` with `incoming` and re-applies the identity invariant.
/// Representatives already in `existing` are kept over incoming copies.
pub fn merge(existing: Vec<NewsItem>, incoming: Vec<NewsItem>) -> Vec<NewsItem> {
    let mut combined = existing;
    combined.extend(incoming);
    dedup_by_identity(combined)
}

/// Stable sort by `published_at`, newest first.
pub fn sort_newest_first(items: &mut [NewsItem]) {
    items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
}
