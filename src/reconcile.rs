use std::collections::HashSet;

use tracing::info;

use crate::channels::Channel;

/// Keeps the first channel for every content id and every infohash. Channels
/// without any identifier cannot collide and are always kept.
pub fn deduplicate(channels: Vec<Channel>) -> Vec<Channel> {
    let mut seen_content_ids: HashSet<String> = HashSet::new();
    let mut seen_infohashes: HashSet<String> = HashSet::new();

    channels
        .into_iter()
        .filter(|channel| {
            if let Some(id) = channel.content_id() {
                return seen_content_ids.insert(id.to_string());
            }
            if let Some(hash) = channel.infohash() {
                return seen_infohashes.insert(hash.to_string());
            }
            true
        })
        .collect()
}

/// Case-insensitive, stable sort by display name.
pub fn sort_by_name(channels: &mut [Channel]) {
    channels.sort_by_cached_key(|c| c.name.to_lowercase());
}

/// Merges live channels with resurrected ones (live first), deduplicates and sorts.
pub fn reconcile(current: Vec<Channel>, resurrected: Vec<Channel>) -> Vec<Channel> {
    let total = current.len() + resurrected.len();
    let mut merged = current;
    merged.extend(resurrected);

    let mut channels = deduplicate(merged);
    sort_by_name(&mut channels);

    info!(
        "Reconciled {} channels into {} ({} duplicates removed)",
        total,
        channels.len(),
        total - channels.len()
    );
    channels
}
