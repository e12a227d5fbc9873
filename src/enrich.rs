use tracing::{debug, info};

use crate::channels::Channel;
use crate::logos::LogoMatcher;
use crate::normalize::{NameNormalizer, SPORTS_CATEGORY};

/// Runs the per-channel enrichment steps: country code, renames, filter, logo,
/// tvg-id and sport category.
pub struct ChannelEnricher {
    normalizer: NameNormalizer,
    logos: LogoMatcher,
    filters: Vec<String>,
}

impl ChannelEnricher {
    pub fn new(normalizer: NameNormalizer, logos: LogoMatcher, filters: Vec<String>) -> Self {
        Self {
            normalizer,
            logos,
            filters,
        }
    }

    fn passes_filter(&self, name: &str) -> bool {
        self.filters.is_empty() || self.filters.iter().any(|f| name.contains(f.as_str()))
    }

    /// Returns `None` when the channel is dropped by the filter list.
    pub fn enrich(&self, mut channel: Channel) -> Option<Channel> {
        channel.name = self
            .normalizer
            .ensure_country_code(&channel.name, &channel.tvg_id);
        channel.name = self.normalizer.apply_replacements(&channel.name);

        if !self.passes_filter(&channel.name) {
            debug!("Filtered out '{}'", channel.name);
            return None;
        }

        channel.logo_url = self.logos.find_best_match(&channel.name);

        if channel.tvg_id.is_empty() {
            channel.tvg_id = self.normalizer.tvg_id_from_name(&channel.name);
        }

        if self.normalizer.is_sport(&channel.name) {
            channel.category = SPORTS_CATEGORY.to_string();
        }

        Some(channel)
    }

    pub fn enrich_all(&self, channels: Vec<Channel>) -> Vec<Channel> {
        let total = channels.len();
        let enriched: Vec<Channel> = channels
            .into_iter()
            .filter_map(|c| self.enrich(c))
            .collect();
        info!(
            "Enriched {} channels ({} dropped by filter)",
            enriched.len(),
            total - enriched.len()
        );
        enriched
    }
}
