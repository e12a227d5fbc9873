use std::collections::HashSet;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::channels::{Channel, M3uParser, ATTR_GROUP, ATTR_LAST_FOUND, ATTR_LOGO, ATTR_TVG_ID};
use crate::playlist::{playlist_path, UriScheme};

pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(3 * 24 * 60 * 60);

/// Clock and staleness window for one run.
#[derive(Debug, Clone, Copy)]
pub struct RunContext {
    pub now: SystemTime,
    pub stale_after: Duration,
}

impl RunContext {
    pub fn new(now: SystemTime, stale_after: Duration) -> Self {
        Self { now, stale_after }
    }

    pub fn now_secs(&self) -> u64 {
        self.now
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }

    /// A channel is expired once it has been missing for strictly longer than the window.
    /// Channels that were never marked missing (`0`) are not expired, nor are stamps
    /// past the end of `SystemTime`, which always lie ahead of the clock.
    pub fn is_expired(&self, last_not_found: u64) -> bool {
        if last_not_found == 0 {
            return false;
        }
        let Some(marked) = UNIX_EPOCH.checked_add(Duration::from_secs(last_not_found)) else {
            return false;
        };
        self.now
            .duration_since(marked)
            .map(|missing_for| missing_for > self.stale_after)
            .unwrap_or(false)
    }
}

/// Channels reconstructed from the playlists written by earlier runs.
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    channels: Vec<Channel>,
}

impl HistoryStore {
    pub fn from_channels(channels: Vec<Channel>) -> Self {
        Self { channels }
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Reads every `{playlist_name}_{scheme}.m3u` in `dir`. Missing files are skipped.
    pub fn load(dir: &Path, playlist_name: &str, parser: &M3uParser) -> Result<Self> {
        let mut channels = Vec::new();
        for scheme in UriScheme::ALL {
            let path = playlist_path(dir, playlist_name, scheme);
            if !path.exists() {
                warn!("Previous playlist {} does not exist", path.display());
                continue;
            }
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("reading previous playlist {}", path.display()))?;
            channels.extend(Self::parse_playlist(&content, parser));
        }

        info!("Loaded {} previous channels from files", channels.len());
        Ok(Self { channels })
    }

    /// Entries without a usable identifier or with a garbled `x-last-found` are skipped.
    pub fn parse_playlist(content: &str, parser: &M3uParser) -> Vec<Channel> {
        parser
            .parse_entries(content)
            .into_iter()
            .filter_map(|entry| {
                let identifier = parser.extractor().extract(&entry.url);
                if identifier.is_none() {
                    warn!(
                        "Skipping previous entry '{}': no stream identifier in {}",
                        entry.info.name, entry.url
                    );
                    return None;
                }

                let last_found = entry.info.attr(ATTR_LAST_FOUND);
                let last_not_found = if last_found.is_empty() {
                    0
                } else {
                    match last_found.parse::<u64>() {
                        Ok(ts) if UNIX_EPOCH.checked_add(Duration::from_secs(ts)).is_some() => ts,
                        _ => {
                            warn!(
                                "Skipping previous entry '{}': bad {} value '{}'",
                                entry.info.name, ATTR_LAST_FOUND, last_found
                            );
                            return None;
                        }
                    }
                };

                Some(Channel {
                    logo_url: entry.info.attr(ATTR_LOGO).to_string(),
                    tvg_id: entry.info.attr(ATTR_TVG_ID).to_string(),
                    category: entry.info.attr(ATTR_GROUP).to_string(),
                    name: entry.info.name,
                    identifier,
                    last_not_found,
                })
            })
            .collect()
    }

    /// Previous channels absent from `current` that are still inside the staleness
    /// window, stamped as missing at `ctx.now`.
    pub fn missing_channels(&self, current: &[Channel], ctx: &RunContext) -> Vec<Channel> {
        let content_ids: HashSet<&str> = current.iter().filter_map(Channel::content_id).collect();
        let infohashes: HashSet<&str> = current.iter().filter_map(Channel::infohash).collect();

        let mut missing = Vec::new();
        let mut expired = 0;

        for previous in &self.channels {
            let found = previous.content_id().is_some_and(|id| content_ids.contains(id))
                || previous.infohash().is_some_and(|hash| infohashes.contains(hash));
            if found {
                continue;
            }

            if ctx.is_expired(previous.last_not_found) {
                debug!(
                    "Channel '{}' has been missing since {}, dropping it",
                    previous.name, previous.last_not_found
                );
                expired += 1;
                continue;
            }

            debug!("Channel '{}' is missing from the current scrape, keeping it", previous.name);
            let mut resurrected = previous.clone();
            resurrected.last_not_found = ctx.now_secs();
            missing.push(resurrected);
        }

        info!(
            "Added {} missing channels, ignored {} from previous scrape",
            missing.len(),
            expired
        );
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::Identifier;

    const T0: u64 = 1_760_000_000;

    fn ctx_at(secs: u64, micros: u64) -> RunContext {
        RunContext::new(
            UNIX_EPOCH + Duration::from_secs(secs) + Duration::from_micros(micros),
            DEFAULT_STALE_AFTER,
        )
    }

    fn previous(name: &str, identifier: Identifier, last_not_found: u64) -> Channel {
        Channel {
            last_not_found,
            ..Channel::new(name, identifier)
        }
    }

    #[test]
    fn test_parse_playlist() {
        let content = r#"#EXTM3U
#EXTINF:-1 tvg-logo="https://logos/a.png" tvg-id="a.uk" group-title="Sports" x-last-found="1700000000", A [UK]
acestream://aaa
#EXTINF:-1 tvg-logo="" tvg-id="" group-title="" x-last-found="0", B [?]
http://127.0.0.1:6878/ace/manifest.m3u8?infohash=bbb
#EXTINF:-1 x-last-found="soon", Garbled
acestream://ccc
#EXTINF:-1 tvg-id="d.es" no separator
acestream://ddd
#EXTINF:-1,No Identifier
http://example.com/stream
#EXTINF:-1,Legacy Entry
acestream://eee
"#;
        let channels = HistoryStore::parse_playlist(content, &M3uParser::default());
        assert_eq!(channels.len(), 3);

        assert_eq!(channels[0].name, "A [UK]");
        assert_eq!(channels[0].logo_url, "https://logos/a.png");
        assert_eq!(channels[0].tvg_id, "a.uk");
        assert_eq!(channels[0].category, "Sports");
        assert_eq!(channels[0].content_id(), Some("aaa"));
        assert_eq!(channels[0].last_not_found, 1700000000);

        assert_eq!(channels[1].infohash(), Some("bbb"));
        assert_eq!(channels[1].last_not_found, 0);

        assert_eq!(channels[2].name, "Legacy Entry");
        assert_eq!(channels[2].last_not_found, 0);
    }

    #[test]
    fn test_staleness_boundary() {
        let window = DEFAULT_STALE_AFTER.as_secs();
        let last = T0;

        assert!(!ctx_at(last + window, 0).is_expired(last));
        assert!(ctx_at(last + window, 1).is_expired(last));
        assert!(!ctx_at(last + window + 10, 0).is_expired(0));
        // clock behind the marker
        assert!(!ctx_at(last - 5, 0).is_expired(last));
    }

    #[test]
    fn test_out_of_range_timestamps() {
        let parser = M3uParser::default();
        let content = "#EXTM3U\n#EXTINF:-1 x-last-found=\"18446744073709551615\", Far Future\nacestream://fff\n";
        assert!(HistoryStore::parse_playlist(content, &parser).is_empty());

        assert!(!ctx_at(T0, 0).is_expired(u64::MAX));

        let store = HistoryStore::from_channels(vec![previous(
            "Far Future",
            Identifier::ContentId("fff".to_string()),
            u64::MAX,
        )]);
        let missing = store.missing_channels(&[], &ctx_at(T0, 0));
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].last_not_found, T0);
    }

    #[test]
    fn test_present_channels_are_not_returned() {
        let store = HistoryStore::from_channels(vec![
            previous("Live by content id", Identifier::ContentId("c1".to_string()), 0),
            previous("Live by infohash", Identifier::Infohash("h1".to_string()), T0),
        ]);
        let current = vec![
            Channel::new("Renamed", Identifier::ContentId("c1".to_string())),
            Channel::new("Other", Identifier::Infohash("h1".to_string())),
        ];

        assert!(store.missing_channels(&current, &ctx_at(T0, 0)).is_empty());
    }

    #[test]
    fn test_identifier_axes_do_not_cross() {
        let store = HistoryStore::from_channels(vec![previous(
            "Hash",
            Identifier::Infohash("same".to_string()),
            0,
        )]);
        let current = vec![Channel::new("Content", Identifier::ContentId("same".to_string()))];

        let missing = store.missing_channels(&current, &ctx_at(T0, 0));
        assert_eq!(missing.len(), 1);
    }

    #[test]
    fn test_missing_channel_is_stamped() {
        let store = HistoryStore::from_channels(vec![previous(
            "Gone",
            Identifier::ContentId("gone".to_string()),
            0,
        )]);

        let missing = store.missing_channels(&[], &ctx_at(T0, 250));
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].name, "Gone");
        assert_eq!(missing[0].last_not_found, T0);
        // the store itself is untouched
        assert_eq!(store.channels()[0].last_not_found, 0);
    }

    #[test]
    fn test_stale_channel_is_evicted() {
        let window = DEFAULT_STALE_AFTER.as_secs();
        let store = HistoryStore::from_channels(vec![
            previous("Recent", Identifier::ContentId("r".to_string()), T0),
            previous("Old", Identifier::ContentId("o".to_string()), T0 - 1),
        ]);

        let missing = store.missing_channels(&[], &ctx_at(T0 + window, 0));
        let names: Vec<&str> = missing.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Recent"]);
        assert_eq!(missing[0].last_not_found, T0 + window);
    }

    #[test]
    fn test_load_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = HistoryStore::load(dir.path(), "default", &M3uParser::default()).unwrap();
        assert!(store.channels().is_empty());
    }
}
