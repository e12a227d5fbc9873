use std::collections::HashMap;

use regex::Regex;
use tracing::{debug, warn};

use crate::identifier::{Identifier, IdentifierExtractor};

pub const EXTM3U_HEADER: &str = "#EXTM3U";
pub const EXTINF_PREFIX: &str = "#EXTINF:";

pub const ATTR_LOGO: &str = "tvg-logo";
pub const ATTR_TVG_ID: &str = "tvg-id";
pub const ATTR_GROUP: &str = "group-title";
pub const ATTR_LAST_FOUND: &str = "x-last-found";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Channel {
    pub name: String,
    pub logo_url: String,
    pub tvg_id: String,
    pub identifier: Identifier,
    pub category: String,
    /// Unix seconds when the channel was last seen missing from the scrape, 0 while live.
    pub last_not_found: u64,
}

impl Channel {
    pub fn new(name: impl Into<String>, identifier: Identifier) -> Self {
        Self {
            name: name.into(),
            identifier,
            ..Default::default()
        }
    }

    pub fn content_id(&self) -> Option<&str> {
        self.identifier.content_id()
    }

    pub fn infohash(&self) -> Option<&str> {
        self.identifier.infohash()
    }
}

/// Metadata carried by an `#EXTINF` line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtInf {
    pub name: String,
    pub attributes: HashMap<String, String>,
}

impl ExtInf {
    pub fn attr(&self, key: &str) -> &str {
        self.attributes.get(key).map(String::as_str).unwrap_or("")
    }
}

/// An `#EXTINF` line paired with the URL line that follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistEntry {
    pub info: ExtInf,
    pub url: String,
}

/// Byte offset of the first comma that is not inside a quoted attribute value.
fn name_separator(s: &str) -> Option<usize> {
    let mut quoted = false;
    for (idx, ch) in s.char_indices() {
        match ch {
            '"' => quoted = !quoted,
            ',' if !quoted => return Some(idx),
            _ => {}
        }
    }
    None
}

pub struct M3uParser {
    attr_re: Regex,
    extractor: IdentifierExtractor,
}

impl Default for M3uParser {
    fn default() -> Self {
        Self::new(IdentifierExtractor::default())
    }
}

impl M3uParser {
    pub fn new(extractor: IdentifierExtractor) -> Self {
        Self {
            attr_re: Regex::new(r#"([A-Za-z0-9_-]+)="([^"]*)""#).unwrap(),
            extractor,
        }
    }

    pub fn extractor(&self) -> &IdentifierExtractor {
        &self.extractor
    }

    /// Parses `#EXTINF:-1 key="value" ...,Display Name`. Returns `None` when the
    /// line has no name separator.
    pub fn parse_extinf(&self, line: &str) -> Option<ExtInf> {
        let rest = line.trim().strip_prefix(EXTINF_PREFIX)?;
        let sep = name_separator(rest)?;
        let (head, name) = (&rest[..sep], &rest[sep + 1..]);

        let attributes = self
            .attr_re
            .captures_iter(head)
            .map(|caps| (caps[1].to_string(), caps[2].to_string()))
            .collect();

        Some(ExtInf {
            name: name.trim().to_string(),
            attributes,
        })
    }

    /// Pairs every well-formed `#EXTINF` line with the next non-directive line.
    /// Directives in between (`#EXTVLCOPT` and friends) are ignored.
    pub fn parse_entries(&self, content: &str) -> Vec<PlaylistEntry> {
        let mut entries = Vec::new();
        let mut pending: Option<ExtInf> = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if line.starts_with(EXTINF_PREFIX) {
                pending = self.parse_extinf(line);
                if pending.is_none() {
                    warn!("Skipping malformed playlist entry: {}", line);
                }
            } else if line.starts_with('#') {
                continue;
            } else if let Some(info) = pending.take() {
                entries.push(PlaylistEntry {
                    info,
                    url: line.to_string(),
                });
            }
        }

        entries
    }

    /// Parses an upstream playlist into fresh, currently-live channels.
    pub fn parse_m3u(&self, content: &str) -> Vec<Channel> {
        self.parse_entries(content)
            .into_iter()
            .map(|entry| {
                let identifier = self.extractor.extract(&entry.url);
                if identifier.is_none() {
                    debug!("No stream identifier in '{}' for '{}'", entry.url, entry.info.name);
                }
                Channel {
                    logo_url: entry.info.attr(ATTR_LOGO).to_string(),
                    tvg_id: entry.info.attr(ATTR_TVG_ID).to_string(),
                    category: entry.info.attr(ATTR_GROUP).to_string(),
                    name: entry.info.name,
                    identifier,
                    last_not_found: 0,
                }
            })
            .collect()
    }
}
