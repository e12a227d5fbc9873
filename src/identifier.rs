/// Stream identifier carried by a channel. A channel is addressed either by
/// its AceStream content id or by the swarm infohash, never both.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Identifier {
    ContentId(String),
    Infohash(String),
    #[default]
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    ContentId,
    Infohash,
}

impl Identifier {
    /// Builds an identifier of the given kind, mapping blank values to `None`.
    pub fn new(kind: IdentifierKind, value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() {
            return Identifier::None;
        }
        match kind {
            IdentifierKind::ContentId => Identifier::ContentId(value.to_string()),
            IdentifierKind::Infohash => Identifier::Infohash(value.to_string()),
        }
    }

    pub fn content_id(&self) -> Option<&str> {
        match self {
            Identifier::ContentId(id) => Some(id),
            _ => None,
        }
    }

    pub fn infohash(&self) -> Option<&str> {
        match self {
            Identifier::Infohash(hash) => Some(hash),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Identifier::None)
    }
}

pub const CONTENT_ID_PREFIXES: &[&str] = &[
    "acestream://",
    "http://127.0.0.1:6878/ace/getstream?id=",
    "http://127.0.0.1:6878/ace/getstream?content_id=",
    "http://127.0.0.1:6878/ace/manifest.m3u8?id=",
    "http://127.0.0.1:6878/ace/manifest.m3u8?content_id=",
    "plugin://script.module.horus?action=play&id=",
];

pub const INFOHASH_PREFIXES: &[&str] = &[
    "http://127.0.0.1:6878/ace/getstream?infohash=",
    "http://127.0.0.1:6878/ace/manifest.m3u8?infohash=",
];

/// Turns playback URLs into identifiers by ordered prefix matching.
#[derive(Debug, Clone)]
pub struct IdentifierExtractor {
    prefixes: Vec<(String, IdentifierKind)>,
}

impl Default for IdentifierExtractor {
    fn default() -> Self {
        let prefixes = CONTENT_ID_PREFIXES
            .iter()
            .map(|p| (p.to_string(), IdentifierKind::ContentId))
            .chain(
                INFOHASH_PREFIXES
                    .iter()
                    .map(|p| (p.to_string(), IdentifierKind::Infohash)),
            )
            .collect();
        Self { prefixes }
    }
}

impl IdentifierExtractor {
    /// Prefixes are tried in the given order; the first one that matches wins.
    pub fn with_prefixes(prefixes: Vec<(String, IdentifierKind)>) -> Self {
        Self { prefixes }
    }

    pub fn extract(&self, url: &str) -> Identifier {
        let url = url.trim_start();
        self.prefixes
            .iter()
            .find_map(|(prefix, kind)| {
                url.strip_prefix(prefix.as_str())
                    .map(|rest| Identifier::new(*kind, rest))
            })
            .unwrap_or_default()
    }
}
