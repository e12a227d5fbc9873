use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::channels::{
    Channel, ATTR_GROUP, ATTR_LAST_FOUND, ATTR_LOGO, ATTR_TVG_ID, EXTINF_PREFIX, EXTM3U_HEADER,
};
use crate::identifier::IdentifierKind;

/// Output flavours; each one renders the same channel set with a different URL prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UriScheme {
    LocalInfohash,
    LocalContentId,
    Ace,
    Horus,
}

impl UriScheme {
    pub const ALL: [UriScheme; 4] = [
        UriScheme::LocalInfohash,
        UriScheme::LocalContentId,
        UriScheme::Ace,
        UriScheme::Horus,
    ];

    pub fn name(self) -> &'static str {
        match self {
            UriScheme::LocalInfohash => "local_infohash",
            UriScheme::LocalContentId => "local_content_id",
            UriScheme::Ace => "ace",
            UriScheme::Horus => "horus",
        }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            UriScheme::LocalInfohash => "http://127.0.0.1:6878/ace/manifest.m3u8?infohash=",
            UriScheme::LocalContentId => "http://127.0.0.1:6878/ace/manifest.m3u8?content_id=",
            UriScheme::Ace => "acestream://",
            UriScheme::Horus => "plugin://script.module.horus?action=play&id=",
        }
    }

    pub fn kind(self) -> IdentifierKind {
        match self {
            UriScheme::LocalInfohash => IdentifierKind::Infohash,
            _ => IdentifierKind::ContentId,
        }
    }

    /// Playback URL for `channel`, if it carries the identifier this scheme needs.
    pub fn url_for(self, channel: &Channel) -> Option<String> {
        let id = match self.kind() {
            IdentifierKind::Infohash => channel.infohash(),
            IdentifierKind::ContentId => channel.content_id(),
        }?;
        Some(format!("{}{}", self.prefix(), id))
    }
}

pub fn playlist_path(dir: &Path, playlist_name: &str, scheme: UriScheme) -> PathBuf {
    dir.join(format!("{}_{}.m3u", playlist_name, scheme.name()))
}

fn attr_value(value: &str) -> String {
    value.replace('"', "'")
}

pub fn extinf_line(channel: &Channel) -> String {
    format!(
        r#"{}-1 {}="{}" {}="{}" {}="{}" {}="{}", {}"#,
        EXTINF_PREFIX,
        ATTR_LOGO,
        attr_value(&channel.logo_url),
        ATTR_TVG_ID,
        attr_value(&channel.tvg_id),
        ATTR_GROUP,
        attr_value(&channel.category),
        ATTR_LAST_FOUND,
        channel.last_not_found,
        channel.name
    )
}

/// Renders one playlist; channels lacking this scheme's identifier are left out.
/// Returns the text and the number of entries written.
pub fn render_playlist(channels: &[Channel], scheme: UriScheme) -> (String, usize) {
    let mut out = String::new();
    let mut count = 0;
    out.push_str(EXTM3U_HEADER);
    out.push('\n');

    for channel in channels {
        if let Some(url) = scheme.url_for(channel) {
            let _ = writeln!(out, "{}", extinf_line(channel));
            let _ = writeln!(out, "{}", url);
            count += 1;
        }
    }

    (out, count)
}

/// Writes `{playlist_name}_{scheme}.m3u` into `dir` for every scheme.
pub fn write_playlists(dir: &Path, playlist_name: &str, channels: &[Channel]) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating output directory {}", dir.display()))?;

    let mut written = Vec::new();
    for scheme in UriScheme::ALL {
        let path = playlist_path(dir, playlist_name, scheme);
        let (content, count) = render_playlist(channels, scheme);
        std::fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;
        info!("Created playlist {} with {} channels", path.display(), count);
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::Identifier;

    fn channel(name: &str, identifier: Identifier) -> Channel {
        Channel {
            name: name.to_string(),
            logo_url: "https://logos/x.png".to_string(),
            tvg_id: "x.uk".to_string(),
            identifier,
            category: "Sports".to_string(),
            last_not_found: 1700000000,
        }
    }

    #[test]
    fn test_extinf_line_format() {
        let c = channel("X [UK]", Identifier::ContentId("c".to_string()));
        assert_eq!(
            extinf_line(&c),
            r#"#EXTINF:-1 tvg-logo="https://logos/x.png" tvg-id="x.uk" group-title="Sports" x-last-found="1700000000", X [UK]"#
        );
    }

    #[test]
    fn test_render_selects_identifier_per_scheme() {
        let channels = vec![
            channel("Content", Identifier::ContentId("cid".to_string())),
            channel("Hash", Identifier::Infohash("hash".to_string())),
            channel("Nothing", Identifier::None),
        ];

        let (text, count) = render_playlist(&channels, UriScheme::LocalInfohash);
        assert_eq!(count, 1);
        assert!(text.starts_with("#EXTM3U\n"));
        assert!(text.contains("\nhttp://127.0.0.1:6878/ace/manifest.m3u8?infohash=hash\n"));
        assert!(!text.contains("Content"));

        let (text, count) = render_playlist(&channels, UriScheme::Horus);
        assert_eq!(count, 1);
        assert!(text.contains("\nplugin://script.module.horus?action=play&id=cid\n"));

        let (text, count) = render_playlist(&channels, UriScheme::Ace);
        assert_eq!(count, 1);
        assert!(text.ends_with("acestream://cid\n"));
    }

    #[test]
    fn test_empty_playlist_is_header_only() {
        let (text, count) = render_playlist(&[], UriScheme::Ace);
        assert_eq!(text, "#EXTM3U\n");
        assert_eq!(count, 0);
    }

    #[test]
    fn test_write_playlists_creates_every_scheme() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("playlists");
        let channels = vec![channel("Content", Identifier::ContentId("cid".to_string()))];

        let written = write_playlists(&out, "default", &channels).unwrap();
        assert_eq!(written.len(), 4);
        for scheme in UriScheme::ALL {
            assert!(playlist_path(&out, "default", scheme).exists());
        }
        let ace = std::fs::read_to_string(out.join("default_ace.m3u")).unwrap();
        assert!(ace.contains("acestream://cid"));
    }
}
