use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::normalize::COUNTRY_SUFFIX_PATTERN;

pub const TOKEN_SORT_CUTOFF: u32 = 80;
pub const PARTIAL_CUTOFF: u32 = 75;

/// Known channel logos, kept in document order.
#[derive(Debug, Clone, Default)]
pub struct LogoCatalog {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl LogoCatalog {
    pub fn insert(&mut self, name: impl Into<String>, url: impl Into<String>) {
        let name = name.into();
        let url = url.into();
        match self.index.get(&name) {
            Some(&idx) => self.entries[idx].1 = url,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, url));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, u)| (n.as_str(), u.as_str()))
    }

    /// Reads `<region><channel name=".."><logo_url>..</logo_url></channel></region>` documents.
    /// A missing or empty file is an empty catalog. Parsing stops at the first XML
    /// error, keeping what was read so far.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!("Logo catalog {} does not exist, continuing without logos", path.display());
            return Ok(Self::default());
        }
        let xml = std::fs::read_to_string(path)
            .with_context(|| format!("reading logo catalog {}", path.display()))?;
        let catalog = Self::parse(&xml);
        info!("Loaded {} logos from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    pub fn parse(xml: &str) -> Self {
        let mut catalog = Self::default();
        if xml.trim().is_empty() {
            return catalog;
        }

        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut current: Option<(String, Option<String>)> = None;
        let mut in_logo = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"channel" => current = channel_name(&e).map(|n| (n, None)),
                    b"logo_url" => in_logo = current.is_some(),
                    _ => {}
                },
                Ok(Event::Empty(e)) => {
                    if e.name().as_ref() == b"channel" {
                        if let Some(name) = channel_name(&e) {
                            catalog.insert(name, "");
                        }
                    }
                }
                Ok(Event::Text(t)) if in_logo => {
                    // only the first logo_url of a channel counts
                    if let Some((_, logo)) = current.as_mut() {
                        if logo.is_none() {
                            let text = t.unescape().map(|s| s.trim().to_string()).unwrap_or_default();
                            *logo = Some(text);
                        }
                    }
                }
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"logo_url" => in_logo = false,
                    b"channel" => {
                        if let Some((name, logo)) = current.take() {
                            catalog.insert(name, logo.unwrap_or_default());
                        }
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => {
                    warn!(
                        "Logo catalog is malformed at byte {}: {}",
                        reader.buffer_position(),
                        e
                    );
                    break;
                }
                _ => {}
            }
        }

        catalog
    }
}

fn channel_name(e: &quick_xml::events::BytesStart) -> Option<String> {
    e.attributes()
        .filter_map(Result::ok)
        .find(|a| a.key.as_ref() == b"name")
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.to_string())
        .filter(|v| !v.is_empty())
}

/// Lowercases and replaces anything that is not alphanumeric with a space.
fn full_process(s: &str) -> String {
    let mapped: String = s
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase();
    mapped.trim().to_string()
}

fn sort_tokens(processed: &str) -> String {
    let mut tokens: Vec<&str> = processed.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut row = vec![0usize; b.len() + 1];
    for &ca in a {
        let mut diag = 0;
        for (j, &cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb { diag + 1 } else { above.max(row[j]) };
            diag = above;
        }
    }
    row[b.len()]
}

/// Indel similarity `2 * lcs / (len_a + len_b)` on a 0-100 scale.
fn ratio_chars(a: &[char], b: &[char]) -> u32 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100;
    }
    ((200 * lcs_len(a, b)) as f64 / total as f64).round() as u32
}

fn ratio(a: &str, b: &str) -> u32 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio_chars(&a, &b)
}

fn partial_processed(a: &str, b: &str) -> u32 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let (short, long) = if a_chars.len() <= b_chars.len() {
        (a_chars, b_chars)
    } else {
        (b_chars, a_chars)
    };

    let mut best = 0;
    for window in long.windows(short.len()) {
        best = best.max(ratio_chars(&short, window));
        if best == 100 {
            break;
        }
    }
    best
}

fn token_sort_processed(a_sorted: &str, b_sorted: &str) -> u32 {
    if a_sorted.is_empty() || b_sorted.is_empty() {
        return 0;
    }
    ratio(a_sorted, b_sorted)
}

/// Similarity of the sorted token sets, insensitive to word order.
pub fn token_sort_ratio(a: &str, b: &str) -> u32 {
    token_sort_processed(&sort_tokens(&full_process(a)), &sort_tokens(&full_process(b)))
}

/// Best similarity of the shorter string against every equal-length window of the longer one.
pub fn partial_ratio(a: &str, b: &str) -> u32 {
    partial_processed(&full_process(a), &full_process(b))
}

/// A catalog name in the forms the matcher compares against.
#[derive(Debug, Clone)]
struct LogoKey {
    name: String,
    url: String,
    lowered: String,
    processed: String,
    sorted: String,
}

/// Maps channel names onto catalog logos: exact match first, then fuzzy.
pub struct LogoMatcher {
    keys: Vec<LogoKey>,
    suffix_re: Regex,
}

impl LogoMatcher {
    pub fn new(catalog: LogoCatalog) -> Self {
        let keys = catalog
            .iter()
            .map(|(name, url)| {
                let processed = full_process(name);
                LogoKey {
                    name: name.to_string(),
                    url: url.to_string(),
                    lowered: name.to_lowercase(),
                    sorted: sort_tokens(&processed),
                    processed,
                }
            })
            .collect();
        Self {
            keys,
            suffix_re: Regex::new(COUNTRY_SUFFIX_PATTERN).unwrap(),
        }
    }

    fn best_by(&self, score_of: impl Fn(&LogoKey) -> u32, cutoff: u32) -> Option<(&LogoKey, u32)> {
        let mut best: Option<(&LogoKey, u32)> = None;
        for key in &self.keys {
            let score = score_of(key);
            if score >= cutoff && best.map_or(true, |(_, s)| score > s) {
                best = Some((key, score));
            }
        }
        best
    }

    /// Returns the logo URL for `name`, or an empty string when nothing is close enough.
    pub fn find_best_match(&self, name: &str) -> String {
        let name = self.suffix_re.replace(name.trim(), "");
        let name = name.as_ref();

        let lowered = name.to_lowercase();
        if let Some(key) = self.keys.iter().find(|k| k.lowered == lowered) {
            return key.url.clone();
        }

        let processed = full_process(name);
        let sorted = sort_tokens(&processed);
        let found = self
            .best_by(|k| token_sort_processed(&sorted, &k.sorted), TOKEN_SORT_CUTOFF)
            .or_else(|| self.best_by(|k| partial_processed(&processed, &k.processed), PARTIAL_CUTOFF));

        match found {
            Some((key, score)) => {
                debug!("Fuzzy logo match for '{}': '{}' (score {})", name, key.name, score);
                key.url.clone()
            }
            None => String::new(),
        }
    }
}
