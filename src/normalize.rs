use regex::Regex;
use tracing::debug;

/// Trailing `[XX]` country code, with any surrounding whitespace.
pub const COUNTRY_SUFFIX_PATTERN: &str = r"\s*\[\w{2}\]\s*$";

pub const UNKNOWN_COUNTRY: &str = "[?]";
pub const SPORTS_CATEGORY: &str = "Sports";

pub const SPORT_WORDS: &[&str] = &[
    "football",
    "soccer",
    "basketball",
    "nba",
    "sport",
    "tennis",
    "espn",
    "moto",
    "formula 1",
    "f1",
    "hockey",
    "cricket",
    "rugby",
    "golf",
    "fórmula 1",
];

/// Country code handling, literal renames and sport detection for channel names.
#[derive(Debug, Clone)]
pub struct NameNormalizer {
    country_suffix: Regex,
    tvg_id_dotted: Regex,
    tvg_id_leading: Regex,
    replacements: Vec<(String, String)>,
    sport_words: Vec<String>,
}

impl Default for NameNormalizer {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl NameNormalizer {
    pub fn new(replacements: Vec<(String, String)>) -> Self {
        Self {
            country_suffix: Regex::new(COUNTRY_SUFFIX_PATTERN).unwrap(),
            // "sport.uk"
            tvg_id_dotted: Regex::new(r"\.(\w{2})\s*$").unwrap(),
            // "UK Sport" or "UK: Sport"
            tvg_id_leading: Regex::new(r"^(\w{2})[ :]").unwrap(),
            replacements,
            sport_words: SPORT_WORDS.iter().map(|w| w.to_lowercase()).collect(),
        }
    }

    pub fn has_country_code(&self, name: &str) -> bool {
        self.country_suffix.is_match(name)
    }

    pub fn strip_country_code<'a>(&self, name: &'a str) -> std::borrow::Cow<'a, str> {
        self.country_suffix.replace(name, "")
    }

    /// `"sport.uk"` → `[UK]`, `"DE: Channel"` → `[DE]`, otherwise `[?]`.
    pub fn country_code_from_tvg_id(&self, tvg_id: &str) -> String {
        [&self.tvg_id_dotted, &self.tvg_id_leading]
            .iter()
            .find_map(|re| re.captures(tvg_id))
            .map(|caps| format!("[{}]", caps[1].to_uppercase()))
            .unwrap_or_else(|| UNKNOWN_COUNTRY.to_string())
    }

    /// Appends the country code derived from `tvg_id` unless the name already carries one.
    pub fn ensure_country_code(&self, name: &str, tvg_id: &str) -> String {
        if self.has_country_code(name) {
            return name.to_string();
        }
        format!("{} {}", name, self.country_code_from_tvg_id(tvg_id))
    }

    /// Applies every replacement in table order; later pairs see earlier results.
    pub fn apply_replacements(&self, name: &str) -> String {
        let original = name.trim();
        let replaced = self
            .replacements
            .iter()
            .fold(original.to_string(), |acc, (old, new)| {
                if acc.contains(old.as_str()) {
                    acc.replace(old.as_str(), new)
                } else {
                    acc
                }
            });

        if replaced != original {
            debug!("Replaced '{}' with '{}'", original, replaced);
        }
        replaced.trim().to_string()
    }

    pub fn is_sport(&self, name: &str) -> bool {
        let lowered = name.to_lowercase();
        self.sport_words.iter().any(|w| lowered.contains(w.as_str()))
    }

    /// `"Sky Sports [UK]"` → `"Sky Sports.uk"`. Empty when the name has no country code.
    pub fn tvg_id_from_name(&self, name: &str) -> String {
        let Some(found) = self.country_suffix.find(name) else {
            return String::new();
        };

        let code = found.as_str().replace(['[', ']'], "");
        let code = code.trim();
        let base = name.replace(&format!("[{code}]"), "");
        format!("{}.{}", base.trim(), code.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_code_from_tvg_id() {
        let n = NameNormalizer::default();
        assert_eq!(n.country_code_from_tvg_id("sport.uk"), "[UK]");
        assert_eq!(n.country_code_from_tvg_id("DE: Channel"), "[DE]");
        assert_eq!(n.country_code_from_tvg_id("es Canal"), "[ES]");
        assert_eq!(n.country_code_from_tvg_id("unknown"), "[?]");
        assert_eq!(n.country_code_from_tvg_id(""), "[?]");
    }

    #[test]
    fn test_dotted_form_wins_over_leading_form() {
        let n = NameNormalizer::default();
        assert_eq!(n.country_code_from_tvg_id("FR: Canal.es"), "[ES]");
    }

    #[test]
    fn test_ensure_country_code() {
        let n = NameNormalizer::default();
        assert_eq!(n.ensure_country_code("Sky Sports", "skysports.uk"), "Sky Sports [UK]");
        assert_eq!(n.ensure_country_code("Sky Sports", ""), "Sky Sports [?]");
        assert_eq!(n.ensure_country_code("DAZN 1 [ES]", "x.uk"), "DAZN 1 [ES]");
    }

    #[test]
    fn test_strip_country_code() {
        let n = NameNormalizer::default();
        assert_eq!(n.strip_country_code("DAZN 1 [ES] "), "DAZN 1");
        assert_eq!(n.strip_country_code("[ES] DAZN"), "[ES] DAZN");
        assert!(!n.has_country_code("Channel [?]"));
    }

    #[test]
    fn test_replacements_are_sequential() {
        let n = NameNormalizer::new(vec![
            ("Movistar".to_string(), "M+".to_string()),
            ("M+ Liga".to_string(), "M+ LaLiga".to_string()),
        ]);
        assert_eq!(n.apply_replacements("  Movistar Liga [ES] "), "M+ LaLiga [ES]");
        assert_eq!(n.apply_replacements("DAZN"), "DAZN");
    }

    #[test]
    fn test_is_sport() {
        let n = NameNormalizer::default();
        assert!(n.is_sport("NBA TV [US]"));
        assert!(n.is_sport("Fórmula 1 [ES]"));
        assert!(n.is_sport("Sky SPORTS Main Event"));
        assert!(!n.is_sport("Cartoon Network [UK]"));
    }

    #[test]
    fn test_tvg_id_from_name() {
        let n = NameNormalizer::default();
        assert_eq!(n.tvg_id_from_name("Sky Sports [UK]"), "Sky Sports.uk");
        assert_eq!(n.tvg_id_from_name("Sky Sports [?]"), "");
        assert_eq!(n.tvg_id_from_name("Sky Sports"), "");
    }
}
