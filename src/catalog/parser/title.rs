use super::patterns::{PATTERNS, Patterns};
use crate::catalog::normalize::{clean_title, strip_series_prefix};
use regex::Regex;

/// Fragments shorter than this are too weak to group on
const MIN_FRAGMENT_CHARS: usize = 3;

/// Parsed information from a content title
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedTitle {
    /// Title with markup stripped and entities decoded
    pub cleaned: String,
    /// Series-name fragment preceding the episode marker
    pub fragment: Option<String>,
    /// Episode position (positive)
    pub episode: Option<i32>,
}

impl ParsedTitle {
    pub fn has_series_signal(&self) -> bool {
        self.fragment.is_some()
    }
}

pub struct TitleParser;

impl TitleParser {
    /// Parse a raw provider title
    #[must_use]
    pub fn parse(title: &str) -> ParsedTitle {
        let cleaned = clean_title(title);
        let patterns = &*PATTERNS;

        ParsedTitle {
            fragment: Self::extract_fragment(&cleaned, patterns),
            episode: Self::extract_episode(&cleaned, patterns),
            cleaned,
        }
    }

    /// Episode number, or `None` when no rule yields a positive 32-bit value
    #[must_use]
    pub fn parse_episode_number(title: &str) -> Option<i32> {
        Self::extract_episode(&clean_title(title), &PATTERNS)
    }

    /// Series fragment, or `None` when no marker is found or it is too short
    #[must_use]
    pub fn parse_series_fragment(title: &str) -> Option<String> {
        Self::extract_fragment(&clean_title(title), &PATTERNS)
    }

    fn extract_episode(title: &str, patterns: &Patterns) -> Option<i32> {
        let rules: [&Regex; 3] = [
            &patterns.episode_marker,
            &patterns.number_marker,
            &patterns.fraction,
        ];

        rules.iter().find_map(|rule| {
            rule.captures(title)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<i32>().ok())
                .filter(|n| *n > 0)
        })
    }

    fn extract_fragment(title: &str, patterns: &Patterns) -> Option<String> {
        let title = strip_series_prefix(title.trim());

        // Earliest keyword/number marker, else a fraction
        let marker_pos = [&patterns.episode_marker, &patterns.number_marker]
            .iter()
            .filter_map(|re| re.find(title).map(|m| m.start()))
            .min()
            .filter(|pos| *pos > 0)
            .or_else(|| patterns.fraction.find(title).map(|m| m.start()))?;

        let fragment = title[..marker_pos]
            .trim_end_matches(|c: char| c.is_whitespace() || patterns.fragment_separators.contains(&c))
            .trim_start();

        (fragment.chars().count() >= MIN_FRAGMENT_CHARS).then(|| fragment.to_string())
    }
}

/// Episode number of a raw title
pub fn parse_episode_number(title: &str) -> Option<i32> {
    TitleParser::parse_episode_number(title)
}

/// Series fragment of a raw title
pub fn parse_series_fragment(title: &str) -> Option<String> {
    TitleParser::parse_series_fragment(title)
}
