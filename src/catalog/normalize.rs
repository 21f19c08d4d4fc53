//! Text canonicalization used for every comparison in the catalog.
//!
//! Nothing produced here is meant for display: [`NormalizedKey`] only
//! exists to be compared, hashed and searched.

use super::parser::patterns::PATTERNS;
use quick_xml::escape::unescape_with;
use serde::Serialize;
use std::borrow::Cow;
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Lowercase, accent-stripped, whitespace-collapsed text
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NormalizedKey(String);

impl NormalizedKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of characters (not bytes)
    pub fn char_len(&self) -> usize {
        self.0.chars().count()
    }

    pub fn word_count(&self) -> usize {
        self.0.split(' ').filter(|w| !w.is_empty()).count()
    }

    pub fn contains(&self, other: &NormalizedKey) -> bool {
        self.0.contains(other.as_str())
    }
}

impl AsRef<str> for NormalizedKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Canonicalize text for comparison.
///
/// Lowercases, decomposes (NFD) and drops combining marks, then collapses
/// whitespace runs and trims. Idempotent.
pub fn normalize(text: &str) -> NormalizedKey {
    let stripped: String = text
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();

    NormalizedKey(collapse_whitespace(&stripped))
}

/// Strip markup and decode entities from a provider title
pub fn clean_title(raw: &str) -> String {
    let without_blocks = PATTERNS.script_block.replace_all(raw, " ");
    let without_tags = PATTERNS.html_tag.replace_all(&without_blocks, " ");
    let decoded = decode_entities(&without_tags);
    collapse_whitespace(&decoded)
}

/// URL-style slug of a text: normalized, non-alphanumerics folded to '-'
pub fn slugify(text: &str) -> String {
    let key = normalize(text);
    let mut slug = String::with_capacity(key.as_str().len());
    let mut pending_dash = false;

    for c in key.as_str().chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Remove a leading "Série:" style prefix
pub fn strip_series_prefix(name: &str) -> &str {
    match PATTERNS.series_prefix.find(name) {
        Some(m) => &name[m.end()..],
        None => name,
    }
}

/// True when `name` carries a "Série:" style prefix
pub fn has_series_prefix(name: &str) -> bool {
    PATTERNS.series_prefix.is_match(name)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode XML entities, numeric references and the HTML entities
/// WordPress emits in rendered titles. Malformed input is kept as is.
fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    match unescape_with(text, resolve_entity) {
        Ok(decoded) => Cow::Owned(decoded.into_owned()),
        Err(_) => Cow::Borrowed(text),
    }
}

fn resolve_entity(entity: &str) -> Option<&'static str> {
    let resolved = match entity {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => " ",
        "rsquo" | "lsquo" => "'",
        "ldquo" | "rdquo" => "\"",
        "laquo" => "«",
        "raquo" => "»",
        "ndash" => "–",
        "mdash" => "—",
        "hellip" => "…",
        "eacute" => "é",
        "egrave" => "è",
        "ecirc" => "ê",
        "agrave" => "à",
        "acirc" => "â",
        "ccedil" => "ç",
        "ocirc" => "ô",
        "ucirc" => "û",
        "icirc" => "î",
        "Eacute" => "É",
        _ => return None,
    };
    Some(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_accents_and_case() {
        let a = normalize("Écoute");
        let b = normalize("ecoute");
        let c = normalize("ÉCOUTE");
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.as_str(), "ecoute");
    }

    #[test]
    fn test_normalize_idempotent() {
        for text in ["  Le   Jeûne\t| EP 4 ", "École de Croissance", "ÇA VA", "İstanbul", ""] {
            let once = normalize(text);
            let twice = normalize(once.as_str());
            assert_eq!(once, twice, "not idempotent for {text:?}");
        }
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize("  la   foi \n chrétienne ").as_str(), "la foi chretienne");
    }

    #[test]
    fn test_clean_title_decodes_entities() {
        assert_eq!(clean_title("L&#8217;amour de Dieu"), "L\u{2019}amour de Dieu");
        assert_eq!(clean_title("Foi &amp; Prière"), "Foi & Prière");
        assert_eq!(clean_title("Le&nbsp;jeûne &#8211; EP 2"), "Le jeûne – EP 2");
    }

    #[test]
    fn test_clean_title_strips_markup() {
        assert_eq!(clean_title("<strong>Culte</strong> du <em>dimanche</em>"), "Culte du dimanche");
    }

    #[test]
    fn test_clean_title_keeps_malformed_entities() {
        assert_eq!(clean_title("Q&A live"), "Q&A live");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Le Jeûne"), "le-jeune");
        assert_eq!(slugify("  École de croissance!  "), "ecole-de-croissance");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn test_strip_series_prefix() {
        assert_eq!(strip_series_prefix("Série: Le jeûne"), "Le jeûne");
        assert_eq!(strip_series_prefix("serie : Foi"), "Foi");
        assert_eq!(strip_series_prefix("SERIES:Prière"), "Prière");
        assert_eq!(strip_series_prefix("Sérieux"), "Sérieux");
        assert!(has_series_prefix("Serie: x"));
        assert!(!has_series_prefix("La série"));
    }
}
