use super::SiblingConfig;
use crate::catalog::key::SeriesKeyBuilder;
use crate::catalog::normalize::{NormalizedKey, clean_title, normalize, strip_series_prefix};
use crate::catalog::parser::TitleParser;
use crate::catalog::types::{RawContentItem, Term};
use std::collections::HashSet;

/// Slug prefixes WordPress derives from "Série:" style names
const SERIES_SLUG_PREFIXES: &[&str] = &["serie-", "series-"];

/// What a term is scored against
pub struct ScoreContext<'a> {
    pub item_slug: &'a str,
    pub title_key: &'a NormalizedKey,
    pub series_slug: Option<&'a str>,
    pub denylist: &'a HashSet<NormalizedKey>,
}

/// A (predicate, score-delta) pair
struct ScoreRule {
    applies: fn(&Term, &ScoreContext<'_>) -> bool,
    delta: i32,
}

/// Evaluated in this order, deltas summed
const TERM_SCORE_RULES: &[ScoreRule] = &[
    ScoreRule {
        applies: slug_in_item_slug,
        delta: 3,
    },
    ScoreRule {
        applies: name_in_title,
        delta: 2,
    },
    ScoreRule {
        applies: slug_is_series_slug,
        delta: 4,
    },
    ScoreRule {
        applies: is_generic,
        delta: -3,
    },
];

fn slug_in_item_slug(term: &Term, ctx: &ScoreContext<'_>) -> bool {
    !term.slug.is_empty() && ctx.item_slug.contains(term.slug.as_str())
}

fn name_in_title(term: &Term, ctx: &ScoreContext<'_>) -> bool {
    let name = term_key(term);
    !name.is_empty() && ctx.title_key.contains(&name)
}

fn slug_is_series_slug(term: &Term, ctx: &ScoreContext<'_>) -> bool {
    ctx.series_slug
        .is_some_and(|series| !series.is_empty() && strip_slug_prefix(&term.slug) == series)
}

fn is_generic(term: &Term, ctx: &ScoreContext<'_>) -> bool {
    ctx.denylist.contains(&term_key(term)) || ctx.denylist.contains(&normalize(&term.slug.replace('-', " ")))
}

/// Normalized term name without a series prefix
pub fn term_key(term: &Term) -> NormalizedKey {
    normalize(strip_series_prefix(&clean_title(&term.name)))
}

/// Term slug without a "serie-" style prefix
pub fn strip_slug_prefix(slug: &str) -> &str {
    SERIES_SLUG_PREFIXES
        .iter()
        .find_map(|prefix| slug.strip_prefix(prefix))
        .unwrap_or(slug)
}

pub fn score_term(term: &Term, ctx: &ScoreContext<'_>) -> i32 {
    TERM_SCORE_RULES
        .iter()
        .filter(|rule| (rule.applies)(term, ctx))
        .map(|rule| rule.delta)
        .sum()
}

/// Highest-scoring term at or above `min_score`; earlier terms win ties
pub fn best_term<'t>(terms: &'t [Term], ctx: &ScoreContext<'_>, min_score: i32) -> Option<&'t Term> {
    let mut best: Option<(&Term, i32)> = None;
    for term in terms {
        let score = score_term(term, ctx);
        if score >= min_score && best.is_none_or(|(_, top)| score > top) {
            best = Some((term, score));
        }
    }
    best.map(|(term, _)| term)
}

fn is_substantial(key: &NormalizedKey, config: &SiblingConfig) -> bool {
    key.char_len() >= config.containment_min_chars || key.word_count() >= config.containment_min_words
}

/// Exact equality, or reciprocal containment between substantial keys
pub fn signal_matches(focal: &NormalizedKey, other: &NormalizedKey, config: &SiblingConfig) -> bool {
    if focal.is_empty() || other.is_empty() {
        return false;
    }
    if focal == other {
        return true;
    }
    is_substantial(focal, config)
        && is_substantial(other, config)
        && (focal.contains(other) || other.contains(focal))
}

/// Series signal of a fetched item: its fragment key, else its whole title
pub fn item_signal(item: &RawContentItem, keys: &SeriesKeyBuilder) -> NormalizedKey {
    let parsed = TitleParser::parse(&item.title);
    match parsed.fragment {
        Some(fragment) => keys.build_key(&fragment),
        None => normalize(strip_series_prefix(&parsed.cleaned)),
    }
}

/// Exact fragment key of a fetched item, if it has one
pub fn item_key(item: &RawContentItem, keys: &SeriesKeyBuilder) -> Option<NormalizedKey> {
    TitleParser::parse_series_fragment(&item.title).map(|fragment| keys.build_key(&fragment))
}

/// Up to `max_tokens` distinct significant words of the fragment and slug
pub fn significant_tokens(fragment: &str, slug: &str, config: &SiblingConfig) -> Vec<String> {
    let stop_words: HashSet<NormalizedKey> = config.stop_words.iter().map(|w| normalize(w)).collect();
    let text = format!("{} {}", normalize(fragment).as_str(), normalize(&slug.replace('-', " ")).as_str());

    let mut seen = HashSet::new();
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.chars().count() >= config.token_min_len)
        .filter(|word| !word.chars().all(|c| c.is_ascii_digit()))
        .filter(|word| !stop_words.contains(&normalize(word)))
        .filter(|word| seen.insert(word.to_string()))
        .take(config.max_tokens)
        .map(str::to_string)
        .collect()
}

/// Tokens an item must contain: any one for a single token, else
/// `ceil(ratio * n)` capped at `max_token_matches`
pub fn required_token_matches(token_count: usize, config: &SiblingConfig) -> usize {
    if token_count <= 1 {
        return token_count;
    }
    let by_ratio = (config.token_match_ratio * token_count as f64).ceil() as usize;
    by_ratio.clamp(1, config.max_token_matches.max(1))
}

/// Number of tokens found in the item's title and slug
pub fn token_hits(item: &RawContentItem, tokens: &[String]) -> usize {
    let haystack = format!(
        "{} {}",
        normalize(&clean_title(&item.title)).as_str(),
        normalize(&item.slug.replace('-', " ")).as_str()
    );
    tokens.iter().filter(|t| haystack.contains(t.as_str())).count()
}
