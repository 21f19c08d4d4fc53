use super::key::SeriesKeyBuilder;
use super::normalize::{NormalizedKey, clean_title, normalize};
use super::parser::TitleParser;
use super::provider::Playlist;
use super::types::{ContentKind, GroupSource, RawContentItem, SeriesCandidate, SeriesEpisode, SeriesGroup};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Categories that never reinforce a series
const DEFAULT_IGNORED_CATEGORIES: &[&str] = &["non classe", "non classé", "uncategorized"];

/// A representative rule decides between two episodes, or defers to the next rule
type RepresentativeRule = fn(&SeriesEpisode, &SeriesEpisode) -> Option<Ordering>;

/// Evaluated in order; `Less` means the left episode wins
const REPRESENTATIVE_RULES: &[RepresentativeRule] =
    &[by_episode_number, by_numbered, by_publication, by_id];

/// Both numbered and different: smaller number
fn by_episode_number(a: &SeriesEpisode, b: &SeriesEpisode) -> Option<Ordering> {
    match (a.episode_number, b.episode_number) {
        (Some(x), Some(y)) if x != y => Some(x.cmp(&y)),
        _ => None,
    }
}

/// Exactly one numbered: the numbered one
fn by_numbered(a: &SeriesEpisode, b: &SeriesEpisode) -> Option<Ordering> {
    match (a.episode_number, b.episode_number) {
        (Some(_), None) => Some(Ordering::Less),
        (None, Some(_)) => Some(Ordering::Greater),
        _ => None,
    }
}

fn by_publication(a: &SeriesEpisode, b: &SeriesEpisode) -> Option<Ordering> {
    (a.item.published_at != b.item.published_at)
        .then(|| a.item.published_at.cmp(&b.item.published_at))
}

fn by_id(a: &SeriesEpisode, b: &SeriesEpisode) -> Option<Ordering> {
    Some(a.item.id.cmp(&b.item.id))
}

fn compare_representatives(a: &SeriesEpisode, b: &SeriesEpisode) -> Ordering {
    REPRESENTATIVE_RULES
        .iter()
        .find_map(|rule| rule(a, b))
        .unwrap_or(Ordering::Equal)
}

/// Numbered episodes ascending, then unnumbered ones by date
fn compare_episode_order(a: &SeriesEpisode, b: &SeriesEpisode) -> Ordering {
    match (a.episode_number, b.episode_number) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.item.published_at.cmp(&b.item.published_at))
    .then_with(|| a.item.id.cmp(&b.item.id))
}

/// Longest name wins, ties go to the lexicographically smaller one
fn better_name(candidate: &str, current: &str) -> bool {
    match candidate.chars().count().cmp(&current.chars().count()) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => candidate < current,
    }
}

/// Group under construction
struct GroupBuilder {
    key: NormalizedKey,
    canonical_name: String,
    episodes: Vec<SeriesEpisode>,
    representative: usize,
}

impl GroupBuilder {
    fn new(key: NormalizedKey, canonical_name: String) -> Self {
        Self {
            key,
            canonical_name,
            episodes: Vec::new(),
            representative: 0,
        }
    }

    fn offer_name(&mut self, name: &str) {
        if better_name(name, &self.canonical_name) {
            self.canonical_name = name.to_string();
        }
    }

    fn add(&mut self, episode: SeriesEpisode) {
        if self.episodes.iter().any(|ep| ep.item.id == episode.item.id) {
            return;
        }

        self.episodes.push(episode);
        let newest = self.episodes.len() - 1;
        if newest == 0
            || compare_representatives(&self.episodes[newest], &self.episodes[self.representative])
                == Ordering::Less
        {
            self.representative = newest;
        }
    }

    fn finish(mut self) -> SeriesGroup {
        let representative = self.episodes[self.representative].item.clone();
        self.episodes.sort_by(compare_episode_order);

        SeriesGroup {
            canonical_name: self.canonical_name,
            key: self.key,
            episodes: self.episodes,
            representative,
            source: GroupSource::Cms,
        }
    }
}

/// Groups a batch of items into series by their title-derived key
#[derive(Debug, Clone)]
pub struct SeriesAggregator {
    keys: SeriesKeyBuilder,
    skip_text_items: bool,
    ignored_categories: HashSet<NormalizedKey>,
}

impl SeriesAggregator {
    pub fn new(keys: SeriesKeyBuilder) -> Self {
        Self {
            keys,
            skip_text_items: false,
            ignored_categories: DEFAULT_IGNORED_CATEGORIES.iter().map(|c| normalize(c)).collect(),
        }
    }

    /// Builder pattern: exclude text-only posts from aggregation
    pub fn with_skip_text_items(mut self, skip: bool) -> Self {
        self.skip_text_items = skip;
        self
    }

    /// Builder pattern: extra categories that never reinforce a series
    pub fn with_ignored_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ignored_categories
            .extend(categories.into_iter().map(|c| normalize(c.as_ref())));
        self
    }

    pub fn keys(&self) -> &SeriesKeyBuilder {
        &self.keys
    }

    /// Title-derived candidate for one item
    pub fn candidate(&self, item: &RawContentItem) -> Option<SeriesCandidate> {
        let parsed = TitleParser::parse(&item.title);
        let fragment = parsed.fragment?;
        let key = self.keys.build_key(&fragment);
        if key.is_empty() {
            return None;
        }
        Some(SeriesCandidate::new(fragment, key, parsed.episode, item.clone()))
    }

    /// Group items into series. Items without a series signal are left out;
    /// output is ordered by canonical name, case- and accent-insensitively.
    pub fn aggregate(&self, items: &[RawContentItem]) -> Vec<SeriesGroup> {
        let candidates: Vec<SeriesCandidate> = items
            .iter()
            .filter(|item| !(self.skip_text_items && item.kind == ContentKind::Text))
            .filter_map(|item| self.candidate(item))
            .collect();

        let mut groups: HashMap<NormalizedKey, GroupBuilder> = HashMap::new();

        for candidate in &candidates {
            let name = self.keys.canonical_name(&candidate.raw_fragment);
            let group = groups
                .entry(candidate.key.clone())
                .or_insert_with(|| GroupBuilder::new(candidate.key.clone(), name.clone()));
            group.offer_name(&name);
            group.add(SeriesEpisode {
                episode_number: candidate.episode_number,
                item: candidate.item.clone(),
            });
        }

        self.reinforce_from_categories(&candidates, &mut groups);

        let mut series: Vec<SeriesGroup> = groups.into_values().map(GroupBuilder::finish).collect();
        series.sort_by_cached_key(|g| (normalize(&g.canonical_name), g.canonical_name.clone()));

        debug!("Aggregated {} items into {} series", items.len(), series.len());
        series
    }

    /// Add items to existing groups named by one of their categories
    fn reinforce_from_categories(
        &self,
        candidates: &[SeriesCandidate],
        groups: &mut HashMap<NormalizedKey, GroupBuilder>,
    ) {
        for candidate in candidates {
            let title_key = normalize(&clean_title(&candidate.item.title));

            for category in &candidate.item.categories {
                if self.ignored_categories.contains(&normalize(&category.name)) {
                    continue;
                }

                let category_key = self.keys.build_key(&clean_title(&category.name));
                if category_key.is_empty() || !title_key.contains(&category_key) {
                    continue;
                }

                if let Some(group) = groups.get_mut(&category_key) {
                    group.offer_name(&self.keys.canonical_name(&clean_title(&category.name)));
                    group.add(SeriesEpisode {
                        episode_number: candidate.episode_number,
                        item: candidate.item.clone(),
                    });
                }
            }
        }
    }

    /// A playlist is already a single series; episodes are ordered and the
    /// representative chosen as for CMS groups
    pub fn from_playlist(&self, playlist: &Playlist) -> Option<SeriesGroup> {
        let mut episodes: Vec<SeriesEpisode> = playlist
            .items
            .iter()
            .map(|item| SeriesEpisode {
                episode_number: TitleParser::parse_episode_number(&item.title),
                item: item.clone(),
            })
            .collect();
        let representative = episodes
            .iter()
            .min_by(|a, b| compare_representatives(a, b))?
            .item
            .clone();
        episodes.sort_by(compare_episode_order);

        Some(SeriesGroup {
            canonical_name: clean_title(&playlist.title),
            key: self.keys.build_key(&clean_title(&playlist.title)),
            episodes,
            representative,
            source: GroupSource::Playlist {
                id: playlist.id.clone(),
            },
        })
    }

    /// Playlist groups first, then CMS groups, at most `max` in total.
    /// A CMS group sharing a key with a playlist is dropped.
    pub fn merge_with_playlists(
        playlists: Vec<SeriesGroup>,
        cms: Vec<SeriesGroup>,
        max: usize,
    ) -> Vec<SeriesGroup> {
        let mut merged: Vec<SeriesGroup> = playlists.into_iter().take(max).collect();
        let taken: HashSet<NormalizedKey> = merged.iter().map(|g| g.key.clone()).collect();
        let remaining = max.saturating_sub(merged.len());

        merged.extend(
            cms.into_iter()
                .filter(|g| !taken.contains(&g.key))
                .take(remaining),
        );
        merged
    }
}

impl Default for SeriesAggregator {
    fn default() -> Self {
        Self::new(SeriesKeyBuilder::default())
    }
}
