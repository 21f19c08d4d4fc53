use super::types::{Identified, Section};
use std::collections::HashSet;
use tracing::debug;

/// Ids already placed during one catalog render. Only grows.
#[derive(Debug, Default)]
pub struct DedupRegistry {
    seen: HashSet<String>,
}

impl DedupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `id`; returns false when it was already placed
    pub fn claim(&mut self, id: &str) -> bool {
        if self.seen.contains(id) {
            return false;
        }
        self.seen.insert(id.to_string())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Keep each id at its first occurrence across ordered lists, including
/// repeats inside the same list. Lists keep their positions, possibly empty.
pub fn dedup<T: Identified>(sections: Vec<Vec<T>>) -> Vec<Vec<T>> {
    let mut registry = DedupRegistry::new();

    sections
        .into_iter()
        .map(|items| {
            items
                .into_iter()
                .filter(|item| registry.claim(item.id()))
                .collect()
        })
        .collect()
}

/// Rail-level deduplication for the home catalog
pub struct RailDeduplicator;

impl RailDeduplicator {
    /// Deduplicate items across sections and drop the sections left empty
    #[must_use]
    pub fn dedup_sections(sections: Vec<Section>) -> Vec<Section> {
        let mut registry = DedupRegistry::new();
        let before = sections.len();

        let kept: Vec<Section> = sections
            .into_iter()
            .map(|mut section| {
                section.items.retain(|item| registry.claim(item.id()));
                section
            })
            .filter(|section| !section.is_empty())
            .collect();

        debug!(
            "Rail dedup kept {}/{} sections, {} distinct items",
            kept.len(),
            before,
            registry.len()
        );
        kept
    }
}
