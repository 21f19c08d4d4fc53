mod item;
mod series;

pub use item::{ContentKind, Identified, RawContentItem, Term};
pub use series::{
    GroupSource, SeeAll, SeeAllKind, Section, SeriesCandidate, SeriesCatalog, SeriesEpisode,
    SeriesGroup,
};
