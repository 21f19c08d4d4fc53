//! Title parsing: episode numbers and series fragments

pub mod patterns;
mod title;

pub use title::{ParsedTitle, TitleParser, parse_episode_number, parse_series_fragment};
