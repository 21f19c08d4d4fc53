use super::types::Identified;
use serde::Serialize;

/// Neighbours of the current entry in an ordered list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrevNext<T> {
    pub prev: Option<T>,
    pub next: Option<T>,
    /// Position of the current entry, `None` when absent
    pub index: Option<usize>,
    pub total: usize,
}

/// Previous and next entries around `current_id`
pub fn prev_next<T: Identified + Clone>(list: &[T], current_id: &str) -> PrevNext<T> {
    let index = list.iter().position(|x| x.id() == current_id);

    let prev = index
        .and_then(|i| i.checked_sub(1))
        .and_then(|i| list.get(i))
        .cloned();
    let next = index.and_then(|i| list.get(i + 1)).cloned();

    PrevNext {
        prev,
        next,
        index,
        total: list.len(),
    }
}
