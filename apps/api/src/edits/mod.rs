//! Typed field mutators for the editable documents.
//!
//! Every mutator takes the current document by reference and returns a new
//! one; nothing is edited in place.

pub mod application;
pub mod resume;

use serde::de::DeserializeOwned;
use thiserror::Error;
use uuid::Uuid;

use crate::models::Identified;

#[derive(Debug, Error, PartialEq)]
pub enum MutationError {
    #[error("no {kind} entry with id {id}")]
    UnknownEntry { kind: &'static str, id: Uuid },

    #[error("{kind} entry {id} already exists")]
    DuplicateEntry { kind: &'static str, id: Uuid },

    #[error("position {position} is out of range for {len} {kind} entries")]
    OutOfRange {
        kind: &'static str,
        position: usize,
        len: usize,
    },

    #[error("{0}")]
    Invalid(String),
}

/// A document shape with its own vocabulary of edits.
pub trait Editable: Sized {
    type Mutation: DeserializeOwned + Send + 'static;

    fn apply(&self, mutation: Self::Mutation) -> Result<Self, MutationError>;
}

pub(crate) fn add_entry<T: Identified + Clone>(
    list: &[T],
    entry: T,
    kind: &'static str,
) -> Result<Vec<T>, MutationError> {
    if list.iter().any(|e| e.id() == entry.id()) {
        return Err(MutationError::DuplicateEntry {
            kind,
            id: entry.id(),
        });
    }
    let mut next = list.to_vec();
    next.push(entry);
    Ok(next)
}

pub(crate) fn update_entry<T: Identified + Clone>(
    list: &[T],
    entry: T,
    kind: &'static str,
) -> Result<Vec<T>, MutationError> {
    let index = position_of(list, entry.id(), kind)?;
    let mut next = list.to_vec();
    next[index] = entry;
    Ok(next)
}

pub(crate) fn remove_entry<T: Identified + Clone>(
    list: &[T],
    id: Uuid,
    kind: &'static str,
) -> Result<Vec<T>, MutationError> {
    let index = position_of(list, id, kind)?;
    let mut next = list.to_vec();
    next.remove(index);
    Ok(next)
}

/// Moves the entry with `id` so it ends up at index `to`.
pub(crate) fn move_entry<T: Identified + Clone>(
    list: &[T],
    id: Uuid,
    to: usize,
    kind: &'static str,
) -> Result<Vec<T>, MutationError> {
    let from = position_of(list, id, kind)?;
    if to >= list.len() {
        return Err(MutationError::OutOfRange {
            kind,
            position: to,
            len: list.len(),
        });
    }
    let mut next = list.to_vec();
    let entry = next.remove(from);
    next.insert(to, entry);
    Ok(next)
}

fn position_of<T: Identified>(
    list: &[T],
    id: Uuid,
    kind: &'static str,
) -> Result<usize, MutationError> {
    list.iter()
        .position(|e| e.id() == id)
        .ok_or(MutationError::UnknownEntry { kind, id })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item(Uuid, &'static str);

    impl Identified for Item {
        fn id(&self) -> Uuid {
            self.0
        }
    }

    fn items() -> Vec<Item> {
        vec![
            Item(Uuid::new_v4(), "a"),
            Item(Uuid::new_v4(), "b"),
            Item(Uuid::new_v4(), "c"),
        ]
    }

    fn labels(list: &[Item]) -> Vec<&'static str> {
        list.iter().map(|i| i.1).collect()
    }

    #[test]
    fn test_move_entry_forward_and_back() {
        let list = items();
        let moved = move_entry(&list, list[0].0, 2, "item").unwrap();
        assert_eq!(labels(&moved), vec!["b", "c", "a"]);
        let back = move_entry(&moved, list[0].0, 0, "item").unwrap();
        assert_eq!(labels(&back), vec!["a", "b", "c"]);
        // original untouched
        assert_eq!(labels(&list), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_move_entry_out_of_range() {
        let list = items();
        let err = move_entry(&list, list[0].0, 3, "item").unwrap_err();
        assert_eq!(
            err,
            MutationError::OutOfRange {
                kind: "item",
                position: 3,
                len: 3
            }
        );
    }

    #[test]
    fn test_add_duplicate_rejected() {
        let list = items();
        let dup = list[1].clone();
        assert!(matches!(
            add_entry(&list, dup, "item"),
            Err(MutationError::DuplicateEntry { .. })
        ));
    }

    #[test]
    fn test_update_and_remove_unknown_id() {
        let list = items();
        let stranger = Item(Uuid::new_v4(), "z");
        assert!(matches!(
            update_entry(&list, stranger.clone(), "item"),
            Err(MutationError::UnknownEntry { .. })
        ));
        assert!(matches!(
            remove_entry(&list, stranger.0, "item"),
            Err(MutationError::UnknownEntry { .. })
        ));
    }

    #[test]
    fn test_update_replaces_in_place() {
        let list = items();
        let updated = update_entry(&list, Item(list[1].0, "B"), "item").unwrap();
        assert_eq!(labels(&updated), vec!["a", "B", "c"]);
    }
}
