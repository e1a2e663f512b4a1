// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Per-id event reduction.
//!
//! A push batch may carry several events for the same document. Before
//! anything reaches the backend the batch is folded into at most one
//! pending operation per id:
//!
//! - DELETE clears any pending replace/merge for the id and joins the
//!   delete set.
//! - REPLACE discards a pending merge; the replace carries the whole
//!   document, so earlier partial updates are moot.
//! - MERGE layers over a pending merge, or consumes a pending replace as
//!   its merge base: the combined document moves to the merge set, so it
//!   resolves through fetch-then-merge and indexed fields absent from
//!   both events still survive. With nothing pending it starts fresh.
//!
//! Deletes always execute before upserts, so a delete followed by a
//! replace of the same id nets out to the replaced document.

use indexmap::IndexMap;

use crate::backend::BackendError;
use crate::document::{Action, Document, Event};

/// The folded form of an event batch.
#[derive(Debug, Default)]
pub struct Reduction {
    /// Ids to delete, in arrival order. May contain duplicates; blank
    /// ids are caught later, before the network call.
    pub deletes: Vec<String>,
    /// Full documents to write, keyed by id.
    pub replaces: IndexMap<String, Document>,
    /// Partial documents to merge onto the indexed state, keyed by id.
    pub merges: IndexMap<String, Document>,
}

/// Fold an event batch into one pending operation per document id.
///
/// Replace and merge events must carry an id; delete events without one
/// surface later as a blank-id precondition error.
pub fn reduce_events(events: &[Event]) -> Result<Reduction, BackendError> {
    let mut reduction = Reduction::default();
    for event in events {
        match event.action {
            Action::Delete => {
                let id = event.id().unwrap_or_default().to_string();
                reduction.replaces.shift_remove(&id);
                reduction.merges.shift_remove(&id);
                reduction.deletes.push(id);
            }
            Action::Replace => {
                let id = event.id().ok_or(BackendError::MissingId)?.to_string();
                reduction.merges.shift_remove(&id);
                reduction.replaces.insert(id, event.document.clone());
            }
            Action::Merge => {
                let id = event.id().ok_or(BackendError::MissingId)?.to_string();
                if let Some(pending) = reduction.merges.get(&id) {
                    let layered = pending.to_builder().fields(&event.document).build();
                    reduction.merges.insert(id, layered);
                } else if let Some(base) = reduction.replaces.shift_remove(&id) {
                    let folded = base.to_builder().fields(&event.document).build();
                    reduction.merges.insert(id, folded);
                } else {
                    reduction.merges.insert(id, event.document.clone());
                }
            }
        }
    }
    Ok(reduction)
}
