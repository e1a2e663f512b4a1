// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Change events, retrieval pages, and resumable cursors.

use serde::{Deserialize, Serialize};

use crate::document::Document;

/// What a source wants done with a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Replace the indexed document wholesale.
    Replace,
    /// Layer the carried fields over what is already indexed.
    Merge,
    /// Remove the document from the index.
    Delete,
}

/// A single change notification: an action and the document it applies to.
/// For deletes only the id field matters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub action: Action,
    pub document: Document,
}

impl Event {
    pub fn replace(document: Document) -> Self {
        Event {
            action: Action::Replace,
            document,
        }
    }

    pub fn merge(document: Document) -> Self {
        Event {
            action: Action::Merge,
            document,
        }
    }

    pub fn delete(document: Document) -> Self {
        Event {
            action: Action::Delete,
            document,
        }
    }

    /// The id of the document this event targets, if it carries one.
    pub fn id(&self) -> Option<&str> {
        self.document.id()
    }
}

/// One page of events pulled from a source, with the cursor to resume
/// from after the page is consumed.
#[derive(Debug, Clone, Default)]
pub struct DocumentPage {
    pub cursor: Option<Cursor>,
    pub events: Vec<Event>,
    pub has_next: bool,
}

impl DocumentPage {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// A resumable position in a source. The payload is an ordinary
/// [`Document`], so cursors serialize through the suffix codec and can be
/// persisted in any JSON store without losing field kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    pub id: String,
    #[serde(default)]
    pub fields: Document,
}

impl Cursor {
    pub fn new(id: impl Into<String>) -> Self {
        Cursor {
            id: id.into(),
            fields: Document::new(),
        }
    }

    pub fn with_fields(id: impl Into<String>, fields: Document) -> Self {
        Cursor {
            id: id.into(),
            fields,
        }
    }
}
