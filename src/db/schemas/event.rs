//! Event document schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for events
pub const EVENT_COLLECTION: &str = "events";

/// Collection name for event view records
pub const EVENT_VIEW_COLLECTION: &str = "event_views";

/// Event document
///
/// Events carry no classification: every active, not-yet-past event is
/// visible to everyone.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct EventDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Occurrence time in ms since epoch
    pub event_dt: i64,

    pub title: String,

    pub content: String,

    /// Username of the creating actor
    #[serde(default)]
    pub created_by: String,

    /// Username of the last updating actor
    #[serde(default)]
    pub updated_by: String,
}

impl EventDoc {
    pub fn new(event_dt: i64, title: String, content: String, created_by: String) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            event_dt,
            title,
            content,
            created_by,
            updated_by: String::new(),
        }
    }

    /// Whether the event has not yet passed at the given instant (ms epoch)
    pub fn is_upcoming(&self, now_ms: i64) -> bool {
        self.event_dt >= now_ms
    }
}

impl IntoIndexes for EventDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Listing filter: upcoming events, newest first
            (
                doc! { "event_dt": 1 },
                Some(
                    IndexOptions::builder()
                        .name("event_dt_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for EventDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upcoming_boundary() {
        let event = EventDoc::new(1_000, "Block party".into(), "At the void deck".into(), "alice".into());

        assert!(event.is_upcoming(999));
        // An event happening right now still counts
        assert!(event.is_upcoming(1_000));
        assert!(!event.is_upcoming(1_001));
    }
}
