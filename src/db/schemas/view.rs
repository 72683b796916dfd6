//! View record schema
//!
//! One record per (entity, viewer) pair, shared by notices and events. The
//! compound unique index is the idempotency guard: a concurrent double
//! insert surfaces as a duplicate-key conflict, which callers treat as
//! "already viewed".

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// View record document
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ViewDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Hex ObjectId of the viewed notice or event
    pub entity_id: String,

    /// Username of the viewer
    pub username: String,
}

impl ViewDoc {
    pub fn new(entity_id: String, username: String) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            entity_id,
            username,
        }
    }
}

impl IntoIndexes for ViewDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // At most one view record per (entity, viewer)
            (
                doc! { "entity_id": 1, "username": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("entity_viewer_unique".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for ViewDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_compound_index() {
        let indices = ViewDoc::into_indices();
        assert_eq!(indices.len(), 1);

        let (keys, opts) = &indices[0];
        assert_eq!(keys, &doc! { "entity_id": 1, "username": 1 });
        assert_eq!(opts.as_ref().unwrap().unique, Some(true));
    }
}
