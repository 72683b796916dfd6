//! Notice document schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::auth::Classification;
use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for notices
pub const NOTICE_COLLECTION: &str = "notices";

/// Collection name for notice view records
pub const NOTICE_VIEW_COLLECTION: &str = "notice_views";

/// Notice document
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct NoticeDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Free-form notice category
    pub notice_type: String,

    pub title: String,

    pub content: String,

    /// Minimum caller clearance required to see this notice
    #[serde(default)]
    pub classification: Classification,

    /// Username of the creating actor
    #[serde(default)]
    pub created_by: String,

    /// Username of the last updating actor
    #[serde(default)]
    pub updated_by: String,
}

impl NoticeDoc {
    pub fn new(
        notice_type: String,
        title: String,
        content: String,
        classification: Classification,
        created_by: String,
    ) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            notice_type,
            title,
            content,
            classification,
            created_by,
            updated_by: String::new(),
        }
    }
}

impl IntoIndexes for NoticeDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Listing filter: active rows by classification, newest first
            (
                doc! { "classification": 1, "metadata.created_at": -1 },
                Some(
                    IndexOptions::builder()
                        .name("classification_created_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for NoticeDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_serializes_as_label() {
        let notice = NoticeDoc::new(
            "announcement".into(),
            "Lift upgrade".into(),
            "Lift A out of service".into(),
            Classification::R2,
            "alice".into(),
        );

        let json = serde_json::to_value(&notice).unwrap();
        assert_eq!(json["classification"], "R2");
        assert_eq!(json["created_by"], "alice");
    }
}
