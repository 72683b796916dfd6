//! Notice service
//!
//! Classified CRUD over the notice collection. Listings are filtered by the
//! caller's clearance and annotated with view counts fetched concurrently,
//! one independent lookup per notice.

use bson::{doc, oid::ObjectId};
use futures_util::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use crate::auth::Classification;
use crate::db::mongo::FindOpts;
use crate::db::schemas::{NoticeDoc, NOTICE_COLLECTION, NOTICE_VIEW_COLLECTION};
use crate::db::{MongoClient, MongoCollection};
use crate::services::view_tracker::{ViewCount, ViewTracker};
use crate::types::{PortalError, Result};

/// Notice as returned by the listing and create operations
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoticeItem {
    pub id: String,
    pub notice_type: String,
    pub title: String,
    pub content: String,
    pub classification: Classification,
    pub created_by: String,
    /// Creation time in ms since epoch
    pub created_at: Option<i64>,
    /// `-1` when the count lookup failed for this item
    pub view_count: i64,
}

/// Fields accepted by create and update
#[derive(Debug, Clone)]
pub struct NoticeInput {
    pub notice_type: String,
    pub title: String,
    pub content: String,
    pub classification: Classification,
}

/// Service to handle notices
#[derive(Clone)]
pub struct NoticeService {
    notices: MongoCollection<NoticeDoc>,
    views: ViewTracker,
}

/// Keep only the notices the caller is cleared to see
fn visible_notices(notices: Vec<NoticeDoc>, caller: Classification) -> Vec<NoticeDoc> {
    let allowed = caller.visible_classifications();
    notices
        .into_iter()
        .filter(|n| allowed.contains(&n.classification))
        .collect()
}

fn item_from_doc(notice: NoticeDoc, view_count: i64) -> NoticeItem {
    NoticeItem {
        id: notice
            ._id
            .map(|id| id.to_hex())
            .unwrap_or_default(),
        notice_type: notice.notice_type,
        title: notice.title,
        content: notice.content,
        classification: notice.classification,
        created_by: notice.created_by,
        created_at: notice.metadata.created_at.map(|dt| dt.timestamp_millis()),
        view_count,
    }
}

fn parse_id(id: &str) -> Result<ObjectId> {
    ObjectId::parse_str(id).map_err(|_| PortalError::InvalidRequest("id".into()))
}

impl NoticeService {
    /// Open the notice and notice-view collections
    pub async fn new(mongo: &MongoClient) -> Result<Self> {
        let notices = mongo.collection::<NoticeDoc>(NOTICE_COLLECTION).await?;
        let views = ViewTracker::new(mongo, NOTICE_VIEW_COLLECTION, "notice").await?;
        Ok(Self { notices, views })
    }

    /// Retrieve all active notices visible to the caller, newest first, with
    /// view counts attached.
    pub async fn get_all(&self, caller: Classification) -> Result<Vec<NoticeItem>> {
        info!(
            "Fetching all active notices with view counts for classification: {}",
            caller
        );

        let records = self
            .notices
            .find_many(doc! {}, FindOpts::newest_first())
            .await
            .map_err(|e| {
                warn!("Failed to fetch notices: {}", e);
                PortalError::Unknown(e.to_string())
            })?;

        let filtered = visible_notices(records, caller);

        // Sibling count lookups are independent; a failed one degrades that
        // item to -1 instead of failing the listing
        let items = join_all(filtered.into_iter().map(|notice| async move {
            let id = notice._id.map(|i| i.to_hex()).unwrap_or_default();
            let count = self.views.count_views_or_sentinel(&id).await;
            item_from_doc(notice, count)
        }))
        .await;

        Ok(items)
    }

    /// Add a new notice
    pub async fn create(&self, input: NoticeInput, created_by: &str) -> Result<NoticeItem> {
        info!("Creating notice with title: {}", input.title);

        let mut notice = NoticeDoc::new(
            input.notice_type,
            input.title,
            input.content,
            input.classification,
            created_by.to_string(),
        );

        let id = self.notices.insert_one(notice.clone()).await.map_err(|e| {
            warn!("Failed to create notice: {}", e);
            PortalError::EntityCreation(NOTICE_COLLECTION.to_string())
        })?;

        notice._id = Some(id);
        Ok(item_from_doc(notice, 0))
    }

    /// Modify an existing notice
    pub async fn update(&self, id: &str, input: NoticeInput, updated_by: &str) -> Result<()> {
        info!("Updating notice with ID: {}", id);

        let oid = parse_id(id)?;
        let result = self
            .notices
            .update_one(
                doc! { "_id": oid },
                doc! { "$set": {
                    "notice_type": input.notice_type,
                    "title": input.title,
                    "content": input.content,
                    "classification": input.classification.label(),
                    "updated_by": updated_by,
                    "metadata.updated_at": bson::DateTime::now(),
                }},
            )
            .await?;

        if result.matched_count == 0 {
            warn!("No notice found with ID: {} to update", id);
            return Err(PortalError::EntityUpdate(NOTICE_COLLECTION.to_string()));
        }

        Ok(())
    }

    /// Soft delete a notice.
    ///
    /// Deleting an id with no matching active row is an error, not a no-op,
    /// so a second delete of the same notice fails.
    pub async fn delete(&self, id: &str, updated_by: &str) -> Result<()> {
        info!("Deleting notice with ID: {}", id);

        let oid = parse_id(id)?;
        let result = self
            .notices
            .update_one(
                doc! { "_id": oid },
                doc! { "$set": {
                    "metadata.is_deleted": true,
                    "metadata.deleted_at": bson::DateTime::now(),
                    "metadata.updated_at": bson::DateTime::now(),
                    "updated_by": updated_by,
                }},
            )
            .await?;

        if result.matched_count == 0 {
            warn!("No notice found with ID: {} to delete", id);
            return Err(PortalError::EntityUpdate(NOTICE_COLLECTION.to_string()));
        }

        Ok(())
    }

    /// Record a view by one user (idempotent)
    pub async fn view(&self, id: &str, username: &str) -> Result<crate::db::schemas::ViewDoc> {
        self.views.record_view(id, username).await
    }

    /// Count all views of one notice
    pub async fn views(&self, id: &str) -> Result<ViewCount> {
        self.views.count_views(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::Metadata;

    fn notice(classification: Classification) -> NoticeDoc {
        NoticeDoc {
            _id: Some(ObjectId::new()),
            metadata: Metadata::new(),
            notice_type: "announcement".into(),
            title: format!("{} notice", classification),
            content: "content".into(),
            classification,
            created_by: "alice".into(),
            updated_by: String::new(),
        }
    }

    #[test]
    fn test_visibility_filter_by_clearance() {
        let records = vec![
            notice(Classification::R1),
            notice(Classification::R3),
            notice(Classification::Open),
        ];

        // R2 sees OPEN and R1 but not R3
        let visible = visible_notices(records.clone(), Classification::R2);
        assert_eq!(visible.len(), 2);
        assert!(visible
            .iter()
            .all(|n| n.classification <= Classification::R2));

        // OPEN sees only OPEN
        let visible = visible_notices(records.clone(), Classification::Open);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].classification, Classification::Open);

        // R4 sees everything
        let visible = visible_notices(records, Classification::R4);
        assert_eq!(visible.len(), 3);
    }

    #[test]
    fn test_item_mapping() {
        let doc = notice(Classification::R1);
        let hex = doc._id.unwrap().to_hex();

        let item = item_from_doc(doc, 7);
        assert_eq!(item.id, hex);
        assert_eq!(item.view_count, 7);
        assert_eq!(item.classification, Classification::R1);
        assert!(item.created_at.is_some());
    }

    #[test]
    fn test_view_count_sentinel_serialization() {
        let item = item_from_doc(notice(Classification::Open), -1);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["viewCount"], -1);
        assert_eq!(json["classification"], "OPEN");
    }

    #[test]
    fn test_malformed_id_is_invalid_request() {
        assert!(matches!(
            parse_id("not-an-object-id"),
            Err(PortalError::InvalidRequest(_))
        ));
        assert!(parse_id(&ObjectId::new().to_hex()).is_ok());
    }
}
