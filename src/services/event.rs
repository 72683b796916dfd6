//! Event service
//!
//! CRUD over the event collection. Listings carry no classification filter:
//! every active event that has not yet passed is visible to everyone.

use bson::{doc, oid::ObjectId};
use futures_util::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use crate::db::mongo::FindOpts;
use crate::db::schemas::{EventDoc, EVENT_COLLECTION, EVENT_VIEW_COLLECTION};
use crate::db::{MongoClient, MongoCollection};
use crate::services::view_tracker::{ViewCount, ViewTracker};
use crate::services::now_ms;
use crate::types::{PortalError, Result};

/// Event as returned by the listing and create operations
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventItem {
    pub id: String,
    /// Occurrence time in ms since epoch
    pub event_dt: i64,
    pub title: String,
    pub content: String,
    pub created_by: String,
    /// Creation time in ms since epoch
    pub created_at: Option<i64>,
    /// `-1` when the count lookup failed for this item
    pub view_count: i64,
}

/// Fields accepted by create and update
#[derive(Debug, Clone)]
pub struct EventInput {
    pub event_dt: i64,
    pub title: String,
    pub content: String,
}

/// Service to handle events
#[derive(Clone)]
pub struct EventService {
    events: MongoCollection<EventDoc>,
    views: ViewTracker,
}

fn item_from_doc(event: EventDoc, view_count: i64) -> EventItem {
    EventItem {
        id: event._id.map(|id| id.to_hex()).unwrap_or_default(),
        event_dt: event.event_dt,
        title: event.title,
        content: event.content,
        created_by: event.created_by,
        created_at: event.metadata.created_at.map(|dt| dt.timestamp_millis()),
        view_count,
    }
}

fn parse_id(id: &str) -> Result<ObjectId> {
    ObjectId::parse_str(id).map_err(|_| PortalError::InvalidRequest("id".into()))
}

impl EventService {
    /// Open the event and event-view collections
    pub async fn new(mongo: &MongoClient) -> Result<Self> {
        let events = mongo.collection::<EventDoc>(EVENT_COLLECTION).await?;
        let views = ViewTracker::new(mongo, EVENT_VIEW_COLLECTION, "event").await?;
        Ok(Self { events, views })
    }

    /// Retrieve all active events that have not yet passed, newest first,
    /// with view counts attached.
    pub async fn get_all(&self) -> Result<Vec<EventItem>> {
        info!("Fetching all active events with view counts");

        let records = self
            .events
            .find_many(
                doc! { "event_dt": { "$gte": now_ms() } },
                FindOpts::newest_first(),
            )
            .await
            .map_err(|e| {
                warn!("Failed to fetch events: {}", e);
                PortalError::Unknown(e.to_string())
            })?;

        let items = join_all(records.into_iter().map(|event| async move {
            let id = event._id.map(|i| i.to_hex()).unwrap_or_default();
            let count = self.views.count_views_or_sentinel(&id).await;
            item_from_doc(event, count)
        }))
        .await;

        Ok(items)
    }

    /// Add a new event
    pub async fn create(&self, input: EventInput, created_by: &str) -> Result<EventItem> {
        info!("Creating event with title: {}", input.title);

        let mut event = EventDoc::new(
            input.event_dt,
            input.title,
            input.content,
            created_by.to_string(),
        );

        let id = self.events.insert_one(event.clone()).await.map_err(|e| {
            warn!("Failed to create event: {}", e);
            PortalError::EntityCreation(EVENT_COLLECTION.to_string())
        })?;

        event._id = Some(id);
        Ok(item_from_doc(event, 0))
    }

    /// Modify an existing event
    pub async fn update(&self, id: &str, input: EventInput, updated_by: &str) -> Result<()> {
        info!("Updating event with ID: {}", id);

        let oid = parse_id(id)?;
        let result = self
            .events
            .update_one(
                doc! { "_id": oid },
                doc! { "$set": {
                    "event_dt": input.event_dt,
                    "title": input.title,
                    "content": input.content,
                    "updated_by": updated_by,
                    "metadata.updated_at": bson::DateTime::now(),
                }},
            )
            .await?;

        if result.matched_count == 0 {
            warn!("No event found with ID: {} to update", id);
            return Err(PortalError::EntityUpdate(EVENT_COLLECTION.to_string()));
        }

        Ok(())
    }

    /// Soft delete an event; a second delete of the same id fails
    pub async fn delete(&self, id: &str, updated_by: &str) -> Result<()> {
        info!("Deleting event with ID: {}", id);

        let oid = parse_id(id)?;
        let result = self
            .events
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
            warn!("No event found with ID: {} to delete", id);
            return Err(PortalError::EntityUpdate(EVENT_COLLECTION.to_string()));
        }

        Ok(())
    }

    /// Record a view by one user (idempotent)
    pub async fn view(&self, id: &str, username: &str) -> Result<crate::db::schemas::ViewDoc> {
        self.views.record_view(id, username).await
    }

    /// Count all views of one event
    pub async fn views(&self, id: &str) -> Result<ViewCount> {
        self.views.count_views(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::Metadata;

    #[test]
    fn test_item_mapping() {
        let doc = EventDoc {
            _id: Some(ObjectId::new()),
            metadata: Metadata::new(),
            event_dt: 1_999_000_000_000,
            title: "Block party".into(),
            content: "At the void deck".into(),
            created_by: "alice".into(),
            updated_by: String::new(),
        };
        let hex = doc._id.unwrap().to_hex();

        let item = item_from_doc(doc, 4);
        assert_eq!(item.id, hex);
        assert_eq!(item.event_dt, 1_999_000_000_000);
        assert_eq!(item.view_count, 4);
    }

    #[test]
    fn test_malformed_id_is_invalid_request() {
        assert!(matches!(
            parse_id("nope"),
            Err(PortalError::InvalidRequest(_))
        ));
    }
}
