//! Idempotent view tracking
//!
//! One tracker per viewable collection (notices, events). Recording a view
//! twice returns the existing record unchanged; the compound unique index on
//! (entity_id, username) closes the race two concurrent first views would
//! otherwise win together.

use bson::doc;
use tracing::{info, warn};

use crate::db::mongo::is_duplicate_key_error;
use crate::db::schemas::ViewDoc;
use crate::db::{MongoClient, MongoCollection};
use crate::types::{PortalError, Result};

/// View count for one entity
#[derive(Debug, serde::Serialize, PartialEq, Eq)]
pub struct ViewCount {
    pub count: i64,
}

/// Records and counts per-user views of one entity collection
#[derive(Clone)]
pub struct ViewTracker {
    views: MongoCollection<ViewDoc>,
    entity_name: &'static str,
}

impl ViewTracker {
    /// Open the view collection for one entity kind
    pub async fn new(
        mongo: &MongoClient,
        collection_name: &str,
        entity_name: &'static str,
    ) -> Result<Self> {
        let views = mongo.collection::<ViewDoc>(collection_name).await?;
        Ok(Self { views, entity_name })
    }

    /// Record that a user has seen an entity.
    ///
    /// Idempotent: an existing record is returned unchanged, whether it is
    /// found by the initial read or surfaces as a duplicate-key conflict on
    /// insert.
    pub async fn record_view(&self, entity_id: &str, username: &str) -> Result<ViewDoc> {
        let filter = doc! { "entity_id": entity_id, "username": username };

        if let Some(existing) = self.views.find_one(filter.clone()).await? {
            info!(
                "{} {} already viewed by user: {}",
                self.entity_name, entity_id, username
            );
            return Ok(existing);
        }

        info!(
            "Recording view for {} {} by user: {}",
            self.entity_name, entity_id, username
        );

        let mut view = ViewDoc::new(entity_id.to_string(), username.to_string());
        match self.views.insert_one(view.clone()).await {
            Ok(id) => {
                view._id = Some(id);
                Ok(view)
            }
            Err(e) if is_duplicate_key_error(&e) => {
                // Lost the race to a concurrent first view - return theirs
                self.views
                    .find_one(filter)
                    .await?
                    .ok_or_else(|| PortalError::EntityCreation(self.entity_name.to_string()))
            }
            Err(e) => {
                warn!("Failed to record view: {}", e);
                Err(PortalError::EntityCreation(self.entity_name.to_string()))
            }
        }
    }

    /// Count all views of an entity
    pub async fn count_views(&self, entity_id: &str) -> Result<ViewCount> {
        let count = self
            .views
            .count(doc! { "entity_id": entity_id })
            .await
            .map_err(|e| {
                warn!("Failed to count views for {}: {}", entity_id, e);
                PortalError::EntityRetrieval
            })?;

        Ok(ViewCount {
            count: count as i64,
        })
    }

    /// Per-item count for listings: a failed lookup degrades to `-1` so one
    /// bad count never takes down the whole listing.
    pub async fn count_views_or_sentinel(&self, entity_id: &str) -> i64 {
        match self.count_views(entity_id).await {
            Ok(views) => views.count,
            Err(_) => -1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_key_is_treated_as_existing() {
        // The insert-conflict branch keys off the store error shape
        let dup = PortalError::Database("Insert failed: E11000 duplicate key error".into());
        assert!(is_duplicate_key_error(&dup));
    }

    #[test]
    fn test_view_count_serialization() {
        let views = ViewCount { count: 3 };
        let json = serde_json::to_value(&views).unwrap();
        assert_eq!(json["count"], 3);
    }

    // The record/count paths against a live collection are integration
    // territory; the idempotency invariant is carried by the unique index
    // asserted in the schema tests.
}
