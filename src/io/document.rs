//! Generic document store client contract
//!
//! The check-in store is written against this narrow interface: insert a
//! document, query by equality predicate, merge fields into an existing
//! document. The real deployment backs it with the application's document
//! database; `MemoryDocumentClient` backs it for tests and the demo binary.

use crate::domain::types::{EventId, RecordId, UserId};
use crate::error::StoreError;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Equality predicate over the fields the check-in store filters on
#[derive(Debug, Clone, Default)]
pub struct Predicate {
    pub user_id: Option<UserId>,
    pub event_id: Option<EventId>,
    pub is_active: Option<bool>,
}

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_id(mut self, user_id: &UserId) -> Self {
        self.user_id = Some(user_id.clone());
        self
    }

    pub fn event_id(mut self, event_id: &EventId) -> Self {
        self.event_id = Some(event_id.clone());
        self
    }

    pub fn is_active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    /// Whether a stored document matches every set field
    pub fn matches(&self, doc: &Value) -> bool {
        if let Some(ref user_id) = self.user_id {
            if doc.get("user_id").and_then(Value::as_str) != Some(user_id.0.as_str()) {
                return false;
            }
        }
        if let Some(ref event_id) = self.event_id {
            if doc.get("event_id").and_then(Value::as_str) != Some(event_id.0.as_str()) {
                return false;
            }
        }
        if let Some(is_active) = self.is_active {
            if doc.get("is_active").and_then(Value::as_bool) != Some(is_active) {
                return false;
            }
        }
        true
    }
}

/// A stored document: the store-assigned id plus its fields
#[derive(Debug, Clone)]
pub struct Document {
    pub id: RecordId,
    pub fields: Value,
}

/// Client contract for the external document store
#[async_trait]
pub trait DocumentClient: Send + Sync {
    /// Insert a document; the store assigns and returns its id
    async fn insert(&self, collection: &str, doc: Value) -> Result<RecordId, StoreError>;

    /// Return all documents in the collection matching the predicate
    async fn query(&self, collection: &str, predicate: &Predicate) -> Result<Vec<Document>, StoreError>;

    /// Shallow-merge `fields` into the document with the given id
    async fn update(&self, collection: &str, id: RecordId, fields: Value) -> Result<(), StoreError>;
}

/// In-memory document store
///
/// `fail_all` flips every operation into a store error, for exercising the
/// error paths in tests.
pub struct MemoryDocumentClient {
    collections: RwLock<HashMap<String, Vec<Document>>>,
    fail_all: AtomicBool,
}

impl MemoryDocumentClient {
    pub fn new() -> Self {
        Self { collections: RwLock::new(HashMap::new()), fail_all: AtomicBool::new(false) }
    }

    /// Make every subsequent operation fail with a store error
    pub fn set_failing(&self, failing: bool) {
        self.fail_all.store(failing, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(StoreError::msg("document store unavailable"));
        }
        Ok(())
    }
}

impl Default for MemoryDocumentClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentClient for MemoryDocumentClient {
    async fn insert(&self, collection: &str, doc: Value) -> Result<RecordId, StoreError> {
        self.check_available()?;
        let id = RecordId::new();
        let mut collections = self.collections.write();
        collections
            .entry(collection.to_string())
            .or_default()
            .push(Document { id, fields: doc });
        Ok(id)
    }

    async fn query(&self, collection: &str, predicate: &Predicate) -> Result<Vec<Document>, StoreError> {
        self.check_available()?;
        let collections = self.collections.read();
        let docs = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| predicate.matches(&doc.fields))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(docs)
    }

    async fn update(&self, collection: &str, id: RecordId, fields: Value) -> Result<(), StoreError> {
        self.check_available()?;
        let mut collections = self.collections.write();
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|doc| doc.id == id))
            .ok_or_else(|| StoreError::msg(format!("no document with id {id}")))?;

        let Some(updates) = fields.as_object() else {
            return Err(StoreError::msg("update fields must be an object"));
        };
        let Some(target) = doc.fields.as_object_mut() else {
            return Err(StoreError::msg("stored document is not an object"));
        };
        for (key, value) in updates {
            target.insert(key.clone(), value.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_then_query_by_predicate() {
        let client = MemoryDocumentClient::new();
        client
            .insert("checkins", json!({"user_id": "u1", "event_id": "e1", "is_active": true}))
            .await
            .unwrap();
        client
            .insert("checkins", json!({"user_id": "u2", "event_id": "e1", "is_active": false}))
            .await
            .unwrap();

        let active = client
            .query("checkins", &Predicate::new().event_id(&EventId::from("e1")).is_active(true))
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].fields["user_id"], "u1");
    }

    #[tokio::test]
    async fn test_query_missing_collection_is_empty() {
        let client = MemoryDocumentClient::new();
        let docs = client.query("checkins", &Predicate::new()).await.unwrap();
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let client = MemoryDocumentClient::new();
        let id = client
            .insert("checkins", json!({"user_id": "u1", "is_active": true}))
            .await
            .unwrap();

        client
            .update("checkins", id, json!({"is_active": false, "checked_out_at": "2026-01-01T00:00:00Z"}))
            .await
            .unwrap();

        let docs = client.query("checkins", &Predicate::new()).await.unwrap();
        assert_eq!(docs[0].fields["is_active"], false);
        assert_eq!(docs[0].fields["user_id"], "u1");
        assert_eq!(docs[0].fields["checked_out_at"], "2026-01-01T00:00:00Z");
    }

    #[tokio::test]
    async fn test_update_unknown_id_fails() {
        let client = MemoryDocumentClient::new();
        let result = client.update("checkins", RecordId::new(), json!({})).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let client = MemoryDocumentClient::new();
        client.set_failing(true);
        assert!(client.insert("checkins", json!({})).await.is_err());
        assert!(client.query("checkins", &Predicate::new()).await.is_err());

        client.set_failing(false);
        assert!(client.insert("checkins", json!({})).await.is_ok());
    }
}
