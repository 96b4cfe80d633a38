//! Message repository

use bson::doc;
use futures::TryStreamExt;
use mongodb::{Collection, Database};

use super::entity::Message;
use crate::shared::error::Result;

const COLLECTION: &str = "messages";

#[derive(Clone)]
pub struct MessageRepository {
    collection: Collection<Message>,
}

impl MessageRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(COLLECTION),
        }
    }

    pub async fn insert(&self, message: &Message) -> Result<()> {
        self.collection.insert_one(message).await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Message>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    /// List messages, newest first
    pub async fn list(&self, skip: u64, limit: u32) -> Result<Vec<Message>> {
        let cursor = self
            .collection
            .find(doc! {})
            .sort(doc! { "createdAt": -1 })
            .skip(skip)
            .limit(limit as i64)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }
}

// Repository tests require a MongoDB connection.
