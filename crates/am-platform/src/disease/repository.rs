//! Disease repository

use bson::{doc, Document};
use futures::TryStreamExt;
use mongodb::{Collection, Database};
use serde::Deserialize;

use super::entity::Disease;
use crate::shared::error::Result;

const COLLECTION: &str = "diseases";

/// One row out of the name-count aggregation
#[derive(Debug, Deserialize)]
pub struct NameCountRow {
    #[serde(rename = "_id")]
    pub name: String,
    pub count: i64,
}

#[derive(Clone)]
pub struct DiseaseRepository {
    collection: Collection<Disease>,
}

impl DiseaseRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(COLLECTION),
        }
    }

    pub async fn insert(&self, disease: &Disease) -> Result<()> {
        self.collection.insert_one(disease).await?;
        Ok(())
    }

    /// All detections, newest first
    pub async fn list(&self, skip: u64, limit: u32) -> Result<Vec<Disease>> {
        let cursor = self
            .collection
            .find(doc! {})
            .sort(doc! { "createdAt": -1 })
            .skip(skip)
            .limit(limit as i64)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn recent(&self, limit: u32) -> Result<Vec<Disease>> {
        self.list(0, limit).await
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }

    /// Detection counts grouped by disease name
    pub async fn name_counts(&self) -> Result<Vec<NameCountRow>> {
        let pipeline = vec![
            doc! { "$group": {
                "_id": "$name",
                "count": { "$sum": 1 },
            } },
            doc! { "$sort": { "count": -1 } },
        ];

        let cursor = self.collection.aggregate(pipeline).await?;
        let documents: Vec<Document> = cursor.try_collect().await?;
        documents
            .into_iter()
            .map(|d| Ok(bson::from_document(d)?))
            .collect()
    }
}

// Repository tests require a MongoDB connection; the breakdown shaping
// on top of name_counts is covered in analytics.rs.
