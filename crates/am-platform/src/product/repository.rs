//! Product repository

use bson::{doc, Document};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::options::ReturnDocument;
use mongodb::{Collection, Database};

use super::entity::Product;
use crate::shared::error::{AppError, Result};

const COLLECTION: &str = "products";

#[derive(Clone)]
pub struct ProductRepository {
    collection: Collection<Product>,
}

impl ProductRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(COLLECTION),
        }
    }

    pub async fn insert(&self, product: &Product) -> Result<()> {
        self.collection.insert_one(product).await?;
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Product>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    /// List products matching a filter, with sort and pagination
    pub async fn list(
        &self,
        filter: Document,
        sort: Document,
        skip: u64,
        limit: u32,
    ) -> Result<Vec<Product>> {
        let cursor = self
            .collection
            .find(filter)
            .sort(sort)
            .skip(skip)
            .limit(limit as i64)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn count_matching(&self, filter: Document) -> Result<u64> {
        Ok(self.collection.count_documents(filter).await?)
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }

    /// Apply a partial update, returning the updated record
    pub async fn update(&self, id: &str, changes: Document) -> Result<Product> {
        let mut set = changes;
        set.insert("updatedAt", bson::DateTime::from_chrono(Utc::now()));

        self.collection
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| AppError::not_found("Product"))
    }

    /// Delete a product, returning the deleted record so callers can
    /// clean up its stored image
    pub async fn delete(&self, id: &str) -> Result<Product> {
        self.collection
            .find_one_and_delete(doc! { "_id": id })
            .await?
            .ok_or_else(|| AppError::not_found("Product"))
    }
}

// Repository tests require a MongoDB connection; filter construction is
// covered in query.rs and the handlers in the API tests.
