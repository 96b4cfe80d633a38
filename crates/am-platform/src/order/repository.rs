//! Order repository

use bson::{doc, Document};
use chrono::{TimeZone, Utc};
use futures::TryStreamExt;
use mongodb::{Collection, Database};

use super::analytics::MonthlySalesRow;
use super::entity::{Order, OrderWithProduct};
use crate::shared::error::Result;

const COLLECTION: &str = "orders";

#[derive(Clone)]
pub struct OrderRepository {
    collection: Collection<Order>,
}

impl OrderRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(COLLECTION),
        }
    }

    pub async fn insert(&self, order: &Order) -> Result<()> {
        self.collection.insert_one(order).await?;
        Ok(())
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(self.collection.count_documents(doc! {}).await?)
    }

    /// List orders newest first, each joined with its product and customer
    pub async fn list_with_products(&self, skip: u64, limit: u32) -> Result<Vec<OrderWithProduct>> {
        let pipeline = vec![
            doc! { "$sort": { "createdAt": -1 } },
            doc! { "$skip": skip as i64 },
            doc! { "$limit": limit as i64 },
            doc! { "$lookup": {
                "from": "products",
                "localField": "productId",
                "foreignField": "_id",
                "as": "product",
            } },
            doc! { "$unwind": {
                "path": "$product",
                "preserveNullAndEmptyArrays": true,
            } },
            doc! { "$lookup": {
                "from": "users",
                "localField": "userId",
                "foreignField": "_id",
                "as": "user",
            } },
            doc! { "$unwind": {
                "path": "$user",
                "preserveNullAndEmptyArrays": true,
            } },
        ];

        let cursor = self.collection.aggregate(pipeline).await?;
        let documents: Vec<Document> = cursor.try_collect().await?;
        documents
            .into_iter()
            .map(|d| Ok(bson::from_document(d)?))
            .collect()
    }

    /// Per-month order counts and revenue for one calendar year
    pub async fn monthly_sales(&self, year: i32) -> Result<Vec<MonthlySalesRow>> {
        let start = Utc
            .with_ymd_and_hms(year, 1, 1, 0, 0, 0)
            .single()
            .map(bson::DateTime::from_chrono);
        let end = Utc
            .with_ymd_and_hms(year + 1, 1, 1, 0, 0, 0)
            .single()
            .map(bson::DateTime::from_chrono);
        let (Some(start), Some(end)) = (start, end) else {
            return Ok(Vec::new());
        };

        // Revenue is the joined product's current price; orders whose
        // product was deleted drop out at $unwind
        let pipeline = vec![
            doc! { "$match": {
                "createdAt": { "$gte": start, "$lt": end },
            } },
            doc! { "$lookup": {
                "from": "products",
                "localField": "productId",
                "foreignField": "_id",
                "as": "product",
            } },
            doc! { "$unwind": "$product" },
            doc! { "$group": {
                "_id": { "$month": "$createdAt" },
                "count": { "$sum": 1 },
                "total": { "$sum": "$product.price" },
            } },
            doc! { "$sort": { "_id": 1 } },
        ];

        let cursor = self.collection.aggregate(pipeline).await?;
        let documents: Vec<Document> = cursor.try_collect().await?;
        documents
            .into_iter()
            .map(|d| Ok(bson::from_document(d)?))
            .collect()
    }
}

// Repository tests require a MongoDB connection; the series shaping on
// top of monthly_sales is covered in analytics.rs.
