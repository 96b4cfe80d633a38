//! MongoDB index bootstrap
//!
//! Idempotent, runs at startup. createIndex is a no-op when the index
//! already exists with the same definition.

use bson::{doc, Document};
use mongodb::options::IndexOptions;
use mongodb::{Database, IndexModel};

use crate::shared::error::Result;

pub async fn ensure_indexes(db: &Database) -> Result<()> {
    // Users: unique email, lookup by googleId for federated sign-in
    let users = db.collection::<Document>("users");
    users
        .create_index(
            IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
        )
        .await?;
    users
        .create_index(
            IndexModel::builder()
                .keys(doc! { "googleId": 1 })
                .options(IndexOptions::builder().sparse(true).build())
                .build(),
        )
        .await?;

    // Catalog listing filters and default newest-first sort
    let products = db.collection::<Document>("products");
    products
        .create_index(IndexModel::builder().keys(doc! { "createdAt": -1 }).build())
        .await?;
    products
        .create_index(IndexModel::builder().keys(doc! { "category": 1 }).build())
        .await?;

    // Monthly sales aggregation groups on order date
    let orders = db.collection::<Document>("orders");
    orders
        .create_index(IndexModel::builder().keys(doc! { "createdAt": -1 }).build())
        .await?;

    let diseases = db.collection::<Document>("diseases");
    diseases
        .create_index(IndexModel::builder().keys(doc! { "createdAt": -1 }).build())
        .await?;
    diseases
        .create_index(IndexModel::builder().keys(doc! { "name": 1 }).build())
        .await?;

    let messages = db.collection::<Document>("messages");
    messages
        .create_index(IndexModel::builder().keys(doc! { "createdAt": -1 }).build())
        .await?;

    tracing::info!("MongoDB indexes ensured");
    Ok(())
}
