//! Order entity
//!
//! A pure join record between a user and a product; revenue comes from
//! the joined product's price at aggregation time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::product::entity::Product;
use crate::shared::tsid::TsidGenerator;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub product_id: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn new(user_id: impl Into<String>, product_id: impl Into<String>) -> Self {
        Self {
            id: TsidGenerator::generate(),
            user_id: user_id.into(),
            product_id: product_id.into(),
            created_at: Utc::now(),
        }
    }
}

/// The ordering user as shown on the dashboard; everything else on the
/// user document stays out of the payload
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderCustomer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub email: String,
}

/// An order joined with its product and customer for listings
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderWithProduct {
    #[serde(flatten)]
    pub order: Order,
    /// Absent when the product was deleted after the order was placed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<Product>,
    /// Absent when the ordering user was deleted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<OrderCustomer>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joined_order_keeps_customer_projection_only() {
        let doc = bson::doc! {
            "_id": "order-1",
            "userId": "user-1",
            "productId": "product-1",
            "createdAt": bson::DateTime::from_millis(1_700_000_000_000),
            "user": {
                "firstName": "Asha",
                "email": "asha@example.com",
                "passwordHash": "secret",
                "role": "ADMIN",
            },
        };
        let joined: OrderWithProduct = bson::from_document(doc).unwrap();

        let user = joined.user.unwrap();
        assert_eq!(user.first_name.as_deref(), Some("Asha"));
        assert_eq!(user.email, "asha@example.com");

        let wire = serde_json::to_value(&OrderWithProduct {
            order: joined.order,
            product: None,
            user: Some(user),
        })
        .unwrap();
        assert!(wire["user"].get("passwordHash").is_none());
    }
}
