//! User repository

use bson::doc;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::options::ReturnDocument;
use mongodb::{Collection, Database};

use super::entity::User;
use crate::shared::error::{AppError, Result};
use crate::user::entity::UserRole;

const COLLECTION: &str = "users";

#[derive(Clone)]
pub struct UserRepository {
    collection: Collection<User>,
}

impl UserRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection(COLLECTION),
        }
    }

    pub async fn insert(&self, user: &User) -> Result<()> {
        match self.collection.insert_one(user).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => {
                Err(AppError::duplicate("User", "email", &user.email))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.collection.find_one(doc! { "_id": id }).await?)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.collection.find_one(doc! { "email": email }).await?)
    }

    pub async fn find_by_google_id(&self, google_id: &str) -> Result<Option<User>> {
        Ok(self
            .collection
            .find_one(doc! { "googleId": google_id })
            .await?)
    }

    /// Rotate (or clear, on logout) the stored refresh token jti
    pub async fn set_refresh_token_id(&self, id: &str, jti: Option<&str>) -> Result<()> {
        let update = match jti {
            Some(jti) => doc! { "$set": { "refreshTokenId": jti, "updatedAt": bson::DateTime::from_chrono(Utc::now()) } },
            None => doc! {
                "$unset": { "refreshTokenId": "" },
                "$set": { "updatedAt": bson::DateTime::from_chrono(Utc::now()) },
            },
        };
        let result = self
            .collection
            .update_one(doc! { "_id": id }, update)
            .await?;
        if result.matched_count == 0 {
            return Err(AppError::not_found("User"));
        }
        Ok(())
    }

    /// Attach a Google account to an existing user
    pub async fn link_google_id(&self, id: &str, google_id: &str) -> Result<()> {
        let result = self
            .collection
            .update_one(
                doc! { "_id": id },
                doc! { "$set": {
                    "googleId": google_id,
                    "updatedAt": bson::DateTime::from_chrono(Utc::now()),
                } },
            )
            .await?;
        if result.matched_count == 0 {
            return Err(AppError::not_found("User"));
        }
        Ok(())
    }

    /// Apply a partial profile update, returning the updated record.
    /// An email change that collides with the unique index surfaces as
    /// a duplicate error rather than a raw driver failure.
    pub async fn update_profile(&self, id: &str, changes: bson::Document) -> Result<User> {
        let mut set = changes;
        let email = set.get_str("email").unwrap_or_default().to_string();
        set.insert("updatedAt", bson::DateTime::from_chrono(Utc::now()));

        match self
            .collection
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await
        {
            Ok(Some(user)) => Ok(user),
            Ok(None) => Err(AppError::not_found("User")),
            Err(e) if is_duplicate_key(&e) => Err(AppError::duplicate("User", "email", email)),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn set_role(&self, id: &str, role: UserRole) -> Result<User> {
        let role_bson = bson::to_bson(&role)?;
        self.collection
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": {
                    "role": role_bson,
                    "updatedAt": bson::DateTime::from_chrono(Utc::now()),
                } },
            )
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    /// List users, newest first
    pub async fn list(&self, skip: u64, limit: u32) -> Result<Vec<User>> {
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

fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};
    match e.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(we)) => we.code == 11000,
        _ => false,
    }
}

// Repository tests require a MongoDB connection; behavior is covered by
// the API-level tests and the pure helpers above.
