//! AgriMart Platform
//!
//! Domain models, repositories, services, and HTTP APIs for the
//! AgriMart backend: accounts and authentication, the product catalog,
//! order tracking with sales analytics, plant-disease detection, and
//! the contact inbox.

pub mod auth;
pub mod disease;
pub mod message;
pub mod order;
pub mod product;
pub mod shared;
pub mod user;

// Re-export common types
pub use shared::api_common::{ApiEnvelope, PageMeta, Paginated, PaginationParams, MAX_PAGE_SIZE};
pub use shared::error::{AppError, ErrorEnvelope, Result};
pub use shared::indexes::ensure_indexes;
pub use shared::media_store::{HttpMediaStore, MediaStore};
pub use shared::middleware::{AppState, AuthContext, AuthLayer, Authenticated, OptionalAuth};
pub use shared::tsid::TsidGenerator;

pub use auth::api::AuthState;
pub use auth::auth_service::{AuthConfig, AuthService};
pub use auth::google::{GoogleOAuthConfig, GoogleOAuthService};
pub use auth::password_service::{Argon2Config, PasswordService};

pub use user::api::UserState;
pub use user::entity::{User, UserResponse, UserRole};
pub use user::repository::UserRepository;

pub use product::api::ProductState;
pub use product::entity::{Product, ProductCategory};
pub use product::repository::ProductRepository;

pub use order::api::OrderState;
pub use order::entity::Order;
pub use order::repository::OrderRepository;

pub use disease::analytics::BreakdownPolicy;
pub use disease::api::DiseaseState;
pub use disease::entity::Disease;
pub use disease::predictor::DiseasePredictor;
pub use disease::repository::DiseaseRepository;

pub use message::api::MessageState;
pub use message::entity::Message;
pub use message::repository::MessageRepository;
