pub mod api_common;
pub mod error;
pub mod indexes;
pub mod media_store;
pub mod middleware;
pub mod tsid;
