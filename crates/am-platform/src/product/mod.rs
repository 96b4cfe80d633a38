pub mod api;
pub mod entity;
pub mod query;
pub mod repository;
