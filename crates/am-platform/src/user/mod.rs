pub mod api;
pub mod entity;
pub mod repository;
