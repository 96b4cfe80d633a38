pub mod analytics;
pub mod api;
pub mod entity;
pub mod predictor;
pub mod repository;
