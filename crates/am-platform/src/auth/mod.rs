pub mod api;
pub mod auth_service;
pub mod google;
pub mod password_service;
