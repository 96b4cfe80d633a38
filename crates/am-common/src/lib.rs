//! Shared infrastructure for AgriMart services.

pub mod logging;
