//! Open dates: calendar slots owned by a contributor, optionally public,
//! to which other contributors can be invited.
//!
//! Ownership and invitations are changed through the contributor
//! endpoints; this feature creates dates and toggles their visibility.

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use services::OpenDateService;
