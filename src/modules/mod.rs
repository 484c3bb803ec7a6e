//! Modules layer - Infrastructure components
//!
//! Contains storage adapters the features persist through.

pub mod persistence;
