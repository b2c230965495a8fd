//! Shared building blocks for the code playground: the language table,
//! environment configuration, domain records and the persistence layer.

pub mod config;
pub mod error;
pub mod languages;
pub mod library;
pub mod redis;
pub mod store;
pub mod types;
