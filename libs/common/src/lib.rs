//! Common library for the Kindred backend
//!
//! This crate provides shared infrastructure used by the auth and photos
//! services: PostgreSQL connection pooling and shared error types.

pub mod database;
pub mod error;
