//! Networking modules for the wall REST API.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` owns request construction and endpoint helpers, `transport` performs
//! the raw HTTP exchange, `error` flattens failure bodies into one message,
//! and `types` defines the shared wire schema.

pub mod api;
pub mod error;
pub mod transport;
pub mod types;
