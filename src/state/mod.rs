//! Shared client-side state modules.
//!
//! DESIGN
//! ======
//! `auth` is the plain snapshot components render from; `session` owns every
//! write to it and to the persisted token.

pub mod auth;
pub mod session;
