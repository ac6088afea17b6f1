//! Reusable UI components.
//!
//! ARCHITECTURE
//! ============
//! Components read shared state from context and keep form drafts local;
//! session mutations go through the `SessionHandle` context.

pub mod auth_form;
pub mod create_post_form;
pub mod header;
pub mod wall_post;
