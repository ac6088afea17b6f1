//! Browser-adjacent helpers: token persistence and timestamp display.
//!
//! Both have native fallbacks so the session and page logic can be tested
//! off-browser.

pub mod time;
pub mod token_storage;
