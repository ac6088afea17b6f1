//! Persistence for the auth token.
//!
//! SYSTEM CONTEXT
//! ==============
//! The token lives in the tab's `sessionStorage`, so it survives reloads but
//! not the end of the tab session, and is never shared between tabs. Only the
//! session manager writes through these helpers.

#[cfg(test)]
#[path = "token_storage_test.rs"]
mod token_storage_test;

use std::cell::RefCell;
use std::rc::Rc;

/// Storage key holding the token.
pub const TOKEN_STORAGE_KEY: &str = "authToken";

/// Where the session manager keeps its token between page loads.
pub trait TokenStore {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str);
    fn clear(&self);
}

/// `window.sessionStorage`-backed store. A no-op outside the browser.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserTokenStore;

#[cfg(feature = "csr")]
fn session_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.session_storage().ok().flatten())
}

impl TokenStore for BrowserTokenStore {
    fn load(&self) -> Option<String> {
        #[cfg(feature = "csr")]
        {
            session_storage()?
                .get_item(TOKEN_STORAGE_KEY)
                .ok()
                .flatten()
                .filter(|token| !token.is_empty())
        }
        #[cfg(not(feature = "csr"))]
        {
            None
        }
    }

    fn save(&self, token: &str) {
        #[cfg(feature = "csr")]
        {
            if let Some(storage) = session_storage() {
                let _ = storage.set_item(TOKEN_STORAGE_KEY, token);
            }
        }
        #[cfg(not(feature = "csr"))]
        {
            let _ = token;
        }
    }

    fn clear(&self) {
        #[cfg(feature = "csr")]
        {
            if let Some(storage) = session_storage() {
                let _ = storage.remove_item(TOKEN_STORAGE_KEY);
            }
        }
    }
}

/// In-memory store. Clones share the same slot.
#[derive(Clone, Debug, Default)]
pub struct MemoryTokenStore {
    slot: Rc<RefCell<Option<String>>>,
}

impl MemoryTokenStore {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self { slot: Rc::new(RefCell::new(Some(token.into()))) }
    }

    /// Current stored value, without going through the trait.
    pub fn peek(&self) -> Option<String> {
        self.slot.borrow().clone()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.peek()
    }

    fn save(&self, token: &str) {
        *self.slot.borrow_mut() = Some(token.to_owned());
    }

    fn clear(&self) {
        self.slot.borrow_mut().take();
    }
}
