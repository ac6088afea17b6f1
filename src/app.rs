//! Root application component and context providers.

use leptos::prelude::*;
use leptos_meta::{Title, provide_meta_context};

use crate::components::header::Header;
use crate::config::ApiConfig;
use crate::net::api::WallApi;
use crate::net::transport::BrowserTransport;
use crate::pages::home::HomePage;
use crate::state::session::SessionManager;
use crate::util::token_storage::BrowserTokenStore;

/// Session manager wired to the real API and `sessionStorage`.
pub type AppSession = SessionManager<WallApi, BrowserTokenStore>;

/// Context handle for the session. The manager is `Rc`-based, so it is held
/// in local arena storage rather than provided directly.
pub type SessionHandle = StoredValue<AppSession, LocalStorage>;

/// Root application component.
///
/// Owns the session for the lifetime of the page: restores it on mount and
/// disposes it on cleanup so late responses cannot write into a torn-down tree.
#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    let api = WallApi::new(ApiConfig::from_env(), BrowserTransport);
    let session = AppSession::new(api.clone(), BrowserTokenStore);

    let auth = RwSignal::new(session.state());
    session.subscribe(move |state| auth.set(state.clone()));

    #[cfg(feature = "csr")]
    {
        let restoring = session.clone();
        leptos::task::spawn_local(async move { restoring.restore().await });
    }

    let handle: SessionHandle = StoredValue::new_local(session);
    on_cleanup(move || {
        handle.try_with_value(AppSession::dispose);
    });

    provide_context(auth);
    provide_context(handle);
    provide_context(api);

    view! {
        <Title text="Wall App"/>
        <div class="app">
            <Header/>
            <HomePage/>
        </div>
    }
}

