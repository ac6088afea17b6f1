//! Top bar with the app title and session controls.
//!
//! SYSTEM CONTEXT
//! ==============
//! Signed in: greeting plus logout. Signed out: a toggle that opens the
//! auth panel. Closing the panel or switching between login and register
//! clears the session error so stale server messages do not linger.

use leptos::prelude::*;

use crate::app::SessionHandle;
use crate::components::auth_form::{AuthForm, AuthMode};
use crate::state::auth::AuthState;

#[component]
pub fn Header() -> impl IntoView {
    let auth = expect_context::<RwSignal<AuthState>>();
    let session = expect_context::<SessionHandle>();
    let open = RwSignal::new(false);
    let mode = RwSignal::new(AuthMode::Login);

    let close_panel = move || {
        open.set(false);
        session.try_with_value(|s| s.clear_error());
    };

    let toggle_panel = move |_: leptos::ev::MouseEvent| {
        if open.get_untracked() {
            close_panel();
        } else {
            open.set(true);
        }
    };

    let on_switch_mode = Callback::new(move |()| {
        session.try_with_value(|s| s.clear_error());
        mode.update(|m| *m = m.toggled());
    });
    let on_success = Callback::new(move |()| close_panel());

    let on_logout = move |_: leptos::ev::MouseEvent| {
        let Some(manager) = session.try_get_value() else {
            return;
        };
        #[cfg(feature = "csr")]
        leptos::task::spawn_local(async move {
            manager.logout().await;
            close_panel();
        });
        #[cfg(not(feature = "csr"))]
        {
            let _ = manager;
        }
    };

    let username = move || auth.get().user.map(|u| u.username).unwrap_or_default();

    view! {
        <header class="header">
            <div class="header__inner">
                <span class="header__title">"Wall App"</span>
                <Show
                    when=move || auth.get().user.is_some()
                    fallback=move || {
                        view! {
                            <div class="header__auth">
                                <button class="btn" type="button" on:click=toggle_panel>
                                    "Login or create account"
                                </button>
                                <Show when=move || open.get()>
                                    <div class="header__panel">
                                        <div class="header__panel-top">
                                            <h2 class="header__panel-title">{move || mode.get().title()}</h2>
                                            <button class="btn btn--link" type="button" on:click=toggle_panel>
                                                "Close"
                                            </button>
                                        </div>
                                        <AuthForm mode=mode on_success=on_success on_switch_mode=on_switch_mode/>
                                    </div>
                                </Show>
                            </div>
                        }
                    }
                >
                    <div class="header__session">
                        <span class="header__greeting">"Hello, " {username}</span>
                        <button
                            class="btn"
                            type="button"
                            on:click=on_logout
                            disabled=move || auth.get().loading
                        >
                            {move || if auth.get().loading { "Logout..." } else { "Logout" }}
                        </button>
                    </div>
                </Show>
            </div>
        </header>
    }
}
