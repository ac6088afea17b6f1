//! Login / registration form bound to the session manager.
//!
//! SYSTEM CONTEXT
//! ==============
//! The form validates locally (password confirmation), then hands the payload
//! to the session. Server failures are rendered from the session's `error`;
//! local failures never leave the form.

#[cfg(test)]
#[path = "auth_form_test.rs"]
mod auth_form_test;

use leptos::prelude::*;

use crate::app::SessionHandle;
use crate::net::types::{LoginPayload, RegisterPayload};
use crate::state::auth::AuthState;

pub const PASSWORD_MISMATCH_MESSAGE: &str = "Passwords do not match";

/// Which flow the auth panel is showing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthMode {
    #[default]
    Login,
    Register,
}

impl AuthMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Login => Self::Register,
            Self::Register => Self::Login,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Login => "Login",
            Self::Register => "Register",
        }
    }

    pub fn submit_label(self, busy: bool) -> &'static str {
        match (busy, self) {
            (true, _) => "Sending...",
            (false, Self::Login) => "Login",
            (false, Self::Register) => "Register",
        }
    }

    pub fn switch_label(self) -> &'static str {
        match self {
            Self::Login => "Create account",
            Self::Register => "I already have an account",
        }
    }
}

/// Raw field values as typed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthFields {
    pub identifier: String,
    pub password: String,
    pub username: String,
    pub email: String,
    pub password1: String,
    pub password2: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum AuthRequest {
    Login(LoginPayload),
    Register(RegisterPayload),
}

/// Build the payload for `mode`, or the local validation message.
pub(crate) fn build_auth_request(mode: AuthMode, fields: &AuthFields) -> Result<AuthRequest, &'static str> {
    match mode {
        AuthMode::Login => Ok(AuthRequest::Login(LoginPayload::from_identifier(
            &fields.identifier,
            &fields.password,
        ))),
        AuthMode::Register => {
            if fields.password1 != fields.password2 {
                return Err(PASSWORD_MISMATCH_MESSAGE);
            }
            Ok(AuthRequest::Register(RegisterPayload {
                username: fields.username.clone(),
                email: fields.email.clone(),
                password1: fields.password1.clone(),
                password2: fields.password2.clone(),
            }))
        }
    }
}

#[component]
pub fn AuthForm(mode: RwSignal<AuthMode>, on_success: Callback<()>, on_switch_mode: Callback<()>) -> impl IntoView {
    let auth = expect_context::<RwSignal<AuthState>>();
    let session = expect_context::<SessionHandle>();

    let identifier = RwSignal::new(String::new());
    let password = RwSignal::new(String::new());
    let username = RwSignal::new(String::new());
    let email = RwSignal::new(String::new());
    let password1 = RwSignal::new(String::new());
    let password2 = RwSignal::new(String::new());
    let local_error = RwSignal::new(None::<String>);
    let submitting = RwSignal::new(false);

    let busy = move || submitting.get() || auth.get().loading;

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if submitting.get_untracked() {
            return;
        }
        local_error.set(None);
        session.try_with_value(|s| s.clear_error());

        let fields = AuthFields {
            identifier: identifier.get_untracked(),
            password: password.get_untracked(),
            username: username.get_untracked(),
            email: email.get_untracked(),
            password1: password1.get_untracked(),
            password2: password2.get_untracked(),
        };
        let request = match build_auth_request(mode.get_untracked(), &fields) {
            Ok(request) => request,
            Err(message) => {
                local_error.set(Some(message.to_owned()));
                return;
            }
        };
        let Some(manager) = session.try_get_value() else {
            return;
        };
        submitting.set(true);

        #[cfg(feature = "csr")]
        leptos::task::spawn_local(async move {
            let outcome = match request {
                AuthRequest::Login(payload) => manager.login(payload).await,
                AuthRequest::Register(payload) => manager.register(payload).await,
            };
            submitting.set(false);
            // Failures are already in the session error; keep the panel open.
            if outcome.is_ok() {
                for field in [identifier, password, username, email, password1, password2] {
                    field.set(String::new());
                }
                on_success.run(());
            }
        });
        #[cfg(not(feature = "csr"))]
        {
            let _ = (request, manager, on_success);
            submitting.set(false);
        }
    };

    view! {
        <form class="auth-form" on:submit=on_submit>
            <Show when=move || auth.get().error.is_some()>
                <div class="auth-form__error">{move || auth.get().error.unwrap_or_default()}</div>
            </Show>
            <Show when=move || local_error.get().is_some()>
                <div class="auth-form__error">{move || local_error.get().unwrap_or_default()}</div>
            </Show>

            <Show
                when=move || mode.get() == AuthMode::Login
                fallback=move || {
                    view! {
                        <TextField label="Username" name="username" autocomplete="username" value=username/>
                        <TextField label="E-mail" name="email" kind="email" autocomplete="email" value=email/>
                        <TextField
                            label="Password"
                            name="password1"
                            kind="password"
                            autocomplete="new-password"
                            value=password1
                        />
                        <TextField
                            label="Confirm password"
                            name="password2"
                            kind="password"
                            autocomplete="new-password"
                            value=password2
                        />
                    }
                }
            >
                <TextField
                    label="Username or email"
                    name="usernameOrEmail"
                    autocomplete="username"
                    value=identifier
                />
                <TextField
                    label="Password"
                    name="password"
                    kind="password"
                    autocomplete="current-password"
                    value=password
                />
            </Show>

            <div class="auth-form__actions">
                <button class="btn btn--primary" type="submit" disabled=busy>
                    {move || mode.get().submit_label(busy())}
                </button>
                <button class="btn btn--link" type="button" on:click=move |_| on_switch_mode.run(())>
                    {move || mode.get().switch_label()}
                </button>
            </div>
        </form>
    }
}

/// Labelled, required input bound to a string signal.
#[component]
fn TextField(
    label: &'static str,
    name: &'static str,
    #[prop(default = "text")] kind: &'static str,
    autocomplete: &'static str,
    value: RwSignal<String>,
) -> impl IntoView {
    view! {
        <div class="auth-form__field">
            <label class="auth-form__label" for=name>
                {label}
            </label>
            <input
                class="auth-form__input"
                id=name
                name=name
                type=kind
                autocomplete=autocomplete
                required=true
                prop:value=move || value.get()
                on:input=move |ev| value.set(event_target_value(&ev))
            />
        </div>
    }
}
