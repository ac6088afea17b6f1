//! Home page: the wall itself.
//!
//! SYSTEM CONTEXT
//! ==============
//! Posts are fetched once on mount and kept in a local signal. Creating a
//! post prepends the server's copy so ordering matches the list endpoint
//! (newest first) without a refetch.

#[cfg(test)]
#[path = "home_test.rs"]
mod home_test;

use leptos::prelude::*;

use crate::components::create_post_form::CreatePostForm;
use crate::components::wall_post::WallPost;
use crate::net::api::WallApi;
use crate::net::types::Post;
use crate::state::auth::AuthState;

pub const LOGIN_REQUIRED_MESSAGE: &str = "You need to be logged in to post.";
pub const EMPTY_POST_MESSAGE: &str = "Type a message to post.";

/// Check that a post can be sent, returning the token and content to send.
///
/// The token is checked first. Content is only checked for blankness and
/// is sent exactly as typed.
pub(crate) fn validate_post_input(token: Option<&str>, content: &str) -> Result<(String, String), &'static str> {
    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return Err(LOGIN_REQUIRED_MESSAGE);
    };
    if content.trim().is_empty() {
        return Err(EMPTY_POST_MESSAGE);
    }
    Ok((token.to_owned(), content.to_owned()))
}

/// Insert a freshly created post at the top of the list.
pub(crate) fn prepend_post(posts: &mut Vec<Post>, post: Post) {
    posts.retain(|p| p.id != post.id);
    posts.insert(0, post);
}

#[component]
pub fn HomePage() -> impl IntoView {
    let auth = expect_context::<RwSignal<AuthState>>();
    let api = StoredValue::new(expect_context::<WallApi>());

    let posts = RwSignal::new(Vec::<Post>::new());
    let loading = RwSignal::new(true);
    let load_error = RwSignal::new(None::<String>);

    let message = RwSignal::new(String::new());
    let posting = RwSignal::new(false);
    let post_error = RwSignal::new(None::<String>);

    #[cfg(feature = "csr")]
    {
        let client = api.get_value();
        leptos::task::spawn_local(async move {
            match client.list_messages().await {
                Ok(list) => posts.set(list),
                Err(e) => {
                    log::warn!("post list fetch failed: {e}");
                    load_error.set(Some(e.to_string()));
                }
            }
            loading.set(false);
        });
    }
    #[cfg(not(feature = "csr"))]
    loading.set(false);

    let on_submit = Callback::new(move |()| {
        if posting.get_untracked() {
            return;
        }
        post_error.set(None);
        let token = auth.with_untracked(|a| a.token.clone());
        let (token, content) = match validate_post_input(token.as_deref(), &message.get_untracked()) {
            Ok(input) => input,
            Err(msg) => {
                post_error.set(Some(msg.to_owned()));
                return;
            }
        };
        posting.set(true);

        #[cfg(feature = "csr")]
        {
            let client = api.get_value();
            leptos::task::spawn_local(async move {
                match client.create_message(&content, &token).await {
                    Ok(post) => {
                        posts.update(|list| prepend_post(list, post));
                        message.set(String::new());
                    }
                    Err(e) => {
                        log::warn!("post create failed: {e}");
                        post_error.set(Some(e.to_string()));
                    }
                }
                posting.set(false);
            });
        }
        #[cfg(not(feature = "csr"))]
        {
            let _ = (token, content, api);
            posting.set(false);
        }
    });

    view! {
        <main class="home">
            <section class="home__composer">
                <Show
                    when=move || auth.get().user.is_some()
                    fallback=|| view! { <p class="home__hint">"Login to post messages."</p> }
                >
                    <CreatePostForm message=message posting=posting post_error=post_error on_submit=on_submit/>
                </Show>
            </section>

            <section class="home__posts">
                <Show when=move || loading.get()>
                    <p class="home__status">"Loading posts..."</p>
                </Show>
                <Show when=move || load_error.get().is_some()>
                    <p class="home__error">{move || load_error.get().unwrap_or_default()}</p>
                </Show>
                <Show when=move || !loading.get() && load_error.get().is_none() && posts.with(Vec::is_empty)>
                    <p class="home__status">"No posts found."</p>
                </Show>
                <For each=move || posts.get() key=|post| post.id let:post>
                    <WallPost post=post/>
                </For>
            </section>
        </main>
    }
}
