//! Composer for new wall posts.

use leptos::prelude::*;

/// Textarea plus submit button. Validation and the request itself live in
/// the page that owns the post list.
#[component]
pub fn CreatePostForm(
    message: RwSignal<String>,
    posting: RwSignal<bool>,
    post_error: RwSignal<Option<String>>,
    on_submit: Callback<()>,
) -> impl IntoView {
    view! {
        <form
            class="post-form"
            on:submit=move |ev: leptos::ev::SubmitEvent| {
                ev.prevent_default();
                on_submit.run(());
            }
        >
            <label class="post-form__label" for="new-post">
                "New post"
            </label>
            <textarea
                class="post-form__input"
                id="new-post"
                rows="3"
                placeholder="Share something..."
                prop:value=move || message.get()
                on:input=move |ev| message.set(event_target_value(&ev))
            ></textarea>
            <Show when=move || post_error.get().is_some()>
                <div class="post-form__error">{move || post_error.get().unwrap_or_default()}</div>
            </Show>
            <div class="post-form__actions">
                <button class="btn btn--primary" type="submit" disabled=move || posting.get()>
                    {move || if posting.get() { "Posting..." } else { "Post" }}
                </button>
            </div>
        </form>
    }
}
