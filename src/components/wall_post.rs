//! A single post card.

use leptos::prelude::*;

use crate::net::types::Post;
use crate::util::time::format_short_timestamp;

#[component]
pub fn WallPost(post: Post) -> impl IntoView {
    let posted_at = format_short_timestamp(&post.created_at);

    view! {
        <article class="wall-post">
            <div class="wall-post__author">{post.user}":"</div>
            <p class="wall-post__content">{post.content}</p>
            <div class="wall-post__meta">
                <time datetime=post.created_at>{posted_at}</time>
            </div>
        </article>
    }
}
