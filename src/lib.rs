//! # wall
//!
//! Leptos + WASM client for the wall application: users sign in, read the
//! shared message wall, and post short messages.
//!
//! The crate is split into the request layer (`net`), the session layer
//! (`state`), browser glue (`util`), and a thin presentation layer
//! (`pages`, `components`). Everything below `net` and `state` is plain Rust
//! and runs natively under `cargo test`; browser I/O sits behind the `csr`
//! feature.

pub mod app;
pub mod components;
pub mod config;
pub mod net;
pub mod pages;
pub mod state;
pub mod util;

/// Browser entry point: install console logging and mount the app.
#[cfg(feature = "csr")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Debug);
    leptos::mount::mount_to_body(app::App);
}
