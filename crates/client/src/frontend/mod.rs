//! Leptos frontend: auth context, permission-gated sidebar and the login screen.

pub mod app;
pub mod context;
pub mod sidebar;

use wasm_bindgen::prelude::*;

/// WASM entry point, called when the module loads.
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    leptos::mount_to_body(app::App);
}
