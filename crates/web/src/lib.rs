//! Browser binding for Scrollreel.
//!
//! On `wasm32` the start function reads the page config, installs the menu
//! and hero chrome, then wires DOM scroll, resize and intersection events into
//! a [`scrollreel_core::PageContext`]. The snow backdrop runs on its own
//! animation loop. Other targets only get the host-agnostic [`markup`]
//! helpers.

pub mod markup;

#[cfg(target_arch = "wasm32")]
mod chrome;
#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod logging;
#[cfg(target_arch = "wasm32")]
mod page;
#[cfg(target_arch = "wasm32")]
mod snow;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    logging::init();

    let Some(document) = web_sys::window().and_then(|window| window.document()) else {
        tracing::error!("no document; scroll effects not installed");
        return;
    };

    let config = markup::config_from_script(
        document
            .get_element_by_id(markup::CONFIG_SCRIPT_ID)
            .and_then(|script| script.text_content())
            .as_deref(),
    );

    chrome::install(&document);

    if let Err(err) = page::mount(&document, config.clone()) {
        tracing::error!(error = %err, "scroll effects not installed");
    }
    if let Err(err) = snow::mount(&document, config.snow) {
        tracing::warn!(error = %err, "snow backdrop not started");
    }
}
