//! Mobile menu and hero logo. Installed regardless of motion preference.

use std::cell::RefCell;

use gloo::events::EventListener;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlImageElement};

use crate::markup::{
    HERO_ID, HERO_IMAGE_ALT, HERO_IMAGE_CLASS, HERO_IMAGE_SRC, MENU_BUTTON_ID, MENU_HIDDEN_CLASS,
    MENU_ID,
};

thread_local! {
    static LISTENERS: RefCell<Vec<EventListener>> = const { RefCell::new(Vec::new()) };
}

pub fn install(document: &Document) {
    let mut listeners = install_menu(document);
    listeners.extend(install_hero(document));
    LISTENERS.with(|slot| slot.borrow_mut().extend(listeners));
}

fn install_menu(document: &Document) -> Vec<EventListener> {
    let (Some(button), Some(menu)) = (
        document.get_element_by_id(MENU_BUTTON_ID),
        document.get_element_by_id(MENU_ID),
    ) else {
        return Vec::new();
    };

    let mut listeners = Vec::new();
    let toggled = menu.clone();
    listeners.push(EventListener::new(&button, "click", move |_| {
        if let Err(err) = toggled.class_list().toggle(MENU_HIDDEN_CLASS) {
            tracing::warn!(?err, "menu toggle failed");
        }
    }));

    // Following a link closes the menu.
    if let Ok(links) = menu.query_selector_all("a") {
        for link in (0..links.length()).filter_map(|index| links.item(index)) {
            let menu = menu.clone();
            listeners.push(EventListener::new(&link, "click", move |_| hide(&menu)));
        }
    }
    listeners
}

fn hide(menu: &Element) {
    if let Err(err) = menu.class_list().add_1(MENU_HIDDEN_CLASS) {
        tracing::warn!(?err, "menu hide failed");
    }
}

/// Swaps the hero's text fallback for the logo once it has loaded.
fn install_hero(document: &Document) -> Vec<EventListener> {
    let Some(hero) = document.get_element_by_id(HERO_ID) else {
        return Vec::new();
    };
    let Some(image) = document
        .create_element("img")
        .ok()
        .and_then(|element| element.dyn_into::<HtmlImageElement>().ok())
    else {
        return Vec::new();
    };
    image.set_alt(HERO_IMAGE_ALT);
    image.set_class_name(HERO_IMAGE_CLASS);

    let loaded = image.clone();
    let listeners = vec![
        EventListener::once(&image, "load", move |_| {
            hero.set_inner_html("");
            if let Err(err) = hero.append_child(&loaded) {
                tracing::warn!(?err, "hero logo not attached");
            }
        }),
        EventListener::once(&image, "error", |_| {
            tracing::info!("hero logo not found, keeping the text fallback");
        }),
    ];
    image.set_src(HERO_IMAGE_SRC);
    listeners
}
