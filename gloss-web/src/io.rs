//! Browser persistence: JSON downloads and the session in localStorage

use wasm_bindgen::prelude::*;
use web_sys::{Blob, BlobPropertyBag, HtmlAnchorElement, Storage, Url};

use gloss_core::{export, slugify, Chat, SaveRequest};

fn local_storage() -> Result<Storage, JsValue> {
    web_sys::window()
        .ok_or("No window")?
        .local_storage()?
        .ok_or_else(|| JsValue::from_str("No localStorage"))
}

/// Offer a saved chat to the user as `<slug>.json`
pub fn download_save(save: &SaveRequest) -> Result<String, JsValue> {
    let json = export::to_json(save).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let filename = format!("{}.json", slugify(&save.title));

    let parts = js_sys::Array::of1(&JsValue::from_str(&json));
    let options = BlobPropertyBag::new();
    options.set_type("application/json");
    let url = Url::create_object_url_with_blob(&Blob::new_with_str_sequence_and_options(
        &parts, &options,
    )?)?;

    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or("No document")?;
    let link: HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
    link.set_href(&url);
    link.set_download(&filename);
    link.click();
    Url::revoke_object_url(&url)?;

    Ok(filename)
}

/// Store every chat of the session under `key`
pub fn save_session(key: &str, chats: &[Chat]) -> Result<(), JsValue> {
    let json = export::session_to_json(chats).map_err(|e| JsValue::from_str(&e.to_string()))?;
    local_storage()?.set_item(key, &json)
}

/// Chats stored under `key`, or `None` if nothing was stored.
///
/// A stored value that no longer parses is reported, not silently dropped.
pub fn load_session(key: &str, max_highlights: usize) -> Result<Option<Vec<Chat>>, JsValue> {
    let Some(json) = local_storage()?.get_item(key)? else {
        return Ok(None);
    };
    export::load_chats(&json, max_highlights)
        .map(Some)
        .map_err(|e| JsValue::from_str(&format!("Stored session under {key:?} is corrupt: {e}")))
}
