use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{Event, FileReader, HtmlInputElement};

use robotrac_core::catalog::Catalog;

use crate::constants::CATALOG_INPUT;
use crate::state::State;
use crate::utils::{log, report};
use crate::viewer::{populate_datasets, show_dataset};

/// Replace the catalog with the one parsed from `text` and show its first
/// dataset, or the current one if it is still listed.
pub fn load_catalog(state: &mut State, text: &str) {
    match Catalog::from_json(text) {
        Ok(catalog) => {
            let current = state.dataset.as_ref().map(|d| d.id.clone());
            state.catalog = catalog;
            let keep = current.filter(|id| state.catalog.get(id).is_some());
            populate_datasets(&state.document, &state.catalog, keep.as_deref());
            show_dataset(state, keep.as_deref());
            let n = state.catalog.datasets.len();
            report(&state.document, &format!("Loaded {n} datasets"), false);
        }
        Err(e) => report(&state.document, &e.to_string(), true),
    }
}

// Wires up the file input handler for loading a JSON dataset catalog.
pub fn attach_file_input(state: Rc<RefCell<State>>) -> Result<(), JsValue> {
    let doc = state.borrow().document.clone();
    let Some(input) = doc.get_element_by_id(CATALOG_INPUT) else {
        return Ok(());
    };
    let input: HtmlInputElement = input.dyn_into()?;
    let st = state.clone();
    let input_for_closure = input.clone();
    let onchange = Closure::<dyn FnMut(Event)>::wrap(Box::new(move |_e: Event| {
        let Some(file) = input_for_closure.files().and_then(|files| files.item(0)) else {
            log("No file selected");
            return;
        };
        let reader = match FileReader::new() {
            Ok(r) => r,
            Err(e) => {
                log(&format!("No FileReader: {e:?}"));
                return;
            }
        };
        let st2 = st.clone();
        let reader_for_closure = reader.clone();
        let onload = Closure::<dyn FnMut(Event)>::wrap(Box::new(move |_ev: Event| {
            let text = reader_for_closure
                .result()
                .ok()
                .and_then(|r| r.as_string())
                .unwrap_or_default();
            if text.is_empty() {
                log("Selected file is empty or unreadable");
                return;
            }
            load_catalog(&mut st2.borrow_mut(), &text);
        }));
        reader.set_onload(Some(onload.as_ref().unchecked_ref()));
        if let Err(e) = reader.read_as_text(&file) {
            log(&format!("Failed to read file: {:?}", e));
        }
        onload.forget();
    }));
    input.set_onchange(Some(onchange.as_ref().unchecked_ref()));
    onchange.forget();
    Ok(())
}
