use std::cell::RefCell;
use std::rc::Rc;

use web_sys::{Document, Window};

use robotrac_core::catalog::{Catalog, Dataset};
use robotrac_core::merge::MergeOptions;
use robotrac_core::overlay::Rgba;

/// Global application state stored behind an `Rc<RefCell<_>>` so it can be
/// shared across the WASM callbacks.
#[derive(Clone)]
pub struct State {
    pub window: Window,
    pub document: Document,
    pub catalog: Catalog,
    pub dataset: Option<Dataset>,
    pub index: u32,
    pub merge: MergeOptions,
    pub background: Rgba,
    pub top_arrow: bool,
}

impl State {
    pub fn new(window: Window, document: Document) -> Self {
        State {
            window,
            document,
            catalog: Catalog::default(),
            dataset: None,
            index: 1,
            merge: MergeOptions::default(),
            background: Rgba::default(),
            top_arrow: false,
        }
    }
}

/// Thread local storage for the single runtime state instance.
thread_local! {
    pub static STATE: RefCell<Option<Rc<RefCell<State>>>> = const { RefCell::new(None) };
}
