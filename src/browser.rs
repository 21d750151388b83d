//! `web-sys` bindings for the chat widget.
//!
//! Compiled only for `wasm32`. The module's start function looks up the
//! page's `chat-form`, `user-input` and `chat-box` elements and binds a
//! [`ChatWidget`] to them, posting questions to `{location.origin}/ask`.

use thiserror::Error;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, Event, HtmlFormElement, HtmlInputElement};

use crate::transport::{AskError, HttpAskClient};
use crate::view::{
    InputField, ListenerError, MessageContainer, SubmitEvent, SubmitHandler, SubmitSource,
};
use crate::widget::ChatWidget;

/// Id of the form element.
pub const FORM_ID: &str = "chat-form";
/// Id of the text input element.
pub const INPUT_ID: &str = "user-input";
/// Id of the message container element.
pub const CONTAINER_ID: &str = "chat-box";

/// Failure to bind the widget to the page.
#[derive(Error, Debug)]
pub enum MountError {
    /// No global `window`.
    #[error("no window available")]
    NoWindow,

    /// The window has no document.
    #[error("no document available")]
    NoDocument,

    /// An element id is missing from the page.
    #[error("element #{0} not found")]
    MissingElement(&'static str),

    /// An element exists but has the wrong type.
    #[error("element #{id} is not a <{expected}>")]
    WrongElement {
        /// Element id.
        id: &'static str,
        /// Expected tag.
        expected: &'static str,
    },

    /// A DOM call threw.
    #[error("DOM error: {0}")]
    Dom(String),

    /// The page origin cannot address the ask endpoint.
    #[error(transparent)]
    Transport(#[from] AskError),
}

impl From<MountError> for JsValue {
    fn from(err: MountError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

fn js_message(value: &JsValue) -> String {
    value
        .as_string()
        .unwrap_or_else(|| format!("{value:?}"))
}

fn dom_error(value: &JsValue) -> MountError {
    MountError::Dom(js_message(value))
}

impl From<ListenerError> for MountError {
    fn from(err: ListenerError) -> Self {
        MountError::Dom(err.to_string())
    }
}

impl SubmitEvent for Event {
    fn prevent_default(&self) {
        Event::prevent_default(self);
    }
}

/// The `chat-form` element.
#[derive(Debug, Clone)]
pub struct DomForm(HtmlFormElement);

impl SubmitSource for DomForm {
    fn add_submit_listener(&self, handler: SubmitHandler) -> Result<(), ListenerError> {
        let callback = Closure::<dyn Fn(Event)>::new(move |event: Event| handler(&event));
        self.0
            .add_event_listener_with_callback("submit", callback.as_ref().unchecked_ref())
            .map_err(|err| ListenerError(js_message(&err)))?;
        // The listener lives as long as the page.
        callback.forget();
        Ok(())
    }
}

/// The `user-input` element.
#[derive(Debug, Clone)]
pub struct DomInput(HtmlInputElement);

impl InputField for DomInput {
    fn value(&self) -> String {
        self.0.value()
    }

    fn set_value(&self, value: &str) {
        self.0.set_value(value);
    }
}

/// The `chat-box` element.
#[derive(Debug, Clone)]
pub struct DomContainer {
    document: Document,
    element: Element,
}

impl MessageContainer for DomContainer {
    fn append_text_node(&self, text: &str, class_name: &str) {
        let node = match self.document.create_element("div") {
            Ok(node) => node,
            Err(err) => {
                tracing::error!(error = ?err, "Failed to create message node");
                return;
            }
        };
        // textContent, never innerHTML.
        node.set_text_content(Some(text));
        node.set_class_name(class_name);
        if let Err(err) = self.element.append_child(&node) {
            tracing::error!(error = ?err, "Failed to append message node");
        }
    }

    fn scroll_to_bottom(&self) {
        self.element.set_scroll_top(self.element.scroll_height());
    }
}

fn element_by_id(document: &Document, id: &'static str) -> Result<Element, MountError> {
    document
        .get_element_by_id(id)
        .ok_or(MountError::MissingElement(id))
}

fn typed_element<E: JsCast>(
    document: &Document,
    id: &'static str,
    expected: &'static str,
) -> Result<E, MountError> {
    element_by_id(document, id)?
        .dyn_into::<E>()
        .map_err(|element| {
            tracing::error!(id, found = %element.tag_name(), "Unexpected element type");
            MountError::WrongElement { id, expected }
        })
}

/// The widget type bound to a browser page.
pub type BrowserWidget = ChatWidget<DomInput, DomContainer, HttpAskClient>;

/// Bind a widget to the current page.
pub fn mount(document: &Document, origin: &str) -> Result<BrowserWidget, MountError> {
    let form = DomForm(typed_element::<HtmlFormElement>(document, FORM_ID, "form")?);
    let input = DomInput(typed_element::<HtmlInputElement>(document, INPUT_ID, "input")?);
    let container = DomContainer {
        document: document.clone(),
        element: element_by_id(document, CONTAINER_ID)?,
    };
    let transport = HttpAskClient::new(origin)?;

    let widget = ChatWidget::initialize(
        &form,
        input,
        container,
        transport,
        |exchange| wasm_bindgen_futures::spawn_local(exchange),
    )?;
    Ok(widget)
}

/// Module entry point, run when the bundle is instantiated.
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();

    let window = web_sys::window().ok_or(MountError::NoWindow)?;
    let document = window.document().ok_or(MountError::NoDocument)?;
    let origin = window.location().origin().map_err(|e| dom_error(&e))?;

    // The submit listener keeps its own handle to the widget.
    let _widget = mount(&document, &origin)?;
    tracing::info!(
        name: "widget.mounted",
        origin = %origin,
        "Chat widget mounted"
    );
    Ok(())
}
