//! The DOM surface consumed by the chat widget.
//!
//! The widget never touches a concrete DOM. It is handed three handles
//! implementing the traits below:
//!
//! - a [`SubmitSource`] (the `chat-form` element),
//! - an [`InputField`] (the `user-input` element),
//! - a [`MessageContainer`] (the `chat-box` element).
//!
//! [`crate::headless`] implements them in memory; [`crate::browser`]
//! implements them with `web-sys` when compiled for `wasm32`.
//!
//! All handles are used from a single thread, so methods take `&self` and
//! implementations rely on interior mutability (or on the browser doing it
//! for them).

use thiserror::Error;

use crate::message::MessageRole;

/// A submit event delivered to the widget's listener.
pub trait SubmitEvent {
    /// Suppress the host's default navigation for this event.
    fn prevent_default(&self);
}

/// Listener invoked for every submit event.
pub type SubmitHandler = Box<dyn Fn(&dyn SubmitEvent)>;

/// The host refused to register a submit listener.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to register submit listener: {0}")]
pub struct ListenerError(pub String);

/// Something that emits submit events (a form).
pub trait SubmitSource {
    /// Register `handler` for the lifetime of the source.
    fn add_submit_listener(&self, handler: SubmitHandler) -> Result<(), ListenerError>;
}

/// A text-value-bearing input.
pub trait InputField {
    /// Current text value.
    fn value(&self) -> String;

    /// Replace the text value.
    fn set_value(&self, value: &str);
}

/// A scrollable container of message nodes.
pub trait MessageContainer {
    /// Append a new node as the last child, carrying `text` as plain text
    /// and `class_name` as its class list.
    ///
    /// Implementations must use text-only assignment (`textContent`): the
    /// text is never parsed as markup.
    fn append_text_node(&self, text: &str, class_name: &str);

    /// Set the scroll offset to its maximum so the last child is visible.
    fn scroll_to_bottom(&self);
}

/// Render one message as the newest node of `container` and pin the view to it.
pub fn render_message<C>(container: &C, text: &str, role: MessageRole)
where
    C: MessageContainer + ?Sized,
{
    container.append_text_node(text, &role.class_name());
    container.scroll_to_bottom();
}
