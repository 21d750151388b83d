//! In-memory DOM implementing the [`crate::view`] traits.
//!
//! Handles are cheap to clone and share their state, the same way two
//! references to one browser element observe the same node. Used by the
//! test suite and by native hosts that drive the widget without a browser.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::html::escape_html;
use crate::message::{Message, MessageRole};
use crate::view::{
    InputField, ListenerError, MessageContainer, SubmitEvent, SubmitHandler, SubmitSource,
};

/// Default height of one rendered message row, in pixels.
const DEFAULT_ROW_HEIGHT: u32 = 24;

/// Default visible height of a container, in pixels.
const DEFAULT_CLIENT_HEIGHT: u32 = 240;

// ─────────────────────────────────────────────────────────────────────────────
// Input
// ─────────────────────────────────────────────────────────────────────────────

/// A text input.
#[derive(Debug, Clone, Default)]
pub struct HeadlessInput {
    value: Rc<RefCell<String>>,
}

impl HeadlessInput {
    /// Create an empty input.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the value, as a user typing into the field would.
    pub fn type_text(&self, text: &str) {
        *self.value.borrow_mut() = text.to_string();
    }
}

impl InputField for HeadlessInput {
    fn value(&self) -> String {
        self.value.borrow().clone()
    }

    fn set_value(&self, value: &str) {
        *self.value.borrow_mut() = value.to_string();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Container
// ─────────────────────────────────────────────────────────────────────────────

/// A rendered `<div>` inside the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageNode {
    /// The node's class list.
    pub class_name: String,
    /// The node's text content.
    pub text_content: String,
}

impl MessageNode {
    /// Role encoded in the class list, if any.
    #[must_use]
    pub fn role(&self) -> Option<MessageRole> {
        MessageRole::from_class_name(&self.class_name)
    }

    /// Whether the class list contains `class`.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.class_name.split_whitespace().any(|c| c == class)
    }

    /// Serialize the node as HTML. Text content is always escaped.
    #[must_use]
    pub fn to_html(&self) -> String {
        format!(
            r#"<div class="{}">{}</div>"#,
            escape_html(&self.class_name),
            escape_html(&self.text_content)
        )
    }
}

#[derive(Debug)]
struct ContainerState {
    nodes: RefCell<Vec<MessageNode>>,
    scroll_top: Cell<u32>,
    row_height: u32,
    client_height: u32,
}

/// A scrollable message container.
///
/// Every node is assumed to occupy one row of `row_height` pixels, which is
/// enough to model "scrolled to the bottom".
#[derive(Debug, Clone)]
pub struct HeadlessContainer {
    state: Rc<ContainerState>,
}

impl Default for HeadlessContainer {
    fn default() -> Self {
        Self::with_geometry(DEFAULT_ROW_HEIGHT, DEFAULT_CLIENT_HEIGHT)
    }
}

impl HeadlessContainer {
    /// Create an empty container with default geometry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty container with explicit row and viewport heights.
    #[must_use]
    pub fn with_geometry(row_height: u32, client_height: u32) -> Self {
        Self {
            state: Rc::new(ContainerState {
                nodes: RefCell::new(Vec::new()),
                scroll_top: Cell::new(0),
                row_height,
                client_height,
            }),
        }
    }

    /// Snapshot of the child nodes, oldest first.
    #[must_use]
    pub fn nodes(&self) -> Vec<MessageNode> {
        self.state.nodes.borrow().clone()
    }

    /// Child nodes that carry a message role, as messages.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.state
            .nodes
            .borrow()
            .iter()
            .filter_map(|node| {
                node.role().map(|role| Message {
                    role,
                    text: node.text_content.clone(),
                })
            })
            .collect()
    }

    /// The newest node.
    #[must_use]
    pub fn last_child(&self) -> Option<MessageNode> {
        self.state.nodes.borrow().last().cloned()
    }

    /// Number of child nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.nodes.borrow().len()
    }

    /// Whether the container has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.nodes.borrow().is_empty()
    }

    /// Total content height in pixels.
    #[must_use]
    pub fn scroll_height(&self) -> u32 {
        let rows = u32::try_from(self.len()).unwrap_or(u32::MAX);
        rows.saturating_mul(self.state.row_height)
    }

    /// Current scroll offset in pixels.
    #[must_use]
    pub fn scroll_top(&self) -> u32 {
        self.state.scroll_top.get()
    }

    /// Largest offset the container can scroll to.
    #[must_use]
    pub fn max_scroll_top(&self) -> u32 {
        self.scroll_height().saturating_sub(self.state.client_height)
    }

    /// Whether the newest node is in view.
    #[must_use]
    pub fn is_pinned_to_bottom(&self) -> bool {
        self.scroll_top() == self.max_scroll_top()
    }

    /// Serialize the children as HTML.
    #[must_use]
    pub fn inner_html(&self) -> String {
        self.state
            .nodes
            .borrow()
            .iter()
            .map(MessageNode::to_html)
            .collect()
    }
}

impl MessageContainer for HeadlessContainer {
    fn append_text_node(&self, text: &str, class_name: &str) {
        self.state.nodes.borrow_mut().push(MessageNode {
            class_name: class_name.to_string(),
            text_content: text.to_string(),
        });
    }

    fn scroll_to_bottom(&self) {
        // Browsers clamp `scrollTop = scrollHeight` to the maximum offset.
        self.state.scroll_top.set(self.max_scroll_top());
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Form
// ─────────────────────────────────────────────────────────────────────────────

/// A submit event whose default action can be prevented.
#[derive(Debug, Default)]
pub struct HeadlessSubmitEvent {
    default_prevented: Cell<bool>,
}

impl HeadlessSubmitEvent {
    /// Create a fresh, cancelable event.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a listener called `prevent_default`.
    #[must_use]
    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

impl SubmitEvent for HeadlessSubmitEvent {
    fn prevent_default(&self) {
        self.default_prevented.set(true);
    }
}

/// A form dispatching submit events to its listeners.
#[derive(Clone, Default)]
pub struct HeadlessForm {
    listeners: Rc<RefCell<Vec<Rc<SubmitHandler>>>>,
    navigations: Rc<Cell<usize>>,
}

impl fmt::Debug for HeadlessForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessForm")
            .field("listeners", &self.listener_count())
            .field("navigations", &self.navigations.get())
            .finish()
    }
}

impl HeadlessForm {
    /// Create a form with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatch a submit event to every listener.
    ///
    /// Returns the event so callers can inspect it. If no listener prevented
    /// the default action, the form records a navigation.
    pub fn submit(&self) -> HeadlessSubmitEvent {
        let event = HeadlessSubmitEvent::new();
        // Listeners may register further listeners; dispatch over a snapshot.
        let listeners: Vec<Rc<SubmitHandler>> = self.listeners.borrow().clone();
        for listener in listeners {
            listener(&event);
        }
        if !event.default_prevented() {
            self.navigations.set(self.navigations.get() + 1);
        }
        event
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Number of submissions that would have navigated away from the page.
    #[must_use]
    pub fn navigations(&self) -> usize {
        self.navigations.get()
    }
}

impl SubmitSource for HeadlessForm {
    fn add_submit_listener(&self, handler: SubmitHandler) -> Result<(), ListenerError> {
        self.listeners.borrow_mut().push(Rc::new(handler));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::render_message;

    #[test]
    fn test_render_appends_in_order() {
        let container = HeadlessContainer::new();
        render_message(&container, "Hello", MessageRole::User);
        render_message(&container, "Hi there", MessageRole::Bot);

        assert_eq!(
            container.messages(),
            vec![Message::user("Hello"), Message::bot("Hi there")]
        );
        assert_eq!(
            container.last_child().unwrap().class_name,
            "message bot-message"
        );
    }

    #[test]
    fn test_markup_stays_text() {
        let container = HeadlessContainer::new();
        render_message(&container, "<b>x</b>", MessageRole::Bot);

        let node = container.last_child().unwrap();
        assert_eq!(node.text_content, "<b>x</b>");
        assert_eq!(
            container.inner_html(),
            r#"<div class="message bot-message">&lt;b&gt;x&lt;/b&gt;</div>"#
        );
        assert!(!container.inner_html().contains("<b>"));
    }

    #[test]
    fn test_scroll_pins_to_newest() {
        let container = HeadlessContainer::with_geometry(20, 50);
        for i in 0..10 {
            render_message(&container, &format!("m{i}"), MessageRole::User);
            assert!(container.is_pinned_to_bottom());
        }
        assert_eq!(container.scroll_height(), 200);
        assert_eq!(container.scroll_top(), 150);
    }

    #[test]
    fn test_short_transcript_does_not_scroll() {
        let container = HeadlessContainer::with_geometry(20, 100);
        render_message(&container, "one", MessageRole::User);
        assert_eq!(container.scroll_top(), 0);
        assert!(container.is_pinned_to_bottom());
    }

    #[test]
    fn test_form_navigates_without_prevent_default() {
        let form = HeadlessForm::new();
        let event = form.submit();
        assert!(!event.default_prevented());
        assert_eq!(form.navigations(), 1);

        form.add_submit_listener(Box::new(|event: &dyn SubmitEvent| event.prevent_default()))
            .unwrap();
        let event = form.submit();
        assert!(event.default_prevented());
        assert_eq!(form.navigations(), 1);
    }

    #[test]
    fn test_input_handles_share_state() {
        let input = HeadlessInput::new();
        let alias = input.clone();
        input.type_text("draft");
        assert_eq!(alias.value(), "draft");
        alias.set_value("");
        assert_eq!(input.value(), "");
    }
}
